//! Arena Identifiers
//!
//! Components and connections point at each other. Instead of shared
//! pointers, both live in per-circuit arenas and refer to each other by
//! index. Ids are only meaningful within the circuit that issued them.

/// Index of a component in its circuit's component table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(usize);

impl ComponentId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the raw index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Index of a connection in its circuit's connection list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(usize);

impl ConnectionId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position in the owning arena.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Slot in a circuit's state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateSlot(usize);

impl StateSlot {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position in the owning arena.
    pub fn index(&self) -> usize {
        self.0
    }
}
