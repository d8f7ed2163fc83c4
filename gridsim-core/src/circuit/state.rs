//! Shared State
//!
//! Every component and connection keeps its boolean level in one table
//! indexed by grid position. A multi-cell component maps all of its cells to
//! the slot of its first cell, so every cell reads the same logical state.
//!
//! The table belongs to one circuit generation and is touched by exactly one
//! task, so it needs no locking. The foreground renderer reads
//! [`LiveStates`] instead, a concurrent copy the simulation task refreshes
//! after every tick.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use super::ids::StateSlot;
use crate::grid::Pos;

/// Boolean levels of one circuit, addressed by slot or by position.
#[derive(Debug, Default, Clone)]
pub struct StateTable {
    values: Vec<bool>,
    index: HashMap<Pos, StateSlot>,
}

impl StateTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh slot addressed by `pos`.
    pub fn allocate(&mut self, pos: Pos) -> StateSlot {
        let slot = StateSlot::new(self.values.len());
        self.values.push(false);
        self.index.insert(pos, slot);
        slot
    }

    /// Make `pos` read the state of an existing slot.
    pub fn alias(&mut self, pos: Pos, slot: StateSlot) {
        self.index.insert(pos, slot);
    }

    /// Read a slot. Unknown slots read as `false`.
    pub fn get(&self, slot: StateSlot) -> bool {
        self.values.get(slot.index()).copied().unwrap_or(false)
    }

    /// Write a slot. Unknown slots are ignored.
    pub fn set(&mut self, slot: StateSlot, value: bool) {
        if let Some(v) = self.values.get_mut(slot.index()) {
            *v = value;
        }
    }

    /// State of the cell at `pos`, if anything occupies it.
    pub fn at(&self, pos: Pos) -> Option<bool> {
        self.index.get(&pos).map(|&slot| self.get(slot))
    }

    /// Every addressed position with its state.
    pub fn iter(&self) -> impl Iterator<Item = (Pos, bool)> + '_ {
        self.index.iter().map(|(&pos, &slot)| (pos, self.get(slot)))
    }

    /// Number of addressed positions.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Concurrent view of the running circuit's cell states.
///
/// Cloning shares the underlying map.
#[derive(Debug, Default, Clone)]
pub struct LiveStates {
    inner: Arc<DashMap<Pos, bool>>,
}

impl LiveStates {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last published state of a cell; `false` for unknown cells.
    pub fn get(&self, pos: Pos) -> bool {
        self.inner.get(&pos).map(|v| *v).unwrap_or(false)
    }

    /// Check whether a state was published for `pos`.
    pub fn contains(&self, pos: Pos) -> bool {
        self.inner.contains_key(&pos)
    }

    /// Write every state of `table` into the view.
    pub fn publish(&self, table: &StateTable) {
        for (pos, value) in table.iter() {
            self.inner.insert(pos, value);
        }
    }

    /// Forget every published state.
    pub fn clear(&self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
