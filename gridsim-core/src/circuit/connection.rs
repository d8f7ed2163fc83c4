//! Connections
//!
//! A connection sits on a single boundary or cross cell and mediates between
//! a wire group and a component. It has at most one driver (`input`) and at
//! most one sink (`output`); it is *full* once both are attached.
//!
//! Kinds are named from the attached component's point of view:
//!
//! | kind       | wire side            | other side                 |
//! |------------|----------------------|----------------------------|
//! | `Out`      | wire is the sink     | component is the driver    |
//! | `In`       | wire is the driver   | component is the sink      |
//! | `ClockIn`  | wire is the driver   | component's clock slot     |
//! | `Cross`    | no-op                | no-op                      |
//!
//! A connection without a driver is never written and reads `false`.

use super::ids::{ComponentId, StateSlot};
use super::state::StateTable;
use crate::grid::{BlockCode, Pos};

/// The role of a connection cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    In,
    Out,
    ClockIn,
    Cross,
}

impl ConnectionKind {
    /// Map a boundary block code to its connection kind.
    pub fn from_code(code: BlockCode) -> Option<Self> {
        match code {
            BlockCode::IN => Some(Self::In),
            BlockCode::OUT => Some(Self::Out),
            BlockCode::CLOCK_IN => Some(Self::ClockIn),
            BlockCode::CROSS => Some(Self::Cross),
            _ => None,
        }
    }
}

/// A typed edge between a wire group and a component.
#[derive(Debug, Clone)]
pub struct Connection {
    pos: Pos,
    kind: ConnectionKind,
    slot: StateSlot,
    changed: bool,
    input: Option<ComponentId>,
    output: Option<ComponentId>,
}

impl Connection {
    pub(crate) fn new(pos: Pos, kind: ConnectionKind, slot: StateSlot) -> Self {
        Self {
            pos,
            kind,
            slot,
            changed: false,
            input: None,
            output: None,
        }
    }

    /// Get the connection's cell.
    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// Get the connection kind.
    pub fn kind(&self) -> ConnectionKind {
        self.kind
    }

    /// The component driving this connection.
    pub fn input(&self) -> Option<ComponentId> {
        self.input
    }

    /// The component reading this connection.
    pub fn output(&self) -> Option<ComponentId> {
        self.output
    }

    /// Check whether both sides are attached.
    pub fn is_full(&self) -> bool {
        self.input.is_some() && self.output.is_some()
    }

    /// Read the current level.
    pub fn is_active(&self, states: &StateTable) -> bool {
        states.get(self.slot)
    }

    /// Write a new level. Only a real transition raises the changed flag.
    pub fn set_active(&mut self, states: &mut StateTable, value: bool) {
        if states.get(self.slot) != value {
            states.set(self.slot, value);
            self.changed = true;
        }
    }

    /// Report whether the level changed since the last call, and reset.
    pub fn is_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    pub(crate) fn set_input(&mut self, component: ComponentId) {
        self.input = Some(component);
    }

    pub(crate) fn set_output(&mut self, component: ComponentId) {
        self.output = Some(component);
    }
}
