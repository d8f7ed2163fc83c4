//! Compiled Circuits
//!
//! A [`Circuit`] is the runnable graph compiled from one grid generation:
//! an arena of [`Component`]s, an arena of [`Connection`]s, the ordered list
//! of toggleable buttons and the state table they all write to.
//!
//! # Tick ordering
//!
//! [`Circuit::update`] runs every non-wire component first, then every wire,
//! each group in component-table order. A gate therefore produces this
//! tick's output before the wires fan it out, and a signal crosses exactly
//! one gate-then-wire hop per tick. Deeper logic settles over several ticks.
//! Simulation is deliberately not combinationally instantaneous.
//!
//! # Lifecycle
//!
//! Circuits are never patched. Every structural edit compiles a new one and
//! the old one is dropped together with all of its components and
//! connections once its simulation task has stopped.

mod component;
mod connection;
mod ids;
mod nested;
mod state;

pub use component::{ClockPhase, Component, ComponentKind, EdgeDetector, ScriptedUnit};
pub use connection::{Connection, ConnectionKind};
pub use ids::{ComponentId, ConnectionId, StateSlot};
pub use nested::NestedCircuit;
pub use state::{LiveStates, StateTable};

use tracing::debug;

use crate::error::SimResult;
use crate::grid::{BlockCode, Pos};

/// The compiled, runnable graph of one grid generation.
#[derive(Debug, Default)]
pub struct Circuit {
    name: String,
    components: Vec<Component>,
    connections: Vec<Connection>,
    buttons: Vec<ComponentId>,
    states: StateTable,
    ticks: u64,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Get the circuit's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get all components in table order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Get a component by id.
    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id.index()]
    }

    /// Get the number of components.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Get all connections in discovery order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Get a connection by id.
    pub fn connection(&self, id: ConnectionId) -> &Connection {
        &self.connections[id.index()]
    }

    /// Get the number of connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Buttons in toggle-index order.
    pub fn buttons(&self) -> &[ComponentId] {
        &self.buttons
    }

    /// Get the state table.
    pub fn states(&self) -> &StateTable {
        &self.states
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// State of the cell at `pos`, if the circuit occupies it.
    pub fn state_at(&self, pos: Pos) -> Option<bool> {
        self.states.at(pos)
    }

    /// The connection sitting on `pos`.
    pub fn connection_at(&self, pos: Pos) -> Option<ConnectionId> {
        self.connections
            .iter()
            .position(|c| c.pos() == pos)
            .map(ConnectionId::new)
    }

    /// The component occupying `pos`.
    pub fn component_at(&self, pos: Pos) -> Option<ComponentId> {
        self.components
            .iter()
            .position(|c| c.cells().contains(&pos))
            .map(ComponentId::new)
    }

    /// Read a connection's level.
    pub fn connection_active(&self, id: ConnectionId) -> bool {
        self.connections[id.index()].is_active(&self.states)
    }

    /// Value of every display, keyed by its first cell.
    pub fn display_values(&self) -> Vec<(Pos, u64)> {
        self.components
            .iter()
            .filter_map(|c| c.display_value().map(|v| (c.first_pos(), v)))
            .collect()
    }

    /// Force a connection's level from outside, as a driver would.
    pub fn drive(&mut self, id: ConnectionId, level: bool) {
        let Circuit {
            connections, states, ..
        } = self;
        connections[id.index()].set_active(states, level);
    }

    /// Run one tick: every non-wire component, then every wire.
    pub fn update(&mut self) -> SimResult<()> {
        let Circuit {
            components,
            connections,
            states,
            ..
        } = self;

        for component in components.iter_mut().filter(|c| !c.is_wire()) {
            component.update(connections, states)?;
        }
        for component in components.iter_mut().filter(|c| c.is_wire()) {
            component.update(connections, states)?;
        }

        self.ticks += 1;
        Ok(())
    }

    /// Toggle the button at `index` of the button list.
    /// Returns false when there is no such button.
    pub fn toggle_button(&mut self, index: usize) -> bool {
        let Some(&id) = self.buttons.get(index) else {
            return false;
        };
        self.components[id.index()].toggle(&mut self.states)
    }

    /// Apply a batch of discrete toggle events, independent of the tick.
    pub fn handle_toggle_input(&mut self, events: impl IntoIterator<Item = usize>) {
        for index in events {
            if !self.toggle_button(index) {
                debug!(index, "toggle event without a matching button");
            }
        }
    }

    /// Copy the current states into the renderer's view.
    pub fn publish(&self, live: &LiveStates) {
        live.publish(&self.states);
    }

    /// Wrap this circuit as a single component.
    pub fn into_nested(self) -> NestedCircuit {
        NestedCircuit::new(self)
    }

    // ---------------------------------------------------------------------
    // Assembly, used by the graph builder
    // ---------------------------------------------------------------------

    pub(crate) fn add_component(&mut self, code: BlockCode, kind: ComponentKind, pos: Pos) -> ComponentId {
        let id = ComponentId::new(self.components.len());
        let slot = self.states.allocate(pos);
        let component = Component::new(code, kind, pos, slot);
        if component.is_button() {
            self.buttons.push(id);
        }
        self.components.push(component);
        id
    }

    pub(crate) fn extend_component(&mut self, id: ComponentId, pos: Pos) {
        let component = &mut self.components[id.index()];
        component.push_cell(pos);
        self.states.alias(pos, component.slot());
    }

    pub(crate) fn add_connection(&mut self, kind: ConnectionKind, pos: Pos) -> ConnectionId {
        let id = ConnectionId::new(self.connections.len());
        let slot = self.states.allocate(pos);
        self.connections.push(Connection::new(pos, kind, slot));
        id
    }

    /// Attach a wire group on the connection's wire side.
    pub(crate) fn add_wire(&mut self, conn: ConnectionId, wire: ComponentId) {
        let connection = &mut self.connections[conn.index()];
        let component = &mut self.components[wire.index()];
        match connection.kind() {
            ConnectionKind::Out => {
                connection.set_output(wire);
                component.add_input(conn);
            }
            ConnectionKind::In | ConnectionKind::ClockIn => {
                connection.set_input(wire);
                component.add_output(conn);
            }
            ConnectionKind::Cross => {}
        }
    }

    /// Attach a non-wire component on the connection's other side.
    pub(crate) fn add_other(&mut self, conn: ConnectionId, other: ComponentId) {
        let connection = &mut self.connections[conn.index()];
        let component = &mut self.components[other.index()];
        match connection.kind() {
            ConnectionKind::Out => {
                connection.set_input(other);
                component.add_output(conn);
            }
            ConnectionKind::In => {
                connection.set_output(other);
                component.add_input(conn);
            }
            ConnectionKind::ClockIn => {
                // a second clock-in keeps no sink
                if component.add_clock(conn) {
                    connection.set_output(other);
                }
            }
            ConnectionKind::Cross => {}
        }
    }
}
