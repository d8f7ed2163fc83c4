//! Nested Circuits
//!
//! A compiled [`Circuit`] can run as a single component of another circuit.
//! Its external pins are the inner connections that are not full:
//!
//! - no driver: an external input, or the external clock for a clock-in
//! - no sink: an external output
//!
//! Cross connections and connections attached to nothing are skipped. Pins
//! are ordered by the inner circuit's discovery order and matched to the
//! outer component's pins index-wise; extra pins on either side are left
//! alone.

use super::connection::{Connection, ConnectionKind};
use super::ids::ConnectionId;
use super::state::StateTable;
use super::Circuit;
use crate::error::SimResult;

/// A circuit wrapped as a component, with its pin map computed once.
#[derive(Debug)]
pub struct NestedCircuit {
    circuit: Circuit,
    inputs: Vec<ConnectionId>,
    outputs: Vec<ConnectionId>,
    clock: Option<ConnectionId>,
}

impl NestedCircuit {
    /// Wrap a circuit and compute its pin map.
    pub fn new(circuit: Circuit) -> Self {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        let mut clock = None;

        for (i, conn) in circuit.connections().iter().enumerate() {
            let id = ConnectionId::new(i);
            if conn.kind() == ConnectionKind::Cross || conn.is_full() {
                continue;
            }
            match (conn.input(), conn.output()) {
                (None, Some(_)) if conn.kind() == ConnectionKind::ClockIn => {
                    clock.get_or_insert(id);
                }
                (None, Some(_)) => inputs.push(id),
                (Some(_), None) => outputs.push(id),
                _ => {}
            }
        }

        Self {
            circuit,
            inputs,
            outputs,
            clock,
        }
    }

    /// Get the inner circuit.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Inner external input pins, in discovery order.
    pub fn input_pins(&self) -> &[ConnectionId] {
        &self.inputs
    }

    /// Inner external output pins, in discovery order.
    pub fn output_pins(&self) -> &[ConnectionId] {
        &self.outputs
    }

    /// Inner external clock pin, if any.
    pub fn clock_pin(&self) -> Option<ConnectionId> {
        self.clock
    }

    /// Copy outer inputs in, tick the inner circuit once, copy outputs out.
    /// Returns whether any outer output is active.
    pub(crate) fn update(
        &mut self,
        outer_inputs: &[ConnectionId],
        outer_outputs: &[ConnectionId],
        outer_clock: Option<ConnectionId>,
        conns: &mut [Connection],
        states: &mut StateTable,
    ) -> SimResult<bool> {
        for (outer, &inner) in outer_inputs.iter().zip(&self.inputs) {
            let level = conns[outer.index()].is_active(states);
            self.circuit.drive(inner, level);
        }
        if let (Some(outer), Some(inner)) = (outer_clock, self.clock) {
            let level = conns[outer.index()].is_active(states);
            self.circuit.drive(inner, level);
        }

        self.circuit.update()?;

        let mut any = false;
        for (outer, &inner) in outer_outputs.iter().zip(&self.outputs) {
            let level = self.circuit.connection_active(inner);
            conns[outer.index()].set_active(states, level);
            any |= level;
        }
        Ok(any)
    }
}
