//! Components
//!
//! A component is one logical node of the circuit: a connected group of
//! same-typed cells, its input and output connections, and an optional
//! clock connection. What it does on [`Component::update`] depends on its
//! [`ComponentKind`].
//!
//! # Update semantics
//!
//! - wire, or: OR of all inputs (no inputs ⇒ false)
//! - and: AND of all inputs (no inputs ⇒ false)
//! - not: NOT of the first input (no inputs ⇒ true)
//! - xor: first XOR second, missing inputs read false
//! - battery: always true
//! - clock: wall-clock phase, independent of the tick rate
//! - button: re-asserts its toggled state
//! - flip-flop: latches the data input on a rising clock edge, re-asserts
//!   its output every tick
//! - display: sink, sums `2^i` over active inputs
//! - scripted: see [`ScriptedUnit`]
//! - nested: see [`NestedCircuit`]

use std::time::{Duration, Instant};

use smallvec::SmallVec;

use super::connection::Connection;
use super::ids::{ConnectionId, StateSlot};
use super::nested::NestedCircuit;
use super::state::StateTable;
use crate::error::{SimError, SimResult};
use crate::grid::{BlockCode, Pos};
use crate::script::{bits, CompiledScript, ScriptMemory, Trigger};

pub(crate) type Pins = SmallVec<[ConnectionId; 4]>;

/// Wall-clock phase of a clock component.
#[derive(Debug, Clone)]
pub struct ClockPhase {
    period: Duration,
    last_flip: Option<Instant>,
    phase: bool,
}

impl ClockPhase {
    /// Create a clock phase that starts low.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_flip: None,
            phase: false,
        }
    }

    /// Advance the phase to `now`. The first poll starts the timer.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.last_flip {
            None => self.last_flip = Some(now),
            Some(at) if now.saturating_duration_since(at) >= self.period => {
                self.phase = !self.phase;
                self.last_flip = Some(now);
            }
            Some(_) => {}
        }
        self.phase
    }
}

/// Rising-edge detector shared by flip-flops and clocked scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector {
    last: bool,
}

impl EdgeDetector {
    /// Feed the current level; true on a low → high transition.
    pub fn rising(&mut self, level: bool) -> bool {
        let edge = level && !self.last;
        self.last = level;
        edge
    }
}

/// Runtime state of a scripted component.
///
/// Instant scripts run when any input changed since the last tick. Clocked scripts run on rising clock edges only.
/// Missing trailing outputs default to `false`.
#[derive(Debug, Clone)]
pub struct ScriptedUnit {
    compiled: CompiledScript,
    memory: ScriptMemory,
    counter: u64,
    clock: EdgeDetector,
}

impl ScriptedUnit {
    /// Wrap a compiled script with fresh memory.
    pub fn new(compiled: CompiledScript) -> Self {
        Self {
            compiled,
            memory: ScriptMemory::new(),
            counter: 0,
            clock: EdgeDetector::default(),
        }
    }

    /// Get the script's trigger.
    pub fn trigger(&self) -> Trigger {
        self.compiled.trigger
    }

    /// Get the script's persistent memory.
    pub fn memory(&self) -> &ScriptMemory {
        &self.memory
    }

    /// Number of completed invocations.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    fn invoke(&mut self, inputs: &[bool]) -> Result<Vec<bool>, crate::error::ScriptError> {
        let outputs = self.compiled.script.run(inputs, self.counter, &mut self.memory)?;
        self.counter += 1;
        Ok(outputs)
    }
}

/// Per-kind behavior and private state.
#[derive(Debug)]
pub enum ComponentKind {
    Wire,
    And,
    Or,
    Xor,
    Not,
    Battery,
    Clock(ClockPhase),
    FlipFlop { clock: EdgeDetector, output: bool },
    Button,
    Display { value: u64 },
    Scripted(ScriptedUnit),
    Nested(Box<NestedCircuit>),
}

impl ComponentKind {
    /// Built-in kind for a block code. Connector, cross and custom codes
    /// have no built-in kind.
    pub fn builtin(code: BlockCode, clock_period: Duration) -> Option<Self> {
        let kind = match code {
            BlockCode::WIRE => Self::Wire,
            BlockCode::AND => Self::And,
            BlockCode::OR => Self::Or,
            BlockCode::XOR => Self::Xor,
            BlockCode::NOT => Self::Not,
            BlockCode::BATTERY => Self::Battery,
            BlockCode::CLOCK => Self::Clock(ClockPhase::new(clock_period)),
            BlockCode::FLIP_FLOP => Self::FlipFlop {
                clock: EdgeDetector::default(),
                output: false,
            },
            BlockCode::BUTTON => Self::Button,
            BlockCode::DISPLAY => Self::Display { value: 0 },
            _ => return None,
        };
        Some(kind)
    }

    /// Create a scripted component kind.
    pub fn scripted(compiled: CompiledScript) -> Self {
        Self::Scripted(ScriptedUnit::new(compiled))
    }
}

/// A node of the compiled circuit.
#[derive(Debug)]
pub struct Component {
    code: BlockCode,
    kind: ComponentKind,
    cells: Vec<Pos>,
    slot: StateSlot,
    inputs: Pins,
    outputs: Pins,
    clock: Option<ConnectionId>,
}

impl Component {
    pub(crate) fn new(code: BlockCode, kind: ComponentKind, first: Pos, slot: StateSlot) -> Self {
        Self {
            code,
            kind,
            cells: vec![first],
            slot,
            inputs: Pins::new(),
            outputs: Pins::new(),
            clock: None,
        }
    }

    /// Get the block code the component was built from.
    pub fn code(&self) -> BlockCode {
        self.code
    }

    /// Get the component kind.
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// Check whether this is a wire group.
    pub fn is_wire(&self) -> bool {
        matches!(self.kind, ComponentKind::Wire)
    }

    /// Check whether this is a button.
    pub fn is_button(&self) -> bool {
        matches!(self.kind, ComponentKind::Button)
    }

    /// Occupied cells, first cell first.
    pub fn cells(&self) -> &[Pos] {
        &self.cells
    }

    /// Get the first cell, which keys the shared state.
    pub fn first_pos(&self) -> Pos {
        self.cells[0]
    }

    /// Get the state slot shared by every cell.
    pub fn slot(&self) -> StateSlot {
        self.slot
    }

    /// Get the input connections.
    pub fn inputs(&self) -> &[ConnectionId] {
        &self.inputs
    }

    /// Get the output connections.
    pub fn outputs(&self) -> &[ConnectionId] {
        &self.outputs
    }

    /// Get the clock connection, if any.
    pub fn clock(&self) -> Option<ConnectionId> {
        self.clock
    }

    /// Value shown by a display component.
    pub fn display_value(&self) -> Option<u64> {
        match self.kind {
            ComponentKind::Display { value } => Some(value),
            _ => None,
        }
    }

    pub(crate) fn push_cell(&mut self, pos: Pos) {
        self.cells.push(pos);
    }

    pub(crate) fn add_input(&mut self, conn: ConnectionId) {
        self.inputs.push(conn);
    }

    pub(crate) fn add_output(&mut self, conn: ConnectionId) {
        self.outputs.push(conn);
    }

    /// Attach the clock slot. The first clock connection wins; returns
    /// whether `conn` took the slot.
    pub(crate) fn add_clock(&mut self, conn: ConnectionId) -> bool {
        if self.clock.is_some() {
            return false;
        }
        self.clock = Some(conn);
        true
    }

    /// Flip a button's state. Other kinds ignore toggles.
    pub(crate) fn toggle(&mut self, states: &mut StateTable) -> bool {
        if !self.is_button() {
            return false;
        }
        let value = !states.get(self.slot);
        states.set(self.slot, value);
        true
    }

    /// Run one update: read inputs, write outputs.
    pub(crate) fn update(
        &mut self,
        conns: &mut [Connection],
        states: &mut StateTable,
    ) -> SimResult<()> {
        let Component {
            kind,
            cells,
            slot,
            inputs,
            outputs,
            clock,
            ..
        } = self;

        let clock_level = clock
            .as_ref()
            .map(|id| read(conns, states, id))
            .unwrap_or(false);

        let level = match kind {
            ComponentKind::Wire | ComponentKind::Or => {
                inputs.iter().any(|id| read(conns, states, id))
            }
            ComponentKind::And => {
                !inputs.is_empty() && inputs.iter().all(|id| read(conns, states, id))
            }
            ComponentKind::Not => inputs
                .first()
                .map(|id| !read(conns, states, id))
                .unwrap_or(true),
            ComponentKind::Xor => {
                let a = inputs.first().map(|id| read(conns, states, id)).unwrap_or(false);
                let b = inputs.get(1).map(|id| read(conns, states, id)).unwrap_or(false);
                a ^ b
            }
            ComponentKind::Battery => true,
            ComponentKind::Clock(phase) => phase.poll(Instant::now()),
            ComponentKind::Button => states.get(*slot),
            ComponentKind::FlipFlop { clock, output } => {
                if clock.rising(clock_level) {
                    *output = inputs
                        .first()
                        .map(|id| read(conns, states, id))
                        .unwrap_or(false);
                }
                *output
            }
            ComponentKind::Display { value } => {
                let levels: Vec<bool> = inputs.iter().map(|id| read(conns, states, id)).collect();
                *value = bits::to_int(&levels);
                states.set(*slot, *value != 0);
                return Ok(());
            }
            ComponentKind::Scripted(unit) => {
                return update_scripted(unit, cells[0], inputs, outputs, clock_level, *slot, conns, states);
            }
            ComponentKind::Nested(nested) => {
                let level = nested.update(inputs, outputs, *clock, conns, states)?;
                states.set(*slot, level);
                return Ok(());
            }
        };

        states.set(*slot, level);
        for id in outputs.iter() {
            conns[id.index()].set_active(states, level);
        }
        Ok(())
    }
}

fn read(conns: &[Connection], states: &StateTable, id: &ConnectionId) -> bool {
    conns[id.index()].is_active(states)
}

#[allow(clippy::too_many_arguments)]
fn update_scripted(
    unit: &mut ScriptedUnit,
    pos: Pos,
    inputs: &[ConnectionId],
    outputs: &[ConnectionId],
    clock_level: bool,
    slot: StateSlot,
    conns: &mut [Connection],
    states: &mut StateTable,
) -> SimResult<()> {
    let fire = match unit.trigger() {
        Trigger::Instant => {
            // every flag is consumed, so no short-circuit
            inputs
                .iter()
                .fold(false, |acc, id| conns[id.index()].is_changed() | acc)
        }
        Trigger::Clocked => unit.clock.rising(clock_level),
    };
    if !fire {
        return Ok(());
    }

    let levels: Vec<bool> = inputs
        .iter()
        .map(|id| conns[id.index()].is_active(states))
        .collect();
    let results = unit
        .invoke(&levels)
        .map_err(|source| SimError::Script { pos, source })?;

    for (i, id) in outputs.iter().enumerate() {
        let value = results.get(i).copied().unwrap_or(false);
        conns[id.index()].set_active(states, value);
    }
    states.set(slot, results.first().copied().unwrap_or(false));
    Ok(())
}
