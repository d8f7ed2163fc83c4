//! Integration Tests for the Grid Compiler and Simulation
//!
//! These tests paint grids through the public API, compile them and check
//! what the ticks produce.

use std::time::{Duration, Instant};

use gridsim_core::circuit::{Circuit, ComponentKind};
use gridsim_core::io::MemoryFiles;
use gridsim_core::script::{bits, CompiledScript, FnScript, ScriptHost, Trigger};
use gridsim_core::{
    BlockCode, BuildOptions, CustomSource, Field, Pos, Rect, ScriptError, SimConfig, SimulationDriver,
};

/// Compiles every source to an inverter. Sources mentioning "clocked" get
/// the clocked trigger and count their invocations instead.
struct TestHost;

impl ScriptHost for TestHost {
    fn compile(&self, name: &str, source: &str) -> Result<CompiledScript, ScriptError> {
        if source.contains("clocked") {
            return Ok(CompiledScript::new(
                name,
                Trigger::Clocked,
                FnScript::new(|_, counter, memory| {
                    memory.insert("last".into(), counter.into());
                    Ok(bits::from_int_width(counter + 1, 2))
                }),
            ));
        }
        Ok(CompiledScript::new(
            name,
            Trigger::Instant,
            FnScript::new(|inputs, _, _| Ok(inputs.iter().map(|b| !b).collect())),
        ))
    }
}

fn paint(field: &mut Field, row: i32, codes: &[BlockCode]) {
    for (x, &code) in codes.iter().enumerate() {
        field.set(Pos::new(x as i32, row), code);
    }
}

fn build(field: &Field) -> Circuit {
    let build = field.build_objects(&BuildOptions::default()).unwrap();
    assert!(build.issues.is_empty(), "unexpected issues: {:?}", build.issues);
    build.circuit
}

fn script_counter(circuit: &Circuit, pos: Pos) -> u64 {
    let id = circuit.component_at(pos).unwrap();
    match circuit.component(id).kind() {
        ComponentKind::Scripted(unit) => unit.counter(),
        other => panic!("not a scripted component: {other:?}"),
    }
}

/// A driven OUT cell reaches the IN cell below the wire after exactly one tick.
#[test]
fn out_wire_in_propagates_in_one_tick() {
    let mut field = Field::new("column", 1, 5);
    field.set(Pos::new(0, 0), BlockCode::BUTTON);
    field.set(Pos::new(0, 1), BlockCode::OUT);
    field.set(Pos::new(0, 2), BlockCode::WIRE);
    field.set(Pos::new(0, 3), BlockCode::IN);
    field.set(Pos::new(0, 4), BlockCode::DISPLAY);

    let mut circuit = build(&field);
    let input = circuit.connection_at(Pos::new(0, 3)).unwrap();

    circuit.handle_toggle_input([0]);
    assert!(!circuit.connection_active(input), "zero ticks must not propagate");

    circuit.update().unwrap();
    assert!(circuit.connection_active(input));
    // the display ran before the wire this tick
    assert_eq!(circuit.display_values(), vec![(Pos::new(0, 4), 0)]);

    circuit.update().unwrap();
    assert_eq!(circuit.display_values(), vec![(Pos::new(0, 4), 1)]);
}

/// Signals cross one gate-then-wire hop per tick.
#[test]
fn chains_settle_over_several_ticks() {
    let mut field = Field::new("chain", 7, 1);
    paint(
        &mut field,
        0,
        &[
            BlockCode::BATTERY,
            BlockCode::OUT,
            BlockCode::WIRE,
            BlockCode::IN,
            BlockCode::NOT,
            BlockCode::OUT,
            BlockCode::WIRE,
        ],
    );
    let mut circuit = build(&field);
    let end = Pos::new(6, 0);

    circuit.update().unwrap();
    assert_eq!(circuit.state_at(end), Some(true));
    circuit.update().unwrap();
    assert_eq!(circuit.state_at(end), Some(false));
    circuit.update().unwrap();
    assert_eq!(circuit.state_at(end), Some(false));
}

/// Two wires crossing through a cross cell stay independent.
#[test]
fn crossed_wires_do_not_mix() {
    let mut field = Field::new("cross", 5, 5);
    // horizontal: battery -> out -> wire, cross, wire
    paint(
        &mut field,
        2,
        &[BlockCode::BATTERY, BlockCode::OUT, BlockCode::WIRE, BlockCode::CROSS, BlockCode::WIRE],
    );
    // vertical wire through the cross, undriven
    field.set(Pos::new(3, 0), BlockCode::WIRE);
    field.set(Pos::new(3, 1), BlockCode::WIRE);
    field.set(Pos::new(3, 3), BlockCode::WIRE);
    field.set(Pos::new(3, 4), BlockCode::WIRE);

    let mut circuit = build(&field);
    circuit.update().unwrap();

    assert_eq!(circuit.state_at(Pos::new(4, 2)), Some(true));
    assert_eq!(circuit.state_at(Pos::new(3, 0)), Some(false));
    assert_eq!(circuit.state_at(Pos::new(3, 4)), Some(false));
    assert_eq!(circuit.component_at(Pos::new(3, 0)), circuit.component_at(Pos::new(3, 4)));
}

/// A flip-flop latches its data input on the rising edge only.
#[test]
fn flip_flop_latches_on_rising_edge() {
    let mut field = Field::new("latch", 5, 3);
    // data: button 0 -> out -> wire -> in -> flip-flop
    paint(
        &mut field,
        0,
        &[BlockCode::BUTTON, BlockCode::OUT, BlockCode::WIRE, BlockCode::IN, BlockCode::FLIP_FLOP],
    );
    field.set(Pos::new(4, 1), BlockCode::FLIP_FLOP);
    // clock: button 1 -> out -> wire -> clock-in -> flip-flop
    paint(
        &mut field,
        2,
        &[BlockCode::BUTTON, BlockCode::OUT, BlockCode::WIRE, BlockCode::CLOCK_IN, BlockCode::FLIP_FLOP],
    );
    let mut circuit = build(&field);
    let ff = Pos::new(4, 0);
    let tick = |c: &mut Circuit, n: usize| {
        for _ in 0..n {
            c.update().unwrap();
        }
    };

    circuit.handle_toggle_input([0]); // data high
    tick(&mut circuit, 3);
    assert_eq!(circuit.state_at(ff), Some(false), "no edge yet");

    circuit.handle_toggle_input([1]); // clock rises
    tick(&mut circuit, 3);
    assert_eq!(circuit.state_at(ff), Some(true));

    circuit.handle_toggle_input([0]); // data low, clock still high
    tick(&mut circuit, 3);
    assert_eq!(circuit.state_at(ff), Some(true), "held until the next edge");

    circuit.handle_toggle_input([1, 1]); // clock low then high within one batch: no edge seen
    tick(&mut circuit, 3);
    assert_eq!(circuit.state_at(ff), Some(true));

    circuit.handle_toggle_input([1]); // clock falls
    tick(&mut circuit, 3);
    circuit.handle_toggle_input([1]); // clock rises
    tick(&mut circuit, 3);
    assert_eq!(circuit.state_at(ff), Some(false));
}

/// Pasting a foreign field reuses the destination's entry of the same name.
#[test]
fn paste_remaps_custom_codes_by_name() {
    let host = TestHost;
    let files = MemoryFiles::new();
    for name in ["a.script", "b.script", "half_adder"] {
        files.insert(name, "instant");
    }

    let mut dest = Field::new("dest", 8, 8);
    dest.load_component("a.script", &files, &host).unwrap();
    dest.load_component("b.script", &files, &host).unwrap();
    let dest_code = dest.load_component("half_adder", &files, &host).unwrap();

    let mut src = Field::new("src", 2, 1);
    let src_code = src.load_component("half_adder", &files, &host).unwrap();
    src.set(Pos::new(0, 0), src_code);
    src.set(Pos::new(1, 0), src_code);
    assert_eq!(src_code, BlockCode::FIRST_CUSTOM);
    assert_eq!(dest_code, BlockCode::custom(2));

    let before = dest.registry().read().custom_len();
    dest.paste(&src, Pos::new(4, 4));

    assert_eq!(dest.grid().get(Pos::new(4, 4)), dest_code);
    assert_eq!(dest.grid().get(Pos::new(5, 4)), dest_code);
    assert_eq!(dest.registry().read().custom_len(), before);
}

/// Copy, cut and paste within one field keep codes untouched.
#[test]
fn cut_and_paste_moves_cells() {
    let mut field = Field::new("main", 6, 2);
    paint(&mut field, 0, &[BlockCode::BATTERY, BlockCode::OUT, BlockCode::WIRE]);

    let part = field.cut(Rect::from_corners(Pos::new(0, 0), Pos::new(2, 0)));
    assert!(field.grid().is_empty());

    field.paste(&part, Pos::new(3, 1));
    assert_eq!(field.grid().get(Pos::new(3, 1)), BlockCode::BATTERY);
    assert_eq!(field.grid().get(Pos::new(5, 1)), BlockCode::WIRE);

    let mut circuit = build(&field);
    circuit.update().unwrap();
    assert_eq!(circuit.state_at(Pos::new(5, 1)), Some(true));
}

/// Saving and reopening keeps cells and component names.
#[test]
fn save_and_open_round_trip() {
    let host = TestHost;
    let files = MemoryFiles::new();
    files.insert("inv.script", "instant");
    Field::new("inner", 2, 2).save(&files, "inner.json").unwrap();

    let mut field = Field::new("main.json", 4, 2);
    let inv = field.load_component("inv.script", &files, &host).unwrap();
    let inner = field.load_component("inner.json", &files, &host).unwrap();
    paint(&mut field, 0, &[inv, inner, BlockCode::WIRE]);
    field.set(Pos::new(0, 1), BlockCode::AND);
    field.save(&files, "main.json").unwrap();

    let loaded = Field::open(&files, &host, "main.json").unwrap();
    assert_eq!(loaded.grid().width(), 4);
    assert_eq!(loaded.grid().height(), 2);

    let original: Vec<_> = field.grid().occupied().collect();
    let reopened: Vec<_> = loaded.grid().occupied().collect();
    assert_eq!(original.len(), reopened.len());

    let name_of = |f: &Field, code: BlockCode| -> String {
        match f.registry().read().lookup(code) {
            Some(entry) => entry.name().to_string(),
            None => code.to_string(),
        }
    };
    for ((pos_a, a), (pos_b, b)) in original.into_iter().zip(reopened) {
        assert_eq!(pos_a, pos_b);
        assert_eq!(name_of(&field, a), name_of(&loaded, b));
    }

    let registry = loaded.registry().read();
    assert!(matches!(
        registry.lookup(registry.code_of("inner.json").unwrap()).unwrap().source(),
        CustomSource::Circuit(_)
    ));
}

/// An unresolvable reference leaves a hole and an issue, not a failed build.
#[test]
fn unresolved_references_are_reported() {
    let files = MemoryFiles::new();
    files.insert(
        "main.json",
        r#"{"width": 4, "height": 1,
            "blocks": [{"pos": {"x": 0, "y": 0}, "block": 20},
                       {"pos": {"x": 1, "y": 0}, "block": 3},
                       {"pos": {"x": 2, "y": 0}, "block": 1}],
            "components": {"20": "missing.json"}}"#,
    );

    let field = Field::open(&files, &TestHost, "main.json").unwrap();
    assert_eq!(field.grid().get(Pos::new(0, 0)), BlockCode::FIRST_CUSTOM);

    let build = field.build_objects(&BuildOptions::default()).unwrap();
    assert_eq!(build.issues.len(), 1);
    assert_eq!(build.issues[0].pos, Pos::new(0, 0));
    assert_eq!(build.circuit.component_count(), 1);

    // the name survives a save even though it never resolved
    assert_eq!(
        field.to_document().components.get("15").map(String::as_str),
        Some("missing.json")
    );
}

/// Malformed documents open as empty fields.
#[test]
fn malformed_documents_open_empty() {
    let files = MemoryFiles::new();
    files.insert("broken.json", "{\"width\": ");
    let field = Field::open(&files, &TestHost, "broken.json").unwrap();
    assert_eq!(field.grid().len(), 0);
    assert_eq!(field.build_objects(&BuildOptions::default()).unwrap().circuit.component_count(), 0);
}

/// A saved grid used as a component behaves like its contents.
#[test]
fn nested_circuit_acts_as_one_component() {
    let files = MemoryFiles::new();
    // inverter: in -> not -> out, both boundary cells left open
    let mut inner = Field::new("inverter", 3, 1);
    paint(&mut inner, 0, &[BlockCode::IN, BlockCode::NOT, BlockCode::OUT]);
    inner.save(&files, "inverter.json").unwrap();

    let mut field = Field::new("main", 7, 1);
    let inverter = field.load_component("inverter.json", &files, &TestHost).unwrap();
    paint(
        &mut field,
        0,
        &[
            BlockCode::BUTTON,
            BlockCode::OUT,
            BlockCode::WIRE,
            BlockCode::IN,
            inverter,
            BlockCode::OUT,
            BlockCode::WIRE,
        ],
    );

    let mut circuit = build(&field);
    let id = circuit.component_at(Pos::new(4, 0)).unwrap();
    match circuit.component(id).kind() {
        ComponentKind::Nested(nested) => {
            assert_eq!(nested.input_pins().len(), 1);
            assert_eq!(nested.output_pins().len(), 1);
            assert!(nested.clock_pin().is_none());
        }
        other => panic!("expected a nested circuit, got {other:?}"),
    }

    let out = Pos::new(6, 0);
    circuit.update().unwrap();
    assert_eq!(circuit.state_at(out), Some(true));

    circuit.handle_toggle_input([0]);
    circuit.update().unwrap();
    assert_eq!(circuit.state_at(out), Some(true), "input wire not refreshed yet");
    circuit.update().unwrap();
    assert_eq!(circuit.state_at(out), Some(false));
}

/// Two instances of one nested grid keep separate state.
#[test]
fn nested_instances_are_independent() {
    let files = MemoryFiles::new();
    let mut inner = Field::new("buffer", 3, 1);
    paint(&mut inner, 0, &[BlockCode::IN, BlockCode::OR, BlockCode::OUT]);
    inner.save(&files, "buffer.json").unwrap();

    let mut field = Field::new("main", 7, 3);
    let buffer = field.load_component("buffer.json", &files, &TestHost).unwrap();
    // rows 0 and 2; the empty row keeps the two chains apart
    for row in [0, 2] {
        paint(
            &mut field,
            row,
            &[
                BlockCode::BUTTON,
                BlockCode::OUT,
                BlockCode::WIRE,
                BlockCode::IN,
                buffer,
                BlockCode::OUT,
                BlockCode::WIRE,
            ],
        );
    }

    let mut circuit = build(&field);
    assert_eq!(circuit.buttons().len(), 2);

    circuit.handle_toggle_input([0]);
    for _ in 0..3 {
        circuit.update().unwrap();
    }
    assert_eq!(circuit.state_at(Pos::new(6, 0)), Some(true));
    assert_eq!(circuit.state_at(Pos::new(6, 2)), Some(false));
}

/// The outer clock reaches a clock-in pin of the nested grid.
#[test]
fn nested_flip_flop_clocked_from_outside() {
    let files = MemoryFiles::new();
    // in -> flip-flop -> out, with an open clock-in under the flip-flop
    let mut inner = Field::new("latch", 3, 2);
    paint(&mut inner, 0, &[BlockCode::IN, BlockCode::FLIP_FLOP, BlockCode::OUT]);
    inner.set(Pos::new(1, 1), BlockCode::CLOCK_IN);
    inner.save(&files, "latch.json").unwrap();

    let mut field = Field::new("main", 7, 3);
    let latch = field.load_component("latch.json", &files, &TestHost).unwrap();
    // data on row 0, clock on row 2, one nested instance spanning column 4
    paint(
        &mut field,
        0,
        &[
            BlockCode::BUTTON,
            BlockCode::OUT,
            BlockCode::WIRE,
            BlockCode::IN,
            latch,
            BlockCode::OUT,
            BlockCode::WIRE,
        ],
    );
    field.set(Pos::new(4, 1), latch);
    paint(
        &mut field,
        2,
        &[BlockCode::BUTTON, BlockCode::OUT, BlockCode::WIRE, BlockCode::CLOCK_IN, latch],
    );

    let mut circuit = build(&field);
    let id = circuit.component_at(Pos::new(4, 1)).unwrap();
    assert!(circuit.component(id).clock().is_some());
    match circuit.component(id).kind() {
        ComponentKind::Nested(nested) => assert!(nested.clock_pin().is_some()),
        other => panic!("expected a nested circuit, got {other:?}"),
    }

    let out = Pos::new(6, 0);
    let tick = |c: &mut Circuit, n: usize| {
        for _ in 0..n {
            c.update().unwrap();
        }
    };

    circuit.handle_toggle_input([0]); // data high
    tick(&mut circuit, 4);
    assert_eq!(circuit.state_at(out), Some(false), "no clock edge yet");

    circuit.handle_toggle_input([1]); // clock rises
    tick(&mut circuit, 4);
    assert_eq!(circuit.state_at(out), Some(true));

    circuit.handle_toggle_input([0]); // data low, clock still high
    tick(&mut circuit, 4);
    assert_eq!(circuit.state_at(out), Some(true), "held until the next edge");
}

/// Outer pins beyond the nested grid's open pins are left alone.
#[test]
fn nested_pins_match_index_wise() {
    let files = MemoryFiles::new();
    let mut inner = Field::new("buffer", 3, 1);
    paint(&mut inner, 0, &[BlockCode::IN, BlockCode::OR, BlockCode::OUT]);
    inner.save(&files, "buffer.json").unwrap();

    let mut field = Field::new("main", 7, 3);
    let buffer = field.load_component("buffer.json", &files, &TestHost).unwrap();
    // two inputs and two outputs around a single instance
    for row in [0, 2] {
        paint(
            &mut field,
            row,
            &[
                BlockCode::BUTTON,
                BlockCode::OUT,
                BlockCode::WIRE,
                BlockCode::IN,
                buffer,
                BlockCode::OUT,
                BlockCode::WIRE,
            ],
        );
    }
    field.set(Pos::new(4, 1), buffer);

    let mut circuit = build(&field);
    let id = circuit.component_at(Pos::new(4, 0)).unwrap();
    assert_eq!(circuit.component_at(Pos::new(4, 2)), Some(id));
    assert_eq!(circuit.component(id).inputs().len(), 2);
    assert_eq!(circuit.component(id).outputs().len(), 2);

    let first_out = Pos::new(6, 0);
    let second_out = Pos::new(6, 2);
    let tick = |c: &mut Circuit, n: usize| {
        for _ in 0..n {
            c.update().unwrap();
        }
    };

    circuit.handle_toggle_input([1]); // second input has no inner pin
    tick(&mut circuit, 4);
    assert_eq!(circuit.state_at(first_out), Some(false));
    assert_eq!(circuit.state_at(second_out), Some(false));

    circuit.handle_toggle_input([0]);
    tick(&mut circuit, 4);
    assert_eq!(circuit.state_at(first_out), Some(true));
    assert_eq!(circuit.state_at(second_out), Some(false), "second output has no inner pin");
}

/// An IN cell carries a wire into a component, never a component onto a wire.
#[test]
fn in_and_out_cells_point_one_way() {
    let mut field = Field::new("direction", 3, 3);
    paint(&mut field, 0, &[BlockCode::BATTERY, BlockCode::IN, BlockCode::WIRE]);
    paint(&mut field, 2, &[BlockCode::BATTERY, BlockCode::OUT, BlockCode::WIRE]);

    let mut circuit = build(&field);
    circuit.update().unwrap();
    circuit.update().unwrap();
    assert_eq!(circuit.state_at(Pos::new(2, 0)), Some(false), "IN does not drive the wire");
    assert_eq!(circuit.state_at(Pos::new(2, 2)), Some(true), "OUT does");

    let backwards = circuit.connection_at(Pos::new(1, 0)).unwrap();
    assert!(circuit.connection(backwards).input().is_some());
    assert!(circuit.connection(backwards).output().is_some());
}

/// Instant scripts stay silent until one of their inputs changes.
#[test]
fn instant_scripts_run_on_input_changes() {
    let files = MemoryFiles::new();
    files.insert("inv.script", "instant");
    let mut field = Field::new("main", 7, 1);
    let inv = field.load_component("inv.script", &files, &TestHost).unwrap();
    paint(
        &mut field,
        0,
        &[
            BlockCode::BUTTON,
            BlockCode::OUT,
            BlockCode::WIRE,
            BlockCode::IN,
            inv,
            BlockCode::OUT,
            BlockCode::WIRE,
        ],
    );
    let mut circuit = build(&field);
    let script = Pos::new(4, 0);
    let out = Pos::new(6, 0);

    circuit.update().unwrap();
    assert_eq!(script_counter(&circuit, script), 0);
    assert_eq!(circuit.state_at(out), Some(false), "outputs stay low until the first run");

    circuit.update().unwrap();
    assert_eq!(script_counter(&circuit, script), 0, "nothing changed");

    circuit.handle_toggle_input([0]);
    circuit.update().unwrap();
    assert_eq!(script_counter(&circuit, script), 0, "input wire not refreshed yet");
    circuit.update().unwrap();
    assert_eq!(script_counter(&circuit, script), 1);
    assert_eq!(circuit.state_at(out), Some(false));

    circuit.handle_toggle_input([0]);
    circuit.update().unwrap();
    circuit.update().unwrap();
    assert_eq!(script_counter(&circuit, script), 2);
    assert_eq!(circuit.state_at(out), Some(true));

    circuit.update().unwrap();
    assert_eq!(script_counter(&circuit, script), 2);
}

/// Clocked scripts run once per rising clock edge.
#[test]
fn clocked_scripts_run_on_rising_edges() {
    let files = MemoryFiles::new();
    files.insert("count.script", "clocked");
    let mut field = Field::new("main", 5, 1);
    let count = field.load_component("count.script", &files, &TestHost).unwrap();
    paint(
        &mut field,
        0,
        &[BlockCode::BUTTON, BlockCode::OUT, BlockCode::WIRE, BlockCode::CLOCK_IN, count],
    );
    let mut circuit = build(&field);
    let script = Pos::new(4, 0);
    let run = |c: &mut Circuit, n: usize| {
        for _ in 0..n {
            c.update().unwrap();
        }
    };

    run(&mut circuit, 3);
    assert_eq!(script_counter(&circuit, script), 0);

    circuit.handle_toggle_input([0]);
    run(&mut circuit, 3);
    assert_eq!(script_counter(&circuit, script), 1);
    assert_eq!(circuit.state_at(script), Some(true), "first output of from_int(1)");

    circuit.handle_toggle_input([0]);
    run(&mut circuit, 3);
    assert_eq!(script_counter(&circuit, script), 1, "falling edge");

    circuit.handle_toggle_input([0]);
    run(&mut circuit, 3);
    assert_eq!(script_counter(&circuit, script), 2);

    let id = circuit.component_at(script).unwrap();
    if let ComponentKind::Scripted(unit) = circuit.component(id).kind() {
        assert_eq!(unit.memory().get("last"), Some(&serde_json::json!(1)));
    }
}

/// The driver picks up edits through the debounced rebuild.
#[test]
fn driver_follows_edits() {
    let config = SimConfig {
        tick_delay_ms: 1,
        clock_period_ms: 500,
        rebuild_debounce_ms: 10,
    };
    let mut driver = SimulationDriver::new(config).unwrap();
    let live = driver.live_states();

    let mut field = Field::new("live", 3, 1);
    paint(&mut field, 0, &[BlockCode::BATTERY, BlockCode::OUT, BlockCode::WIRE]);
    driver.request_rebuild();

    let deadline = Instant::now() + Duration::from_secs(5);
    while !live.get(Pos::new(2, 0)) && Instant::now() < deadline {
        driver.poll(&field);
        std::thread::sleep(Duration::from_millis(2));
    }
    assert!(live.get(Pos::new(2, 0)));

    field.set(Pos::new(0, 0), BlockCode::NOT);
    driver.request_rebuild();
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut rebuilt = false;
    while !rebuilt && Instant::now() < deadline {
        rebuilt = driver.poll(&field);
        std::thread::sleep(Duration::from_millis(2));
    }
    assert!(rebuilt);
    assert!(driver.is_running());

    driver.stop();
    assert!(driver.take_failure().is_none());
}
