//! Gridsim Core
//!
//! This crate turns a painted grid of logic cells into a runnable circuit
//! and keeps that circuit simulating while the grid is edited.
//! It implements:
//!
//! - Connectivity labeling of the raw cell matrix
//! - A graph builder that compiles labels into components and connections
//! - The per-tick update engine, including nested circuits and scripted parts
//! - A background simulation driver with debounced, cancellable rebuilds
//!
//! Rendering, input polling and the scripting interpreter live outside this
//! crate. They talk to it through [`script::ScriptHost`], [`io::FileSource`]
//! and plain method calls.
//!
//! # Architecture
//!
//! - `grid`: block codes, the grid itself and the labeling algorithm
//! - `registry`: block code → component creator table
//! - `field`: editable grid + registry, builder, save documents, loading
//! - `circuit`: compiled components, connections and the tick
//! - `script`: the contract scripted components run against
//! - `driver`: the background simulation loop
//!
//! # Example
//!
//! ```rust
//! use gridsim_core::config::BuildOptions;
//! use gridsim_core::field::Field;
//! use gridsim_core::grid::{BlockCode, Pos};
//!
//! let mut field = Field::new("demo", 3, 1);
//! field.set(Pos::new(0, 0), BlockCode::BATTERY);
//! field.set(Pos::new(1, 0), BlockCode::OUT);
//! field.set(Pos::new(2, 0), BlockCode::WIRE);
//!
//! let mut circuit = field.build_objects(&BuildOptions::default()).unwrap().circuit;
//! circuit.update().unwrap();
//! assert_eq!(circuit.state_at(Pos::new(2, 0)), Some(true));
//! ```

pub mod circuit;
pub mod config;
pub mod driver;
pub mod error;
pub mod field;
pub mod grid;
pub mod io;
pub mod registry;
pub mod script;

pub use circuit::{Circuit, LiveStates};
pub use config::{BuildOptions, SimConfig};
pub use driver::SimulationDriver;
pub use error::{BuildError, ConfigError, LoadError, ScriptError, SimError, SimResult};
pub use field::{Build, BuildIssue, Field, SaveDocument};
pub use grid::{BlockCode, Grid, Pos, Rect};
pub use registry::{ComponentRegistry, CustomSource, SharedRegistry};
