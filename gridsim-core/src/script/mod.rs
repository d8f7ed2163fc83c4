//! Scripted Components
//!
//! User-supplied components run in an external interpreter. The engine only
//! needs a narrow synchronous contract from it:
//!
//! ```text
//! run(inputs: [bool], counter: u64, memory: {string: any}) -> [bool]
//! ```
//!
//! The interpreter itself lives outside this crate. Embedders implement
//! [`ScriptHost`] to turn source text into a [`CompiledScript`]; the engine
//! then calls [`Script::run`] from the simulation task whenever a scripted
//! component fires.
//!
//! # Triggers
//!
//! - [`Trigger::Instant`]: runs on any tick where one of its inputs changed.
//! - [`Trigger::Clocked`]: runs only on a rising edge of its clock input.

pub mod bits;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ScriptError;

/// Persistent per-instance memory of a scripted component.
pub type ScriptMemory = HashMap<String, Value>;

/// The contract every script must honor.
///
/// Scripts are shared by every component instance created from the same
/// registry entry, so all per-instance state goes through `memory`.
pub trait Script: Send + Sync {
    fn run(
        &self,
        inputs: &[bool],
        counter: u64,
        memory: &mut ScriptMemory,
    ) -> Result<Vec<bool>, ScriptError>;
}

/// When a scripted component runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Instant,
    Clocked,
}

/// A script ready to be instantiated as a component.
#[derive(Clone)]
pub struct CompiledScript {
    pub name: String,
    pub trigger: Trigger,
    pub script: Arc<dyn Script>,
}

impl CompiledScript {
    /// Bundle a script with its name and trigger.
    pub fn new(name: impl Into<String>, trigger: Trigger, script: impl Script + 'static) -> Self {
        Self {
            name: name.into(),
            trigger,
            script: Arc::new(script),
        }
    }
}

impl fmt::Debug for CompiledScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledScript")
            .field("name", &self.name)
            .field("trigger", &self.trigger)
            .finish()
    }
}

/// Compiles script source into runnable scripts.
pub trait ScriptHost: Send + Sync {
    fn compile(&self, name: &str, source: &str) -> Result<CompiledScript, ScriptError>;
}

/// Host for embedders without an interpreter. Every compile fails, so
/// scripted references load as unresolved.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoScripts;

impl ScriptHost for NoScripts {
    fn compile(&self, name: &str, _source: &str) -> Result<CompiledScript, ScriptError> {
        Err(ScriptError::Compile {
            name: name.to_string(),
            message: "no script host configured".to_string(),
        })
    }
}

/// Adapts a closure to [`Script`].
pub struct FnScript<F>(pub F);

impl<F> FnScript<F>
where
    F: Fn(&[bool], u64, &mut ScriptMemory) -> Result<Vec<bool>, ScriptError> + Send + Sync,
{
    /// Wrap a closure as a script.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Script for FnScript<F>
where
    F: Fn(&[bool], u64, &mut ScriptMemory) -> Result<Vec<bool>, ScriptError> + Send + Sync,
{
    fn run(
        &self,
        inputs: &[bool],
        counter: u64,
        memory: &mut ScriptMemory,
    ) -> Result<Vec<bool>, ScriptError> {
        (self.0)(inputs, counter, memory)
    }
}
