//! Error Types
//!
//! Failures are split by how far they reach:
//!
//! - [`BuildError`]: the grid could not be compiled at all.
//! - [`LoadError`]: a custom component name could not be resolved. The build
//!   carries on around the hole and reports a [`BuildIssue`](crate::field::BuildIssue).
//! - [`ScriptError`]: a script failed to compile or run.
//! - [`SimError`]: ends one simulation generation. The next rebuild starts
//!   a fresh one.
//!
//! Bounds violations are not errors anywhere in the crate, and malformed
//! documents decode to an empty document instead of failing.

use thiserror::Error;

use crate::grid::Pos;

/// Fatal failure while compiling a grid into a circuit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Connectivity labeling did not reach a fixed point.
    #[error("labeling did not converge after {passes} passes")]
    Diverged { passes: usize },
}

/// Failure reported by the scripting collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("script `{name}` failed to compile: {message}")]
    Compile { name: String, message: String },

    #[error("script `{name}` failed: {message}")]
    Failed { name: String, message: String },
}

/// Failure resolving a custom component name to a creator.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read `{name}`: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A nested grid includes itself, directly or transitively.
    #[error("`{0}` includes itself")]
    Cycle(String),

    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// Malformed configuration text.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure that ends the current simulation generation.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("component at ({}, {}) failed: {source}", pos.x, pos.y)]
    Script {
        pos: Pos,
        #[source]
        source: ScriptError,
    },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("simulation runtime unavailable: {0}")]
    Runtime(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
