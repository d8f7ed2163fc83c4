//! Component Registry
//!
//! Maps block codes to the creators that instantiate components. Built-in
//! codes are fixed; custom codes are handed out in registration order,
//! starting at [`BlockCode::FIRST_CUSTOM`], and keyed by a stable display
//! name. Registering a name twice returns the existing code.
//!
//! A registry is shared between a field and every field copied from it
//! ([`SharedRegistry`]). The builder works on a snapshot, so no lock is held
//! while a circuit compiles.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::circuit::{ComponentKind, NestedCircuit};
use crate::config::BuildOptions;
use crate::field::{BuildIssue, Field};
use crate::grid::BlockCode;
use crate::script::CompiledScript;

/// Registry shared between a field and its copies.
pub type SharedRegistry = Arc<RwLock<ComponentRegistry>>;

/// Nested circuits deeper than this are reported instead of compiled.
pub const MAX_NESTING: usize = 32;

/// What a custom code instantiates.
#[derive(Debug, Clone)]
pub enum CustomSource {
    /// An externally scripted component.
    Script(CompiledScript),

    /// A nested grid. Every instance compiles its own inner circuit.
    Circuit(Arc<Field>),

    /// The name could not be resolved. Cells using it build as holes.
    Unresolved { reason: String },
}

impl CustomSource {
    /// Check whether the source can be instantiated.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, CustomSource::Unresolved { .. })
    }
}

/// A registered custom component.
#[derive(Debug, Clone)]
pub struct CustomEntry {
    name: String,
    source: CustomSource,
}

impl CustomEntry {
    /// Get the entry's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the entry's source.
    pub fn source(&self) -> &CustomSource {
        &self.source
    }
}

/// Type code → creator table.
#[derive(Debug, Default, Clone)]
pub struct ComponentRegistry {
    custom: Vec<CustomEntry>,
}

impl ComponentRegistry {
    /// Create a registry with no custom entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a new registry for sharing.
    pub fn shared() -> SharedRegistry {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Register a custom component by name.
    ///
    /// If the name is already registered its code is returned unchanged;
    /// an unresolved entry is upgraded when a resolved source arrives.
    pub fn register(&mut self, name: impl Into<String>, source: CustomSource) -> BlockCode {
        let name = name.into();
        if let Some(index) = self.custom.iter().position(|e| e.name == name) {
            let entry = &mut self.custom[index];
            if !entry.source.is_resolved() && source.is_resolved() {
                entry.source = source;
            }
            return BlockCode::custom(index);
        }
        self.custom.push(CustomEntry { name, source });
        BlockCode::custom(self.custom.len() - 1)
    }

    /// Get the custom entry behind a code.
    pub fn lookup(&self, code: BlockCode) -> Option<&CustomEntry> {
        code.custom_index().and_then(|i| self.custom.get(i))
    }

    /// Find the code registered under `name`.
    pub fn code_of(&self, name: &str) -> Option<BlockCode> {
        self.custom
            .iter()
            .position(|e| e.name == name)
            .map(BlockCode::custom)
    }

    /// Number of custom entries.
    pub fn custom_len(&self) -> usize {
        self.custom.len()
    }

    /// Check whether no custom entries are registered.
    pub fn is_empty(&self) -> bool {
        self.custom.is_empty()
    }

    /// Custom entries with their codes, in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (BlockCode, &CustomEntry)> {
        self.custom
            .iter()
            .enumerate()
            .map(|(i, e)| (BlockCode::custom(i), e))
    }

    /// Instantiate the component behind `code`.
    ///
    /// Returns the component kind plus any non-fatal issues from compiling a
    /// nested grid, or the reason the code cannot be instantiated.
    pub(crate) fn create(
        &self,
        code: BlockCode,
        options: &BuildOptions,
        depth: usize,
    ) -> Result<(ComponentKind, Vec<BuildIssue>), String> {
        if let Some(kind) = ComponentKind::builtin(code, options.clock_period) {
            return Ok((kind, Vec::new()));
        }

        let entry = self
            .lookup(code)
            .ok_or_else(|| format!("no component registered for code {}", code.raw()))?;

        match &entry.source {
            CustomSource::Script(compiled) => Ok((ComponentKind::scripted(compiled.clone()), Vec::new())),
            CustomSource::Circuit(field) => {
                if depth >= MAX_NESTING {
                    return Err(format!("`{}` is nested more than {MAX_NESTING} levels deep", entry.name));
                }
                let build = field
                    .build_nested(options, depth + 1)
                    .map_err(|e| format!("`{}`: {e}", entry.name))?;
                let nested = NestedCircuit::new(build.circuit);
                Ok((ComponentKind::Nested(Box::new(nested)), build.issues))
            }
            CustomSource::Unresolved { reason } => Err(format!("`{}` is unresolved: {reason}", entry.name)),
        }
    }
}
