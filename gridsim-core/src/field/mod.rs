//! Fields
//!
//! A [`Field`] is an editable grid bound to the component registry that
//! resolves its custom codes. It is what the editor mutates, what the
//! simulation driver snapshots for every rebuild, and what gets saved.
//!
//! # Copy and paste
//!
//! [`Field::copy`] and [`Field::cut`] produce a new field that shares the
//! source's registry, so custom codes stay meaningful. [`Field::paste`]
//! accepts a field with any registry: foreign entries are merged by name
//! and the pasted codes rewritten to the destination's numbering before the
//! cells are overlaid.

mod builder;
pub mod document;
pub mod loader;

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::circuit::Circuit;
use crate::config::BuildOptions;
use crate::error::{BuildError, LoadError};
use crate::grid::{BlockCode, Grid, Pos, Rect};
use crate::io::FileSource;
use crate::registry::{ComponentRegistry, SharedRegistry};
use crate::script::ScriptHost;

pub use document::{BlockEntry, SaveDocument};
pub use loader::Loader;

/// A cell the builder had to leave out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildIssue {
    pub pos: Pos,
    pub code: BlockCode,
    pub reason: String,
}

/// Output of a successful build.
#[derive(Debug)]
pub struct Build {
    pub circuit: Circuit,
    /// Cells left out of the circuit, including those of nested grids.
    pub issues: Vec<BuildIssue>,
}

/// An editable grid plus the registry resolving its custom codes.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    grid: Grid,
    registry: SharedRegistry,
}

impl Field {
    /// Create an empty field with a fresh registry.
    pub fn new(name: impl Into<String>, width: usize, height: usize) -> Self {
        Self::with_registry(name, Grid::new(width, height), ComponentRegistry::shared())
    }

    /// Create a field over an existing grid and registry.
    pub fn with_registry(name: impl Into<String>, grid: Grid, registry: SharedRegistry) -> Self {
        Self {
            name: name.into(),
            grid,
            registry,
        }
    }

    /// Get the field's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the underlying grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Get mutable access to the underlying grid.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Get the registry shared with copies of this field.
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    // ---------------------------------------------------------------------
    // Editing
    // ---------------------------------------------------------------------

    /// Place a block. Out-of-bounds positions are ignored.
    pub fn set(&mut self, pos: Pos, code: BlockCode) {
        self.grid.set(pos, code);
    }

    /// Empty a cell.
    pub fn delete(&mut self, pos: Pos) {
        self.grid.delete(pos);
    }

    /// Empty every cell.
    pub fn clear(&mut self) {
        self.grid.clear();
    }

    /// Resize the grid, keeping cells that still fit.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.grid.resize(width, height);
    }

    /// Copy `rect` into a new field sharing this field's registry.
    pub fn copy(&self, rect: Rect) -> Field {
        Field::with_registry(self.name.clone(), self.grid.sub_grid(rect), Arc::clone(&self.registry))
    }

    /// Copy `rect`, then clear it here.
    pub fn cut(&mut self, rect: Rect) -> Field {
        let part = self.copy(rect);
        self.grid.clear_rect(rect);
        part
    }

    /// Overlay `src` with its origin at `at`.
    ///
    /// Custom entries of a foreign registry are registered here by name
    /// (existing names keep their code) and the pasted cells are rewritten
    /// to this registry's codes. Custom codes `src` cannot name are dropped.
    pub fn paste(&mut self, src: &Field, at: Pos) {
        let mut part = src.grid.clone();

        if !Arc::ptr_eq(&self.registry, &src.registry) {
            let foreign = src.registry.read().clone();
            let mut remap = HashMap::new();
            {
                let mut registry = self.registry.write();
                for (code, entry) in foreign.entries() {
                    let local = registry.register(entry.name(), entry.source().clone());
                    debug!(component = entry.name(), from = code.raw(), to = local.raw(), "registry merged on paste");
                    remap.insert(code, local);
                }
            }
            part.remap(|code| {
                if !code.is_custom() {
                    return code;
                }
                remap.get(&code).copied().unwrap_or_else(|| {
                    warn!(code = code.raw(), "pasted custom code has no registry entry, dropped");
                    BlockCode::NONE
                })
            });
        }

        self.grid.overlay(&part, at);
    }

    // ---------------------------------------------------------------------
    // Building
    // ---------------------------------------------------------------------

    /// Compile the current grid into a runnable circuit.
    pub fn build_objects(&self, options: &BuildOptions) -> Result<Build, BuildError> {
        builder::build(self, options, 0)
    }

    pub(crate) fn build_nested(&self, options: &BuildOptions, depth: usize) -> Result<Build, BuildError> {
        builder::build(self, options, depth)
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Register a custom component by name, loading it through `files`.
    pub fn load_component(
        &self,
        name: &str,
        files: &dyn FileSource,
        scripts: &dyn ScriptHost,
    ) -> Result<BlockCode, LoadError> {
        let existing = {
            let registry = self.registry.read();
            registry
                .code_of(name)
                .filter(|&code| registry.lookup(code).is_some_and(|e| e.source().is_resolved()))
        };
        if let Some(code) = existing {
            return Ok(code);
        }
        let source = Loader::new(files, scripts).resolve(name)?;
        Ok(self.registry.write().register(name, source))
    }

    /// Snapshot the field as a save document.
    /// Only custom codes that appear on the grid are listed.
    pub fn to_document(&self) -> SaveDocument {
        let registry = self.registry.read();
        let mut doc = SaveDocument {
            width: self.grid.width(),
            height: self.grid.height(),
            ..SaveDocument::default()
        };

        for (pos, block) in self.grid.occupied() {
            doc.blocks.push(BlockEntry { pos, block });
            if let Some(entry) = registry.lookup(block) {
                doc.components
                    .entry(block.raw().to_string())
                    .or_insert_with(|| entry.name().to_string());
            }
        }
        doc
    }

    /// Write the field's document to `path`.
    pub fn save(&self, files: &dyn FileSource, path: &str) -> io::Result<()> {
        let json = self.to_document().to_json()?;
        files.write_text(path, &json)
    }

    /// Load a document and every custom component it references.
    pub fn open(files: &dyn FileSource, scripts: &dyn ScriptHost, path: &str) -> Result<Field, LoadError> {
        Loader::new(files, scripts).open(path)
    }
}
