//! Custom Component Loading
//!
//! Resolves component names through the file collaborator. A name ending
//! in `.json` is a nested grid document and is loaded recursively; any other
//! name is script source for the [`ScriptHost`].
//!
//! The loader keeps the stack of documents currently being opened, so a grid
//! that includes itself (directly or through other grids) fails with
//! [`LoadError::Cycle`] instead of recursing forever.

use std::sync::Arc;

use tracing::{debug, warn};

use super::document::SaveDocument;
use super::Field;
use crate::error::LoadError;
use crate::grid::BlockCode;
use crate::io::FileSource;
use crate::registry::CustomSource;
use crate::script::ScriptHost;

/// Whether `name` refers to a nested grid document.
pub fn is_document_name(name: &str) -> bool {
    name.ends_with(".json")
}

pub struct Loader<'a> {
    files: &'a dyn FileSource,
    scripts: &'a dyn ScriptHost,
    stack: Vec<String>,
}

impl<'a> Loader<'a> {
    /// Create a loader over the given collaborators.
    pub fn new(files: &'a dyn FileSource, scripts: &'a dyn ScriptHost) -> Self {
        Self {
            files,
            scripts,
            stack: Vec::new(),
        }
    }

    /// Resolve one component name.
    pub fn resolve(&mut self, name: &str) -> Result<CustomSource, LoadError> {
        if is_document_name(name) {
            let field = self.open(name)?;
            Ok(CustomSource::Circuit(Arc::new(field)))
        } else {
            let source = self.read(name)?;
            let compiled = self.scripts.compile(name, &source)?;
            Ok(CustomSource::Script(compiled))
        }
    }

    /// Open a document as a field named after its path.
    pub fn open(&mut self, path: &str) -> Result<Field, LoadError> {
        if self.stack.iter().any(|p| p == path) {
            return Err(LoadError::Cycle(path.to_string()));
        }
        let text = self.read(path)?;

        self.stack.push(path.to_string());
        let field = self.field_from_document(path, &SaveDocument::parse(&text));
        self.stack.pop();

        Ok(field)
    }

    /// Build a field from a document, registering every component it names.
    ///
    /// Names that fail to resolve are registered as unresolved so their cells
    /// survive a later save; the builder reports them as issues.
    pub fn field_from_document(&mut self, name: &str, doc: &SaveDocument) -> Field {
        let mut field = Field::new(name, doc.width, doc.height);
        let mut remap = Vec::new();

        for (saved, component) in doc.custom_codes() {
            let source = match self.resolve(component) {
                Ok(source) => source,
                Err(e) => {
                    warn!(document = name, component, error = %e, "unresolved custom component");
                    CustomSource::Unresolved { reason: e.to_string() }
                }
            };
            let code = field.registry().write().register(component, source);
            debug!(document = name, component, saved = saved.raw(), code = code.raw(), "custom component mapped");
            remap.push((saved, code));
        }

        for entry in &doc.blocks {
            let code = if entry.block.is_custom() {
                match remap.iter().find(|(saved, _)| *saved == entry.block) {
                    Some(&(_, code)) => code,
                    None => {
                        warn!(document = name, code = entry.block.raw(), "custom code without a name, dropped");
                        BlockCode::NONE
                    }
                }
            } else {
                entry.block
            };
            field.grid_mut().set(entry.pos, code);
        }

        field
    }

    fn read(&self, name: &str) -> Result<String, LoadError> {
        self.files.read_text(name).map_err(|source| LoadError::Io {
            name: name.to_string(),
            source,
        })
    }
}
