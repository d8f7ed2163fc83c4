//! File Collaborator
//!
//! The engine never touches storage on its own. Documents and script sources
//! come in as text through a [`FileSource`] and saved documents go back out
//! the same way. Paths are opaque names; how they map to storage is up to
//! the implementation.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

/// Text storage used for documents and script sources.
pub trait FileSource: Send + Sync {
    fn read_text(&self, path: &str) -> io::Result<String>;
    fn write_text(&self, path: &str, content: &str) -> io::Result<()>;
}

/// Files under a root directory.
#[derive(Debug, Clone)]
pub struct FsFiles {
    root: PathBuf,
}

impl FsFiles {
    /// Create a file source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileSource for FsFiles {
    fn read_text(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(self.root.join(path))
    }

    fn write_text(&self, path: &str, content: &str) -> io::Result<()> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full, content)
    }
}

/// In-memory files, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryFiles {
    files: RwLock<HashMap<String, String>>,
}

impl MemoryFiles {
    /// Create an empty file set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&self, path: impl Into<String>, content: impl Into<String>) {
        self.files.write().insert(path.into(), content.into());
    }

    /// Check whether a file exists.
    pub fn contains(&self, path: &str) -> bool {
        self.files.read().contains_key(path)
    }
}

impl FileSource for MemoryFiles {
    fn read_text(&self, path: &str) -> io::Result<String> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{path} not found")))
    }

    fn write_text(&self, path: &str, content: &str) -> io::Result<()> {
        self.insert(path, content);
        Ok(())
    }
}
