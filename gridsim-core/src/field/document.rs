//! Save Documents
//!
//! The persisted form of a field:
//!
//! ```json
//! {
//!   "width": 16, "height": 8,
//!   "blocks": [{"pos": {"x": 0, "y": 0}, "block": 3}],
//!   "components": {"15": "half_adder.json"}
//! }
//! ```
//!
//! `blocks` lists only non-empty cells. `components` maps the custom codes
//! used by those blocks to the names that resolve them again on load; the
//! loader remaps every saved code to whatever the destination registry
//! hands out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::grid::{BlockCode, Pos};

/// One non-empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEntry {
    pub pos: Pos,
    pub block: BlockCode,
}

/// Serialized field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDocument {
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub blocks: Vec<BlockEntry>,
    /// Custom code (as a decimal string) → component name.
    #[serde(default)]
    pub components: BTreeMap<String, String>,
}

impl SaveDocument {
    /// Decode a document. Malformed text yields the empty document.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "malformed save document, using an empty one");
                Self::default()
            }
        }
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Custom codes with their names. Keys that are not numbers are skipped.
    pub fn custom_codes(&self) -> impl Iterator<Item = (BlockCode, &str)> + '_ {
        self.components.iter().filter_map(|(key, name)| match key.parse::<u32>() {
            Ok(raw) => Some((BlockCode(raw), name.as_str())),
            Err(_) => {
                warn!(key = %key, "ignoring non-numeric component code");
                None
            }
        })
    }
}
