//! Block Codes
//!
//! Every grid cell stores a small integer describing its role. Built-in codes
//! are fixed and persisted as-is; codes from [`BlockCode::FIRST_CUSTOM`]
//! upward index the custom entries of a [`ComponentRegistry`].
//!
//! [`ComponentRegistry`]: crate::registry::ComponentRegistry

use serde::{Deserialize, Serialize};

/// Integer tag of a grid cell's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockCode(pub u32);

impl BlockCode {
    pub const NONE: BlockCode = BlockCode(0);
    pub const WIRE: BlockCode = BlockCode(1);
    pub const IN: BlockCode = BlockCode(2);
    pub const OUT: BlockCode = BlockCode(3);
    pub const CLOCK_IN: BlockCode = BlockCode(4);
    pub const CROSS: BlockCode = BlockCode(5);
    pub const AND: BlockCode = BlockCode(6);
    pub const OR: BlockCode = BlockCode(7);
    pub const XOR: BlockCode = BlockCode(8);
    pub const NOT: BlockCode = BlockCode(9);
    pub const BATTERY: BlockCode = BlockCode(10);
    pub const CLOCK: BlockCode = BlockCode(11);
    pub const FLIP_FLOP: BlockCode = BlockCode(12);
    pub const BUTTON: BlockCode = BlockCode(13);
    pub const DISPLAY: BlockCode = BlockCode(14);

    /// The first code handed out to registered custom components.
    pub const FIRST_CUSTOM: BlockCode = BlockCode(15);

    /// Code of the `index`-th custom registry entry.
    pub const fn custom(index: usize) -> Self {
        Self(Self::FIRST_CUSTOM.0 + index as u32)
    }

    /// Registry index of a custom code.
    pub fn custom_index(self) -> Option<usize> {
        self.0.checked_sub(Self::FIRST_CUSTOM.0).map(|i| i as usize)
    }

    /// Get the raw integer code.
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Check whether the cell is empty.
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Check whether the cell is a wire.
    pub fn is_wire(self) -> bool {
        self == Self::WIRE
    }

    /// In, out and clock-in cells: always singleton connectors.
    pub fn is_boundary(self) -> bool {
        matches!(self, Self::IN | Self::OUT | Self::CLOCK_IN)
    }

    /// Check whether the cell is a cross.
    pub fn is_cross(self) -> bool {
        self == Self::CROSS
    }

    /// Check whether the code indexes the custom registry.
    pub fn is_custom(self) -> bool {
        self >= Self::FIRST_CUSTOM
    }

    /// Check whether the code is one of the fixed built-ins.
    pub fn is_builtin(self) -> bool {
        !self.is_custom()
    }

    /// Display name of a built-in code.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::NONE => "none",
            Self::WIRE => "wire",
            Self::IN => "in",
            Self::OUT => "out",
            Self::CLOCK_IN => "clock-in",
            Self::CROSS => "cross",
            Self::AND => "and",
            Self::OR => "or",
            Self::XOR => "xor",
            Self::NOT => "not",
            Self::BATTERY => "battery",
            Self::CLOCK => "clock",
            Self::FLIP_FLOP => "flip-flop",
            Self::BUTTON => "button",
            Self::DISPLAY => "display",
            _ => return None,
        };
        Some(name)
    }
}

impl From<u32> for BlockCode {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for BlockCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "custom#{}", self.0),
        }
    }
}
