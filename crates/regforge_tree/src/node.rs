//! Arena nodes of a validated register map.

use crate::bus::BusKind;
use crate::ext::{Extensions, HdlHints};
use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bus access mode of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// Read-only: the value comes from the user logic.
    Ro,
    /// Write-only.
    Wo,
    /// Read-write.
    Rw,
    /// Constant: reads return the preset.
    Cst,
}

impl Access {
    /// Whether a bus read returns something.
    pub fn is_readable(self) -> bool {
        !matches!(self, Access::Wo)
    }

    /// Whether a bus write has an effect.
    pub fn is_writable(self) -> bool {
        matches!(self, Access::Wo | Access::Rw)
    }

    /// Lower-case keyword used in descriptions.
    pub fn name(self) -> &'static str {
        match self {
            Access::Ro => "ro",
            Access::Wo => "wo",
            Access::Rw => "rw",
            Access::Cst => "cst",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node of the register map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node name. A nameless field carries the name of its register.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Enclosing node; `None` only for the root.
    pub parent: Option<NodeId>,
    /// Kind-specific data.
    pub kind: NodeKind,
}

/// Kind-specific node data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// The top of the map.
    Root(Root),
    /// A named group of elements.
    Block(Block),
    /// A memory region.
    Array(Array),
    /// A register.
    Reg(Reg),
    /// A bit field of a register.
    Field(Field),
}

/// Data of the root node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Root {
    /// Selected bus.
    pub bus: BusKind,
    /// Bus word size in bytes.
    pub word_size: u32,
    /// Whether decode failures raise bus errors.
    pub bus_error: bool,
    /// Size in bytes.
    pub size: u64,
    /// Sub-block selector bits.
    pub sel_bits: u32,
    /// Address bits below the selector.
    pub blk_bits: u32,
    /// Child elements in address order.
    pub children: Vec<NodeId>,
}

/// Data of a block node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Byte address relative to the parent.
    pub address: u64,
    /// Size in bytes.
    pub size: u64,
    /// Sub-block selector bits.
    pub sel_bits: u32,
    /// Address bits below the selector.
    pub blk_bits: u32,
    /// Child elements in address order.
    pub children: Vec<NodeId>,
}

/// Data of an array node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Array {
    /// Byte address relative to the parent.
    pub address: u64,
    /// Size in bytes.
    pub size: u64,
    /// Word-address bits selecting an entry.
    pub sel_bits: u32,
    /// The register describing one entry.
    pub element: NodeId,
}

impl Array {
    /// Last byte address covered by the array, relative to the parent.
    pub fn end(&self) -> u64 {
        self.address + self.size.saturating_sub(1)
    }
}

/// Data of a register node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reg {
    /// Bus access mode.
    pub access: Access,
    /// Width in bits.
    pub width: u32,
    /// Number of bus words spanned.
    pub nwords: u32,
    /// Byte address relative to the parent.
    pub address: u64,
    /// Fields ordered by `lo`.
    pub fields: Vec<NodeId>,
    /// HDL generation hints.
    pub x_hdl: Extensions,
    /// Register-control generation hints.
    pub x_gena: Extensions,
}

/// Data of a field node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Lowest bit.
    pub lo: u32,
    /// Highest bit; `None` for a scalar field.
    pub hi: Option<u32>,
    /// Reset value.
    pub preset: Option<u64>,
    /// HDL generation hints as written on the field.
    pub x_hdl: Extensions,
    /// Decoded hints, including those inherited from a single-field register.
    pub hints: HdlHints,
    /// `true` when the field had no name and stands for the whole register.
    pub anonymous: bool,
}

impl Field {
    /// Width in bits.
    pub fn width(&self) -> u32 {
        match self.hi {
            Some(hi) => hi - self.lo + 1,
            None => 1,
        }
    }

    /// Highest bit covered.
    pub fn msb(&self) -> u32 {
        self.hi.unwrap_or(self.lo)
    }

    /// Whether the field is a single bit declared without `hi`.
    pub fn is_scalar(&self) -> bool {
        self.hi.is_none()
    }
}
