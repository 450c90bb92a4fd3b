//! Serde model of a laid-out register map, as produced by the layout pass.
//!
//! All addresses are byte addresses relative to the enclosing container.

use crate::ext::Extensions;
use crate::node::Access;
use serde::{Deserialize, Serialize};

/// The root of a laid-out register map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootDesc {
    /// Name of the map; becomes the module name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Selected bus kind (e.g. `wb-32-be`).
    pub bus: String,
    /// Bus word size in bytes.
    pub word_size: u32,
    /// Whether decode failures are reported as bus errors.
    #[serde(default)]
    pub bus_error: bool,
    /// Size of the whole map in bytes.
    pub size: u64,
    /// Number of sub-block selector bits.
    #[serde(default)]
    pub sel_bits: u32,
    /// Number of address bits below the sub-block selector.
    pub blk_bits: u32,
    /// Child elements.
    #[serde(default)]
    pub elements: Vec<ElementDesc>,
}

/// A child element of a container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ElementDesc {
    /// A named group of elements.
    Block(BlockDesc),
    /// A memory region.
    Array(ArrayDesc),
    /// A register.
    Reg(RegDesc),
}

/// A named composite element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDesc {
    /// Element name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Byte address relative to the parent.
    pub address: u64,
    /// Size in bytes.
    pub size: u64,
    /// Number of sub-block selector bits.
    #[serde(default)]
    pub sel_bits: u32,
    /// Number of address bits below the sub-block selector.
    pub blk_bits: u32,
    /// Child elements.
    #[serde(default)]
    pub elements: Vec<ElementDesc>,
}

/// A repeated memory region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayDesc {
    /// Element name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Byte address relative to the parent.
    pub address: u64,
    /// Size in bytes.
    pub size: u64,
    /// Number of word-address bits selecting an entry.
    pub sel_bits: u32,
    /// The per-entry data shape; must hold exactly one register.
    #[serde(default)]
    pub elements: Vec<ElementDesc>,
}

/// A register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegDesc {
    /// Element name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Bus access mode.
    pub access: Access,
    /// Resolved width in bits.
    pub width: u32,
    /// Number of bus words the register spans.
    #[serde(default = "default_nwords")]
    pub nwords: u32,
    /// Byte address relative to the parent.
    #[serde(default)]
    pub address: u64,
    /// Bit fields.
    #[serde(default)]
    pub fields: Vec<FieldDesc>,
    /// HDL generation hints.
    #[serde(default)]
    pub x_hdl: Extensions,
    /// Register-control generation hints.
    #[serde(default)]
    pub x_gena: Extensions,
}

fn default_nwords() -> u32 {
    1
}

/// A bit field of a register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDesc {
    /// Field name; absent for the single field of a plain register.
    #[serde(default)]
    pub name: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Lowest bit.
    pub lo: u32,
    /// Highest bit; absent for a single-bit field.
    #[serde(default)]
    pub hi: Option<u32>,
    /// Reset value.
    #[serde(default)]
    pub preset: Option<u64>,
    /// HDL generation hints.
    #[serde(default)]
    pub x_hdl: Extensions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_reg() {
        let json = r#"{"kind": "reg", "name": "ctrl", "access": "rw", "width": 8,
                       "fields": [{"lo": 0, "hi": 7}]}"#;
        let el: ElementDesc = serde_json::from_str(json).unwrap();
        match el {
            ElementDesc::Reg(r) => {
                assert_eq!(r.nwords, 1);
                assert_eq!(r.address, 0);
                assert_eq!(r.access, Access::Rw);
                assert_eq!(r.fields[0].hi, Some(7));
                assert!(r.fields[0].name.is_none());
                assert!(r.x_hdl.is_empty());
            }
            other => panic!("expected reg, got {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let json = r#"{"kind": "submap", "name": "x"}"#;
        assert!(serde_json::from_str::<ElementDesc>(json).is_err());
    }

    #[test]
    fn unknown_access_is_rejected() {
        let json = r#"{"kind": "reg", "name": "r", "access": "rc", "width": 8}"#;
        assert!(serde_json::from_str::<ElementDesc>(json).is_err());
    }
}
