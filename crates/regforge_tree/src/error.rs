//! Errors raised while loading and validating a register map.

use crate::ext::ExtError;
use thiserror::Error;

/// A fatal problem with the register-map description.
///
/// Every structural variant names the dotted path of the offending node.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The description file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The description is not valid JSON or does not match the schema.
    #[error("malformed register map: {0}")]
    Parse(#[from] serde_json::Error),

    /// The bus name is not one the generators know.
    #[error("unsupported bus '{bus}'")]
    UnsupportedBus {
        /// Root path.
        path: String,
        /// Bus name as written.
        bus: String,
    },

    /// The word size is not a power of two number of bytes.
    #[error("word size {word_size} is not a power of two")]
    BadWordSize {
        /// Root path.
        path: String,
        /// Word size in bytes.
        word_size: u32,
    },

    /// A register has no fields.
    #[error("register has no fields")]
    NoFields {
        /// Register path.
        path: String,
    },

    /// A nameless field shares its register with other fields.
    #[error("a nameless field must be the only field of its register")]
    AnonymousField {
        /// Register path.
        path: String,
    },

    /// A field lies outside its register or has `hi < lo`.
    #[error("field bits [{hi}:{lo}] do not fit in a {width}-bit register")]
    FieldRange {
        /// Field path.
        path: String,
        /// Low bit.
        lo: u32,
        /// High bit.
        hi: u32,
        /// Register width.
        width: u32,
    },

    /// Two fields share bits.
    #[error("field overlaps '{other}'")]
    FieldOverlap {
        /// Field path.
        path: String,
        /// Name of the field it overlaps.
        other: String,
    },

    /// A register does not fit in its words.
    #[error("{width}-bit register does not fit in {nwords} word(s) of {word_bits} bits")]
    RegWidth {
        /// Register path.
        path: String,
        /// Register width.
        width: u32,
        /// Number of words.
        nwords: u32,
        /// Word width.
        word_bits: u32,
    },

    /// An element's address is not word aligned.
    #[error("address {address:#x} is not aligned on the {word_size}-byte bus word")]
    Misaligned {
        /// Element path.
        path: String,
        /// Byte address.
        address: u64,
        /// Word size in bytes.
        word_size: u32,
    },

    /// Two siblings overlap in address space.
    #[error("address range overlaps '{other}'")]
    AddressOverlap {
        /// Element path.
        path: String,
        /// Name of the overlapped sibling.
        other: String,
    },

    /// An element lies (partly) beyond the end of its container.
    #[error("element ends at {end:#x}, beyond the container size {size:#x}")]
    OutOfBounds {
        /// Element path.
        path: String,
        /// Last byte address used.
        end: u64,
        /// Container size.
        size: u64,
    },

    /// A multiplexed container whose sub-blocks are smaller than a bus word
    /// or too large to address.
    #[error("sub-blocks of 2^{blk_bits} bytes cannot be decoded with {word_size}-byte bus words")]
    BlockBits {
        /// Container path.
        path: String,
        /// Sub-block address bits.
        blk_bits: u32,
        /// Bus word size in bytes.
        word_size: u32,
    },

    /// An array does not describe exactly one register entry.
    #[error("array must hold exactly one register element")]
    ArrayElement {
        /// Array path.
        path: String,
    },

    /// An array entry is wider than the bus word.
    #[error("array entry of {width} bits is wider than the {word_bits}-bit bus word")]
    ArrayWidth {
        /// Array path.
        path: String,
        /// Entry width.
        width: u32,
        /// Word width.
        word_bits: u32,
    },

    /// A malformed extension map.
    #[error("{source}")]
    Extension {
        /// Node path.
        path: String,
        /// What was wrong.
        #[source]
        source: ExtError,
    },
}

impl TreeError {
    /// Dotted path (or file path) of the node the error is about.
    pub fn path(&self) -> Option<&str> {
        match self {
            TreeError::Parse(_) => None,
            TreeError::Io { path, .. }
            | TreeError::UnsupportedBus { path, .. }
            | TreeError::BadWordSize { path, .. }
            | TreeError::NoFields { path }
            | TreeError::AnonymousField { path }
            | TreeError::FieldRange { path, .. }
            | TreeError::FieldOverlap { path, .. }
            | TreeError::RegWidth { path, .. }
            | TreeError::Misaligned { path, .. }
            | TreeError::AddressOverlap { path, .. }
            | TreeError::OutOfBounds { path, .. }
            | TreeError::BlockBits { path, .. }
            | TreeError::ArrayElement { path }
            | TreeError::ArrayWidth { path, .. }
            | TreeError::Extension { path, .. } => Some(path.as_str()),
        }
    }
}
