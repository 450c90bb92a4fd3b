//! Diagnostic codes and helpers for loading and generation errors.
//!
//! Codes `E101`--`E109` cover register-map problems found while loading,
//! `E201`--`E206` cover maps a backend cannot lower, and `E301` reports an
//! internally inconsistent module. Warning codes `W201`--`W202` flag
//! descriptions that generate but probably not as intended.

use regforge_diagnostics::{Category, Diagnostic, DiagnosticCode};
use regforge_ir::WidthError;
use regforge_tree::{Access, ExtError, TreeError};
use thiserror::Error;

/// The register-map file cannot be read.
pub const E101: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 101,
};

/// The register-map file is not a valid description.
pub const E102: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 102,
};

/// Unknown bus name.
pub const E103: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 103,
};

/// Word size is not a power of two.
pub const E104: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 104,
};

/// Bad field list (missing, out of range, overlapping, misnamed).
pub const E105: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 105,
};

/// Register does not fit in its words.
pub const E106: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 106,
};

/// Element misplaced in its container.
pub const E107: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 107,
};

/// Malformed array.
pub const E108: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 108,
};

/// Malformed `x-hdl` or `x-gena` extension.
pub const E109: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 109,
};

/// Layout the address decoder cannot express.
pub const E201: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 201,
};

/// Register storage requested for a register the bus never writes.
pub const E202: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 202,
};

/// Unknown register template requested by `x-gena`.
pub const E203: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 203,
};

/// Register width does not split evenly across its words.
pub const E204: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 204,
};

/// Read-modify-write register too wide for the data bus.
pub const E205: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 205,
};

/// Decoded area too small or misaligned.
pub const E206: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 206,
};

/// Generated module fails the width check.
pub const E301: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 301,
};

/// Constant field without a preset.
pub const W201: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 201,
};

/// Register-level `x-hdl` on a register with several fields.
pub const W202: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 202,
};

/// A fatal generation error.
#[derive(Debug, Error)]
pub enum GenError {
    /// The decoder cannot lower the elements of a container.
    #[error("unsupported layout: {reason}")]
    Layout {
        /// Container path.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// `x-hdl` asks for register storage on a register the bus never writes.
    #[error("register storage is not allowed on a '{access}' register")]
    StorageNotAllowed {
        /// Field path.
        path: String,
        /// Register access.
        access: Access,
    },

    /// A bad `x-gena` extension.
    #[error("{source}")]
    Template {
        /// Register path.
        path: String,
        /// What was wrong.
        #[source]
        source: ExtError,
    },

    /// Register width is not a multiple of its word count.
    #[error("{width}-bit register cannot be split evenly over {nwords} words")]
    WordSplit {
        /// Register path.
        path: String,
        /// Register width.
        width: u32,
        /// Number of words.
        nwords: u32,
    },

    /// Read-modify-write data (value and mask) does not fit on the data bus.
    #[error("read-modify-write register needs {needed} data bits, the bus has {word_bits}")]
    RmwTooWide {
        /// Register path.
        path: String,
        /// Data bits needed.
        needed: u32,
        /// Bus width.
        word_bits: u32,
    },

    /// A nested block is smaller than a bus word or not aligned on its own
    /// size, so its address bits cannot select it.
    #[error("block of {size:#x} bytes at {address:#x} is below a bus word or misaligned")]
    Area {
        /// Area path.
        path: String,
        /// Area address relative to its parent.
        address: u64,
        /// Area size in bytes.
        size: u64,
    },

    /// The generated module is not width consistent.
    #[error("generated module '{module}' has {} width error(s)", errors.len())]
    Inconsistent {
        /// Module name.
        module: String,
        /// Every problem found.
        errors: Vec<WidthError>,
    },
}

impl GenError {
    /// Diagnostic code of the error.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            GenError::Layout { .. } => E201,
            GenError::StorageNotAllowed { .. } => E202,
            GenError::Template { .. } => E203,
            GenError::WordSplit { .. } => E204,
            GenError::RmwTooWide { .. } => E205,
            GenError::Area { .. } => E206,
            GenError::Inconsistent { .. } => E301,
        }
    }

    /// Path of the node the error is about.
    pub fn path(&self) -> Option<&str> {
        match self {
            GenError::Layout { path, .. }
            | GenError::StorageNotAllowed { path, .. }
            | GenError::Template { path, .. }
            | GenError::WordSplit { path, .. }
            | GenError::RmwTooWide { path, .. }
            | GenError::Area { path, .. } => Some(path.as_str()),
            GenError::Inconsistent { module, .. } => Some(module.as_str()),
        }
    }
}

/// Conversion of an error into a renderable [`Diagnostic`].
pub trait ToDiagnostic {
    /// Builds the diagnostic.
    fn to_diagnostic(&self) -> Diagnostic;
}

fn tree_code(err: &TreeError) -> DiagnosticCode {
    match err {
        TreeError::Io { .. } => E101,
        TreeError::Parse(_) => E102,
        TreeError::UnsupportedBus { .. } => E103,
        TreeError::BadWordSize { .. } => E104,
        TreeError::NoFields { .. }
        | TreeError::AnonymousField { .. }
        | TreeError::FieldRange { .. }
        | TreeError::FieldOverlap { .. } => E105,
        TreeError::RegWidth { .. } => E106,
        TreeError::Misaligned { .. }
        | TreeError::AddressOverlap { .. }
        | TreeError::OutOfBounds { .. }
        | TreeError::BlockBits { .. } => E107,
        TreeError::ArrayElement { .. } | TreeError::ArrayWidth { .. } => E108,
        TreeError::Extension { .. } => E109,
    }
}

impl ToDiagnostic for TreeError {
    fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(tree_code(self), self.to_string());
        if let Some(path) = self.path() {
            diag = diag.at(path);
        }
        match self {
            TreeError::UnsupportedBus { .. } => {
                diag.with_help("supported buses are 'wb-32-be' and 'cern-be-vme-<width>'")
            }
            TreeError::Extension { .. } => {
                diag.with_note("x-hdl accepts 'type' (wire or reg) and 'write-strobe'")
            }
            _ => diag,
        }
    }
}

impl ToDiagnostic for GenError {
    fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code(), self.to_string());
        if let Some(path) = self.path() {
            diag = diag.at(path);
        }
        match self {
            GenError::StorageNotAllowed { .. } => {
                diag.with_help("remove the 'type' hint or make the register writable")
            }
            GenError::Template { .. } => diag.with_note("x-gena 'type' accepts only 'rmw'"),
            GenError::Inconsistent { errors, .. } => errors
                .iter()
                .fold(diag, |d, e| d.with_note(e.to_string())),
            _ => diag,
        }
    }
}

/// Creates a W201 diagnostic for a constant field without a preset.
pub fn warn_constant_without_preset(path: &str) -> Diagnostic {
    Diagnostic::warning(W201, "constant field has no preset; it reads as zero")
        .at(path)
        .with_help("add a 'preset' value")
}

/// Creates a W202 diagnostic for register-level `x-hdl` on a register with
/// several fields.
pub fn warn_register_hints_ignored(path: &str, fields: usize) -> Diagnostic {
    Diagnostic::warning(
        W202,
        format!("register-level x-hdl is ignored on a register with {fields} fields"),
    )
    .at(path)
    .with_help("move the hints to the fields")
}
