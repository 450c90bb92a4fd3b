//! Diagnostic severity levels.

use crate::code::Category;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How bad a diagnostic is. A single error fails the run; warnings are
/// reported and generation output is still written.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// Generation succeeded but the output may not be what was meant.
    Warning,
    /// Loading or generation cannot proceed.
    Error,
}

impl Severity {
    /// The code category diagnostics of this severity are numbered in.
    pub fn category(self) -> Category {
        match self {
            Severity::Warning => Category::Warning,
            Severity::Error => Category::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}
