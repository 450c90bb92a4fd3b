//! Stable diagnostic codes (`E101`, `W202`, ...).
//!
//! The hundreds digit names the stage that produced the diagnostic, see
//! [`Stage`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix letter of a code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// `E`
    Error,
    /// `W`
    Warning,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
        }
    }
}

/// Pipeline stage a code belongs to.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Stage {
    /// `1xx`: reading and validating the register map.
    Load,
    /// `2xx`: lowering a map with a backend.
    Generate,
    /// `3xx`: checking the generated IR.
    Consistency,
    /// Any other number.
    Other,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Load => "load",
            Stage::Generate => "generate",
            Stage::Consistency => "consistency",
            Stage::Other => "other",
        })
    }
}

/// A diagnostic code: category letter plus a three-digit number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The number within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }

    /// The stage encoded in the hundreds digit.
    pub fn stage(self) -> Stage {
        match self.number / 100 {
            1 => Stage::Load,
            2 => Stage::Generate,
            3 => Stage::Consistency,
            _ => Stage::Other,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_pads_to_three_digits() {
        assert_eq!(DiagnosticCode::new(Category::Error, 101).to_string(), "E101");
        assert_eq!(DiagnosticCode::new(Category::Warning, 3).to_string(), "W003");
    }

    #[test]
    fn stage_from_hundreds() {
        assert_eq!(DiagnosticCode::new(Category::Error, 104).stage(), Stage::Load);
        assert_eq!(DiagnosticCode::new(Category::Warning, 201).stage(), Stage::Generate);
        assert_eq!(DiagnosticCode::new(Category::Error, 301).stage(), Stage::Consistency);
        assert_eq!(DiagnosticCode::new(Category::Error, 7).stage(), Stage::Other);
    }

    #[test]
    fn serializes_as_struct() {
        let code = DiagnosticCode::new(Category::Error, 201);
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, r#"{"category":"Error","number":201}"#);
    }
}
