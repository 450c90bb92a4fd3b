//! Single-bit constant values as they appear in generated hardware.

use serde::{Deserialize, Serialize};

/// A driven single-bit value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Logic {
    /// Logic low (0).
    Zero,
    /// Logic high (1).
    One,
}

impl From<bool> for Logic {
    fn from(b: bool) -> Self {
        if b {
            Logic::One
        } else {
            Logic::Zero
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bool() {
        assert_eq!(Logic::from(true), Logic::One);
        assert_eq!(Logic::from(false), Logic::Zero);
    }

    #[test]
    fn serializes_by_name() {
        assert_eq!(serde_json::to_string(&Logic::One).unwrap(), r#""One""#);
    }
}
