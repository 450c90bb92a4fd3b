//! Signal definitions.

use serde::{Deserialize, Serialize};

/// Storage semantics of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Combinationally driven.
    Wire,
    /// Assigned in a clocked process.
    Reg,
    /// Backs a module port.
    Port,
}

/// A named signal of a module.
///
/// `width: None` is a scalar bit; `Some(n)` is an `n`-bit vector whose bits
/// are numbered `lo .. lo + n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// Signal name.
    pub name: String,
    /// Vector width, or `None` for a scalar.
    pub width: Option<u32>,
    /// Index of the least significant bit.
    pub lo: u32,
    /// Storage kind.
    pub kind: SignalKind,
}

impl Signal {
    /// Number of bits (1 for a scalar).
    pub fn bit_width(&self) -> u32 {
        self.width.unwrap_or(1)
    }

    /// Whether the signal is a vector (even of a single bit).
    pub fn is_vector(&self) -> bool {
        self.width.is_some()
    }
}
