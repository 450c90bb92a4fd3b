//! Module ports.

use crate::SignalId;
use serde::{Deserialize, Serialize};

/// Direction of a port on the module boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Data flows into the module.
    Input,
    /// Data flows out of the module.
    Output,
}

/// A port of a module's interface, backed by a signal of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Port name.
    pub name: String,
    /// Direction of data flow.
    pub direction: PortDirection,
    /// Vector width, or `None` for a scalar.
    pub width: Option<u32>,
    /// Index of the least significant bit.
    pub lo: u32,
    /// Comment rendered next to the declaration.
    pub comment: Option<String>,
    /// The backing signal.
    pub signal: SignalId,
}
