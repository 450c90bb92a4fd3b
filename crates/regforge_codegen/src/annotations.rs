//! Per-node records of what a backend generated.
//!
//! The register map stays immutable during generation; the signals created
//! for each node are remembered here, keyed by [`NodeId`].

use regforge_ir::SignalId;
use regforge_tree::{NodeId, SideTable};
use serde::{Deserialize, Serialize};

/// Signals generated for a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldHandles {
    /// Input port carrying the value the bus reads.
    pub input: Option<SignalId>,
    /// Output port carrying the written value.
    pub output: Option<SignalId>,
    /// Write strobe output.
    pub strobe: Option<SignalId>,
    /// Register holding the written value.
    pub storage: Option<SignalId>,
}

/// Signals and instances generated for a register.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegHandles {
    /// Signal holding the whole register value.
    pub value: Option<SignalId>,
    /// Per-word write selects, word 0 first.
    pub write_selects: Vec<SignalId>,
    /// Labels of the register instances, word 0 first.
    pub instances: Vec<String>,
}

/// Ports generated for an array (memory) interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayHandles {
    /// Entry address output.
    pub address: SignalId,
    /// Read data input.
    pub read_data: Option<SignalId>,
    /// Write data output.
    pub write_data: Option<SignalId>,
    /// Select output.
    pub select: Option<SignalId>,
    /// Read request output.
    pub read_strobe: Option<SignalId>,
    /// Write request (or write pulse) output.
    pub write_strobe: Option<SignalId>,
    /// Read completion input.
    pub read_done: Option<SignalId>,
    /// Write completion input.
    pub write_done: Option<SignalId>,
}

/// Everything a backend recorded about the nodes it lowered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotations {
    /// Field signals.
    pub fields: SideTable<NodeId, FieldHandles>,
    /// Register signals.
    pub regs: SideTable<NodeId, RegHandles>,
    /// Array interfaces.
    pub arrays: SideTable<NodeId, ArrayHandles>,
}
