//! Declarations of externally supplied components.

use crate::port::PortDirection;
use serde::{Deserialize, Serialize};

/// Integer subtype of a component parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    /// Any integer.
    Integer,
    /// Non-negative integer.
    Natural,
}

/// A parameter of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentParam {
    /// Parameter name.
    pub name: String,
    /// Subtype.
    pub kind: ParamKind,
    /// Value used when an instance does not bind the parameter.
    pub default: i64,
}

/// Width of a component port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortWidth {
    /// A scalar bit.
    Bit,
    /// A vector of `scale × param` bits.
    Param {
        /// Parameter name.
        param: String,
        /// Multiplier.
        scale: u32,
    },
}

/// A port of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentPort {
    /// Port name.
    pub name: String,
    /// Direction.
    pub direction: PortDirection,
    /// Width.
    pub width: PortWidth,
}

/// A component declaration, placed ahead of all statements of the module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDecl {
    /// Component name.
    pub name: String,
    /// Parameters.
    pub params: Vec<ComponentParam>,
    /// Ports.
    pub ports: Vec<ComponentPort>,
    /// Configuration binding (e.g. `CommonVisual.CtrlRegN(V1)`).
    pub binding: Option<String>,
}

impl ComponentDecl {
    /// Looks up a port by name.
    pub fn port(&self, name: &str) -> Option<&ComponentPort> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Value of `param` for an instance binding `params`, falling back to the
    /// declared default.
    pub fn param_value(&self, param: &str, params: &[(String, i64)]) -> Option<i64> {
        params
            .iter()
            .find(|(n, _)| n == param)
            .map(|(_, v)| *v)
            .or_else(|| self.params.iter().find(|p| p.name == param).map(|p| p.default))
    }

    /// Resolved width of `port` on an instance binding `params`. `None` when
    /// the port or its parameter is unknown.
    pub fn port_width(&self, port: &str, params: &[(String, i64)]) -> Option<u32> {
        match &self.port(port)?.width {
            PortWidth::Bit => Some(1),
            PortWidth::Param { param, scale } => {
                let n = self.param_value(param, params)?;
                u32::try_from(n).ok().map(|n| n * scale)
            }
        }
    }
}
