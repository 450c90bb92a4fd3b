//! Configuration types deserialized from `regforge.toml`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegforgeConfig {
    /// Generation settings.
    #[serde(default)]
    pub generate: GenerateConfig,
    /// Settings of the multiplexed register-control backend.
    #[serde(default)]
    pub regctrl: RegctrlConfig,
}

/// Which generator lowers the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Generic bus-protocol backend (Wishbone).
    Generic,
    /// Multiplexed register-control backend.
    Regctrl,
}

impl Backend {
    /// Keyword used in configuration and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Backend::Generic => "generic",
            Backend::Regctrl => "regctrl",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generic" => Ok(Backend::Generic),
            "regctrl" => Ok(Backend::Regctrl),
            _ => Err(format!("unknown backend '{s}' (expected generic or regctrl)")),
        }
    }
}

/// `[generate]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateConfig {
    /// Backend to use; by default it follows the bus of the map.
    #[serde(default)]
    pub backend: Option<Backend>,
    /// Module name; by default derived from the map name.
    #[serde(default)]
    pub module: Option<String>,
    /// Run the width checker on the generated module.
    #[serde(default = "default_true")]
    pub check_widths: bool,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        GenerateConfig {
            backend: None,
            module: None,
            check_widths: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// `[regctrl]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegctrlConfig {
    /// Library holding the register IP.
    pub library: String,
    /// Prefix of the generated module name.
    pub module_prefix: String,
    /// Prefix of the package holding the mask constants.
    pub memmap_prefix: String,
    /// Configuration binding of `CtrlRegN`.
    pub ctrlregn_binding: String,
    /// Configuration binding of `RMWReg`.
    pub rmwreg_binding: String,
}

impl Default for RegctrlConfig {
    fn default() -> Self {
        RegctrlConfig {
            library: "CommonVisual".to_string(),
            module_prefix: "RegCtrl_".to_string(),
            memmap_prefix: "MemMap_".to_string(),
            ctrlregn_binding: "CommonVisual.CtrlRegN(V1)".to_string(),
            rmwreg_binding: "CommonVisual.RMWReg(RMWReg)".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parse() {
        assert_eq!("generic".parse::<Backend>(), Ok(Backend::Generic));
        assert_eq!("regctrl".parse::<Backend>(), Ok(Backend::Regctrl));
        assert!("vhdl".parse::<Backend>().is_err());
        assert_eq!(Backend::Regctrl.to_string(), "regctrl");
    }

    #[test]
    fn regctrl_defaults() {
        let r = RegctrlConfig::default();
        assert_eq!(r.library, "CommonVisual");
        assert_eq!(r.module_prefix, "RegCtrl_");
        assert_eq!(r.memmap_prefix, "MemMap_");
    }
}
