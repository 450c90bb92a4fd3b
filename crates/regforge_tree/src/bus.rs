//! Bus kinds a register map can select.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The bus protocol selected by the root of a register map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusKind {
    /// Classic Wishbone, 32-bit data, big-endian (`wb-32-be`).
    WbClassic32Be,
    /// CERN BE VME-style strobe bus (`cern-be-vme`), optionally suffixed with
    /// the data width (`cern-be-vme-16`, `cern-be-vme-32`, ...).
    CernBeVme,
}

impl BusKind {
    /// The name used in register-map descriptions.
    pub fn name(self) -> &'static str {
        match self {
            BusKind::WbClassic32Be => "wb-32-be",
            BusKind::CernBeVme => "cern-be-vme",
        }
    }
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BusKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wb-32-be" => Ok(BusKind::WbClassic32Be),
            "cern-be-vme" => Ok(BusKind::CernBeVme),
            _ => match s.strip_prefix("cern-be-vme-") {
                Some(width) if width.parse::<u32>().is_ok() => Ok(BusKind::CernBeVme),
                _ => Err(s.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_kinds() {
        assert_eq!("wb-32-be".parse::<BusKind>(), Ok(BusKind::WbClassic32Be));
        assert_eq!("cern-be-vme".parse::<BusKind>(), Ok(BusKind::CernBeVme));
        assert_eq!("cern-be-vme-16".parse::<BusKind>(), Ok(BusKind::CernBeVme));
    }

    #[test]
    fn parse_unknown_kind_keeps_name() {
        assert_eq!("axi4-lite-32".parse::<BusKind>(), Err("axi4-lite-32".to_string()));
        assert!("cern-be-vme-wide".parse::<BusKind>().is_err());
    }

    #[test]
    fn display_is_description_name() {
        assert_eq!(BusKind::WbClassic32Be.to_string(), "wb-32-be");
    }
}
