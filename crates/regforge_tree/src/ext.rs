//! Typed views over the free-form `x_hdl` / `x_gena` extension maps.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Raw extension map as found in the description.
pub type Extensions = BTreeMap<String, Value>;

/// Errors decoding an extension map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtError {
    /// A key the generator does not know.
    #[error("unhandled '{key}' in {ext}")]
    UnknownKey {
        /// Extension map name (`x-hdl`, `x-gena`).
        ext: &'static str,
        /// The offending key.
        key: String,
    },
    /// A known key with a value of the wrong type or an unknown keyword.
    #[error("bad value {value} for '{key}' in {ext}, expected {expected}")]
    BadValue {
        /// Extension map name.
        ext: &'static str,
        /// The key.
        key: String,
        /// The value as written.
        value: String,
        /// What was expected.
        expected: &'static str,
    },
}

/// How a field's value is held in the generated design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Storage {
    /// Driven combinationally by user logic or straight to a port.
    Wire,
    /// Held in a register inside the generated module.
    Reg,
}

/// Decoded `x_hdl` hints. Absent values fall back to access-based defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HdlHints {
    /// Explicit storage choice.
    pub storage: Option<Storage>,
    /// Explicit write-strobe request.
    pub write_strobe: Option<bool>,
}

impl HdlHints {
    /// Decodes an `x_hdl` map.
    pub fn parse(ext: &Extensions) -> Result<Self, ExtError> {
        let mut hints = HdlHints::default();
        for (key, value) in ext {
            match key.as_str() {
                "type" => {
                    hints.storage = Some(match value.as_str() {
                        Some("wire") => Storage::Wire,
                        Some("reg") => Storage::Reg,
                        _ => return Err(bad_value("x-hdl", key, value, "\"wire\" or \"reg\"")),
                    })
                }
                "write-strobe" => match value.as_bool() {
                    Some(b) => hints.write_strobe = Some(b),
                    None => return Err(bad_value("x-hdl", key, value, "a boolean")),
                },
                _ => {
                    return Err(ExtError::UnknownKey {
                        ext: "x-hdl",
                        key: key.clone(),
                    })
                }
            }
        }
        Ok(hints)
    }

    /// Combines register-level hints with field-level ones; the field wins.
    pub fn merge(self, field: HdlHints) -> HdlHints {
        HdlHints {
            storage: field.storage.or(self.storage),
            write_strobe: field.write_strobe.or(self.write_strobe),
        }
    }
}

/// Register IP selected by `x_gena.type` for the multiplexed backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegTemplate {
    /// Plain control register with auto-clear mask.
    CtrlRegN,
    /// Read-modify-write register taking a data/mask pair.
    RmwReg,
}

impl RegTemplate {
    /// Decodes the `type` key of an `x_gena` map. Other keys are ignored
    /// because they belong to other generators.
    pub fn parse(ext: &Extensions) -> Result<Self, ExtError> {
        match ext.get("type") {
            None => Ok(RegTemplate::CtrlRegN),
            Some(Value::String(s)) if s == "rmw" => Ok(RegTemplate::RmwReg),
            Some(other) => Err(bad_value("x-gena", "type", other, "\"rmw\"")),
        }
    }

    /// Component name.
    pub fn name(self) -> &'static str {
        match self {
            RegTemplate::CtrlRegN => "CtrlRegN",
            RegTemplate::RmwReg => "RMWReg",
        }
    }
}

fn bad_value(ext: &'static str, key: &str, value: &Value, expected: &'static str) -> ExtError {
    ExtError::BadValue {
        ext,
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ext(v: Value) -> Extensions {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn empty_hints() {
        assert_eq!(HdlHints::parse(&Extensions::new()).unwrap(), HdlHints::default());
    }

    #[test]
    fn parse_hints() {
        let h = HdlHints::parse(&ext(json!({"type": "wire", "write-strobe": true}))).unwrap();
        assert_eq!(h.storage, Some(Storage::Wire));
        assert_eq!(h.write_strobe, Some(true));
    }

    #[test]
    fn unknown_key() {
        let err = HdlHints::parse(&ext(json!({"port": "x"}))).unwrap_err();
        assert_eq!(
            err,
            ExtError::UnknownKey {
                ext: "x-hdl",
                key: "port".into()
            }
        );
    }

    #[test]
    fn non_bool_strobe() {
        let err = HdlHints::parse(&ext(json!({"write-strobe": "yes"}))).unwrap_err();
        assert!(matches!(err, ExtError::BadValue { .. }));
        assert!(err.to_string().contains("a boolean"));
    }

    #[test]
    fn bad_storage() {
        assert!(HdlHints::parse(&ext(json!({"type": "latch"}))).is_err());
    }

    #[test]
    fn merge_prefers_field() {
        let reg = HdlHints {
            storage: Some(Storage::Wire),
            write_strobe: Some(true),
        };
        let field = HdlHints {
            storage: Some(Storage::Reg),
            write_strobe: None,
        };
        let m = reg.merge(field);
        assert_eq!(m.storage, Some(Storage::Reg));
        assert_eq!(m.write_strobe, Some(true));
    }

    #[test]
    fn register_template_from_extension() {
        assert_eq!(RegTemplate::parse(&Extensions::new()).unwrap(), RegTemplate::CtrlRegN);
        assert_eq!(
            RegTemplate::parse(&ext(json!({"type": "rmw", "gen": "x"}))).unwrap(),
            RegTemplate::RmwReg
        );
        assert!(RegTemplate::parse(&ext(json!({"type": "srff"}))).is_err());
        assert_eq!(RegTemplate::RmwReg.name(), "RMWReg");
    }
}
