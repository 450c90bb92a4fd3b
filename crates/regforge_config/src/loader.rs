//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::RegforgeConfig;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up next to the map.
pub const CONFIG_FILE: &str = "regforge.toml";

/// Returns `<dir>/regforge.toml` when it exists.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(CONFIG_FILE);
    path.is_file().then_some(path)
}

/// Loads and validates a configuration file.
pub fn load_config(path: &Path) -> Result<RegforgeConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<RegforgeConfig, ConfigError> {
    let config: RegforgeConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks that every name that ends up in generated identifiers is one.
fn validate_config(config: &RegforgeConfig) -> Result<(), ConfigError> {
    if let Some(module) = &config.generate.module {
        check_identifier("generate.module", module, false)?;
    }
    let r = &config.regctrl;
    check_identifier("regctrl.library", &r.library, false)?;
    check_identifier("regctrl.module_prefix", &r.module_prefix, true)?;
    check_identifier("regctrl.memmap_prefix", &r.memmap_prefix, true)?;
    for (key, binding) in [
        ("regctrl.ctrlregn_binding", &r.ctrlregn_binding),
        ("regctrl.rmwreg_binding", &r.rmwreg_binding),
    ] {
        if binding.trim().is_empty() {
            return Err(invalid(key, "must not be empty"));
        }
    }
    Ok(())
}

fn check_identifier(key: &str, value: &str, allow_empty: bool) -> Result<(), ConfigError> {
    if value.is_empty() {
        return if allow_empty {
            Ok(())
        } else {
            Err(invalid(key, "must not be empty"))
        };
    }
    if !value.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(invalid(key, "must start with a letter"));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid(key, "may only contain letters, digits and '_'"));
    }
    Ok(())
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
