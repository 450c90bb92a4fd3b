//! Parsing and validation of `regforge.toml` configuration files.
//!
//! Every setting has a default, so a missing file and an empty file both
//! yield [`RegforgeConfig::default()`].

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{find_config, load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
