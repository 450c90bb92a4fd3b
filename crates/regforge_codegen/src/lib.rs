//! Lowering of laid-out register maps into register control modules.
//!
//! Two backends are provided, chosen by the bus of the map unless the
//! configuration overrides it:
//! 1. **Generic** (`wb-32-be`): a Wishbone slave whose field values live in
//!    registers of the module itself.
//! 2. **Regctrl** (`cern-be-vme`): a multiplexed control unit storing every
//!    writable word in an external register IP instance.
//!
//! Both return the module together with [`Annotations`] recording the
//! signals created for each node of the map. The map is never mutated, so
//! generating twice yields equal results.
//!
//! # Usage
//!
//! ```ignore
//! use regforge_codegen::generate;
//! let generated = generate(&map, &config, &sink)?;
//! ```

#![warn(missing_docs)]

pub mod annotations;
pub mod component;
pub mod decoder;
pub mod errors;
pub mod width;

mod generic;
mod regctrl;

pub use annotations::{Annotations, ArrayHandles, FieldHandles, RegHandles};
pub use errors::{GenError, ToDiagnostic};

use log::{debug, info};
use regforge_config::{Backend, RegforgeConfig};
use regforge_diagnostics::DiagnosticSink;
use regforge_ir::{check_widths, Module};
use regforge_tree::{BusKind, RegMap};
use serde::{Deserialize, Serialize};

/// The result of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generated {
    /// Backend that produced the module.
    pub backend: Backend,
    /// The generated module.
    pub module: Module,
    /// Per-node handles into `module`.
    pub annotations: Annotations,
}

/// Backend lowering maps declared for `bus`.
pub fn default_backend(bus: BusKind) -> Backend {
    match bus {
        BusKind::WbClassic32Be => Backend::Generic,
        BusKind::CernBeVme => Backend::Regctrl,
    }
}

/// Name of the generated module when the configuration does not set one.
pub fn default_module_name(map: &RegMap, backend: Backend, config: &RegforgeConfig) -> String {
    match backend {
        Backend::Generic => map.name().to_string(),
        Backend::Regctrl => format!("{}{}", config.regctrl.module_prefix, map.name()),
    }
}

/// Generates the register control module of `map`.
///
/// Warnings go to `sink`; the first fatal condition aborts generation. When
/// `generate.check_widths` is set, a module failing the width checker is
/// reported as [`GenError::Inconsistent`].
pub fn generate(
    map: &RegMap,
    config: &RegforgeConfig,
    sink: &DiagnosticSink,
) -> Result<Generated, GenError> {
    let backend = config
        .generate
        .backend
        .unwrap_or_else(|| default_backend(map.bus()));
    let name = config
        .generate
        .module
        .clone()
        .unwrap_or_else(|| default_module_name(map, backend, config));
    info!("generating {name} from {} ({backend})", map.name());

    let (module, annotations) = match backend {
        Backend::Generic => generic::generate(map, &name, sink)?,
        Backend::Regctrl => regctrl::generate(map, &config.regctrl, &name, sink)?,
    };

    if config.generate.check_widths {
        let errors = check_widths(&module);
        if !errors.is_empty() {
            return Err(GenError::Inconsistent {
                module: module.name.clone(),
                errors,
            });
        }
        debug!("{}: widths consistent", module.name);
    }

    Ok(Generated {
        backend,
        module,
        annotations,
    })
}
