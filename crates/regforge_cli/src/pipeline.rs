//! Shared steps of the CLI commands: configuration lookup, map loading and
//! diagnostic rendering.

use std::path::{Path, PathBuf};

use regforge_codegen::ToDiagnostic;
use regforge_config::{find_config, load_config, RegforgeConfig};
use regforge_diagnostics::{
    Diagnostic, DiagnosticRenderer, DiagnosticSink, Severity, TerminalRenderer,
};
use regforge_tree::{load_map, RegMap};

use crate::GlobalArgs;

/// Resolves the configuration for a map.
///
/// `--config` wins; otherwise `regforge.toml` next to the map is used when it
/// exists, and the defaults apply when it does not.
pub fn resolve_config(
    global: &GlobalArgs,
    map: &Path,
) -> Result<RegforgeConfig, Box<dyn std::error::Error>> {
    let path = match &global.config {
        Some(path) => Some(PathBuf::from(path)),
        None => find_config(map.parent().unwrap_or_else(|| Path::new("."))),
    };
    match path {
        Some(path) => {
            log::debug!("using configuration {}", path.display());
            Ok(load_config(&path)?)
        }
        None => Ok(RegforgeConfig::default()),
    }
}

/// Loads and validates a map, reporting a failure into `sink`.
pub fn load(map: &Path, sink: &DiagnosticSink) -> Option<RegMap> {
    match load_map(map) {
        Ok(map) => Some(map),
        Err(e) => {
            sink.emit(e.to_diagnostic());
            None
        }
    }
}

/// Renders every diagnostic of `sink` to stderr and prints a summary line.
/// Returns the exit code: 1 when an error was reported, 0 otherwise.
pub fn report(sink: &DiagnosticSink, global: &GlobalArgs) -> i32 {
    let diagnostics = sink.diagnostics();
    let renderer = TerminalRenderer::new(global.color);
    for diag in diagnostics.iter().filter(|d| shown(d, global)) {
        eprint!("{}", renderer.render(diag));
    }

    let (errors, warnings) = sink.counts();
    for (stage, n) in sink.by_stage() {
        log::debug!("{stage}: {n} diagnostic(s)");
    }
    if !global.quiet && (errors > 0 || warnings > 0) {
        eprintln!("   Result: {errors} error(s), {warnings} warning(s)");
    }

    if sink.has_errors() {
        1
    } else {
        0
    }
}

fn shown(diag: &Diagnostic, global: &GlobalArgs) -> bool {
    !global.quiet || diag.severity == Severity::Error
}
