//! `regforge generate`: map to hardware IR.
//!
//! 1. Resolve the configuration and apply command-line overrides
//! 2. Load and validate the map
//! 3. Lower it with the selected backend (width-checked)
//! 4. Write the IR as JSON, or print a summary

use std::fs;
use std::path::Path;

use log::info;
use regforge_codegen::{generate, Generated, ToDiagnostic};
use regforge_config::{Backend, RegforgeConfig};
use regforge_diagnostics::DiagnosticSink;

use crate::pipeline::{load, report, resolve_config};
use crate::{BackendChoice, GenerateArgs, GlobalArgs};

/// Runs the `regforge generate` command. Returns exit code 0 on success and
/// 1 when an error diagnostic was reported.
pub fn run(args: &GenerateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let map_path = Path::new(&args.map);
    let mut config = resolve_config(global, map_path)?;
    apply_overrides(&mut config, args);

    let sink = DiagnosticSink::new();
    let Some(map) = load(map_path, &sink) else {
        return Ok(report(&sink, global));
    };

    let generated = match generate(&map, &config, &sink) {
        Ok(generated) => generated,
        Err(e) => {
            sink.emit(e.to_diagnostic());
            return Ok(report(&sink, global));
        }
    };

    if args.summary {
        println!("{}", summary(&generated));
    } else {
        let json = serde_json::to_string_pretty(&generated)?;
        match &args.output {
            Some(path) => {
                fs::write(path, json)?;
                info!("wrote {} to {path}", generated.module.name);
            }
            None => println!("{json}"),
        }
    }

    Ok(report(&sink, global))
}

/// Command-line settings take precedence over the configuration file.
fn apply_overrides(config: &mut RegforgeConfig, args: &GenerateArgs) {
    if let Some(backend) = args.backend {
        config.generate.backend = Some(match backend {
            BackendChoice::Generic => Backend::Generic,
            BackendChoice::Regctrl => Backend::Regctrl,
        });
    }
    if let Some(name) = &args.name {
        config.generate.module = Some(name.clone());
    }
}

fn summary(generated: &Generated) -> String {
    let module = &generated.module;
    let (assigns, procs, insts) = module.stats();
    let mut out = format!(
        "module {} ({} backend)\n  ports:       {}\n  signals:     {}\n  \
         assignments: {assigns}\n  processes:   {procs}\n  instances:   {insts}",
        module.name,
        generated.backend,
        module.ports.len(),
        module.signals.len(),
    );
    if !module.components.is_empty() {
        let names: Vec<_> = module.components.iter().map(|c| c.name.as_str()).collect();
        out.push_str(&format!("\n  components:  {}", names.join(", ")));
    }
    out
}
