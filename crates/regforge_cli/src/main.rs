//! regforge CLI: generates register control modules from laid-out maps.
//!
//! Provides `regforge generate` to lower a map into the hardware IR and
//! `regforge check` to load and validate a map without generating anything.

#![warn(missing_docs)]

mod check;
mod generate;
mod pipeline;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use simple_logger::SimpleLogger;

/// regforge: register maps to register control hardware.
#[derive(Parser, Debug)]
#[command(name = "regforge", version, about = "Register map code generator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `regforge.toml` configuration file. By default the file
    /// next to the map is used when present.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the register control module of a map.
    Generate(GenerateArgs),
    /// Load and validate a map.
    Check {
        /// Laid-out register map (JSON).
        map: String,
    },
}

/// Arguments for the `regforge generate` subcommand.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Laid-out register map (JSON).
    pub map: String,

    /// Backend overriding the one selected by the map's bus.
    #[arg(short, long, value_enum)]
    pub backend: Option<BackendChoice>,

    /// Output path for the generated IR (JSON). Printed to stdout if omitted.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Module name override.
    #[arg(long)]
    pub name: Option<String>,

    /// Print a summary of the generated module instead of the IR.
    #[arg(long)]
    pub summary: bool,
}

/// Backend selection on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendChoice {
    /// Generic Wishbone backend.
    Generic,
    /// Multiplexed register-control backend.
    Regctrl,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

impl GlobalArgs {
    /// Log level selected by `-q` / `-v`.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    if let Err(e) = SimpleLogger::new()
        .with_level(global.log_level())
        .with_colors(color)
        .without_timestamps()
        .init()
    {
        eprintln!("warning: logging disabled: {e}");
    }

    let result = match cli.command {
        Command::Generate(ref args) => generate::run(args, &global),
        Command::Check { ref map } => check::run(map, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
