//! walklint CLI tool.
//!
//! Usage:
//! ```bash
//! walklint check [OPTIONS] [PATHS]...
//! walklint list-checks
//! walklint suggest FILE --line L --column C [--kind K]
//! walklint init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Checks syntax trees with configurable walking checks
#[derive(Parser)]
#[command(name = "walklint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "WALKLINT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run checks over tree files (`*.ast.json`)
    Check {
        /// Files or directories to check (default: current directory)
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Only run specific checks (comma-separated)
        #[arg(long)]
        checks: Option<String>,

        /// Exclude patterns (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Check files in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// List available checks and presets
    ListChecks,

    /// Print queries that select the nodes at a position, for `[[suppress]]`
    Suggest {
        /// Tree file
        file: PathBuf,

        /// Line (1-based)
        #[arg(long)]
        line: usize,

        /// Column (1-based)
        #[arg(long)]
        column: usize,

        /// Only nodes of this kind (e.g. `METHOD_DEF`)
        #[arg(long)]
        kind: Option<String>,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for check results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-violation compact format.
    Compact,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Check {
            paths,
            format,
            checks,
            exclude,
            parallel,
        } => {
            let start = paths.first().map_or(Path::new("."), PathBuf::as_path);
            let source = config_resolver::locate(start, cli.config.as_deref());
            let options = commands::check::CheckOptions {
                paths,
                format,
                overrides: config_resolver::Overrides {
                    checks,
                    exclude,
                    parallel,
                },
            };
            commands::check::run(&options, &source)
        }
        Commands::ListChecks => {
            commands::list_checks::run();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Suggest {
            file,
            line,
            column,
            kind,
        } => {
            let source = config_resolver::locate(&file, cli.config.as_deref());
            commands::suggest::run(&file, line, column, kind.as_deref(), &source)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { force } => {
            commands::init::run(Path::new("."), force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
