//! sharplint CLI tool.
//!
//! Usage:
//! ```bash
//! sharplint check [OPTIONS] [PATH]
//! sharplint tokens <FILE>
//! sharplint list-graphs [PATH]
//! sharplint init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Style linter for C# sources
#[derive(Parser)]
#[command(name = "sharplint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SHARPLINT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint source files
    Check {
        /// File or directory to analyze (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Append a text report to this file
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Exclude patterns (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,
    },

    /// Print the token stream of a file
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },

    /// List the rule graphs in effect
    ListGraphs {
        /// File or directory whose configuration applies (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for lint results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Caret views grouped per file.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-mismatch compact format.
    Compact,
    /// Diagnostics with source snippets.
    Fancy,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            path,
            format,
            report,
            exclude,
        } => {
            let source = config_resolver::resolve(&path, cli.config.as_deref());
            let clean = commands::check::run(&path, format, report.as_deref(), exclude, &source)?;
            if !clean {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Tokens { file } => {
            let source = config_resolver::resolve(&file, cli.config.as_deref());
            commands::tokens::run(&file, &source)
        }
        Commands::ListGraphs { path } => {
            let source = config_resolver::resolve(&path, cli.config.as_deref());
            commands::list_graphs::run(&path, &source)
        }
        Commands::Init { force } => commands::init::run(force),
    }
}
