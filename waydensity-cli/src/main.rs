//! WayDensity CLI - Command-line interface
//!
//! Measures road and trail length and density inside a polygon, either once
//! from a file or as an HTTP service.

mod commands;
mod error;
mod runner;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::process::ProcessArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Debug, Parser)]
#[command(name = "waydensity", version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.waydensity/config.ini)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Measure roads and trails inside a polygon and print the report as JSON
    Process {
        /// JSON file with [[lat, lon], ...] or {"polygon": [...]}; "-" reads stdin
        #[arg(long, value_name = "FILE")]
        polygon: String,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },

    /// Show area, query mode and tile counts without fetching anything
    Plan {
        /// JSON polygon file; "-" reads stdin
        #[arg(long, value_name = "FILE")]
        polygon: String,
    },

    /// Serve POST /process-area over HTTP
    Serve {
        /// Listen address (overrides [server] bind)
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => commands::init::run(config_path, force),
        Commands::Config(command) => commands::config::run(config_path, command),
        Commands::Process { polygon, pretty } => {
            let runner = CliRunner::new(config_path)?;
            commands::process::run(&runner, ProcessArgs { polygon, pretty })
        }
        Commands::Plan { polygon } => {
            let runner = CliRunner::new(config_path)?;
            commands::plan::run(&runner, &polygon)
        }
        Commands::Serve { bind } => {
            let runner = CliRunner::new(config_path)?;
            commands::serve::run(&runner, bind)
        }
    }
}
