//! Configuration inspection commands.

use std::path::Path;

use clap::Subcommand;
use waydensity::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective settings
    Show,
}

/// Run a config subcommand.
pub fn run(config_path: Option<&Path>, command: ConfigCommands) -> Result<(), CliError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);

    match command {
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Show => {
            let config = ConfigFile::load_if_exists(&path)?;
            print_config(&config);
            Ok(())
        }
    }
}

fn print_config(config: &ConfigFile) {
    println!("[overpass]");
    println!("endpoint = {}", config.overpass.endpoint);
    println!("request_timeout_secs = {}", config.overpass.request_timeout_secs);
    println!("query_timeout_secs = {}", config.overpass.query_timeout_secs);
    println!();
    println!("[retry]");
    println!("max_attempts = {}", config.retry.max_attempts);
    println!("initial_delay_ms = {}", config.retry.initial_delay_ms);
    println!("max_delay_ms = {}", config.retry.max_delay_ms);
    println!();
    println!("[tiling]");
    println!("area_threshold_km2 = {}", config.tiling.area_threshold_km2);
    println!("tile_size_deg = {}", config.tiling.tile_size_deg);
    println!("max_tiles = {}", config.tiling.max_tiles);
    println!();
    println!("[fetch]");
    println!("batch_size = {}", config.fetch.batch_size);
    println!("batch_pause_ms = {}", config.fetch.batch_pause_ms);
    println!();
    println!("[response]");
    println!("max_geometry_km = {}", config.max_geometry_km);
    println!();
    println!("[server]");
    println!("bind = {}", config.server.bind);
    println!();
    println!("[logging]");
    println!("level = {}", config.logging.level);
    if let Some(directory) = &config.logging.directory {
        println!("directory = {}", directory.display());
    }
}
