//! Init command - write a default configuration file.

use std::path::Path;

use waydensity::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
pub fn run(config_path: Option<&Path>, force: bool) -> Result<(), CliError> {
    let default_path = config_file_path();
    let path = config_path.unwrap_or(&default_path);

    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        )));
    }

    ConfigFile::default().save(path)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to point at another Overpass instance or tune tiling.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
