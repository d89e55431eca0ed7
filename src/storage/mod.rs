pub mod book;
pub mod config;

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;

pub use book::{BincodeBookStorage, BookStorage, export_json};
pub use config::{Config, ConfigStorage, GeneralConfig, TomlConfigStorage};

/// Ensure XDG data and config directories exist
/// Returns (data_dir, config_dir)
///
/// XDG Base Directory Specification:
/// - Data: $XDG_DATA_HOME/dialr (default: ~/.local/share/dialr)
/// - Config: $XDG_CONFIG_HOME/dialr (default: ~/.config/dialr)
pub fn ensure_directories() -> Result<(PathBuf, PathBuf)> {
    let home = env::var("HOME").context("HOME environment variable not set")?;
    let home_path = PathBuf::from(home);

    let data_dir = if let Ok(xdg_data) = env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join("dialr")
    } else {
        home_path.join(".local/share/dialr")
    };

    let config_dir = if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("dialr")
    } else {
        home_path.join(".config/dialr")
    };

    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory {:?}", config_dir))?;

    log::debug!("Data directory: {:?}", data_dir);
    log::debug!("Config directory: {:?}", config_dir);

    Ok((data_dir, config_dir))
}
