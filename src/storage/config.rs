use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
}

/// General configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Override for the backing file path
    /// (default: `<data_dir>/phonebook.dat`)
    #[serde(rename = "data-file", default)]
    pub data_file: Option<PathBuf>,

    /// Override for the JSON export path
    /// (default: `<data_dir>/phonebook_export.json`)
    #[serde(rename = "export-file", default)]
    pub export_file: Option<PathBuf>,

    /// Enable debug logging
    #[serde(rename = "debug-logging", default)]
    pub debug_logging: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            data_file: None,
            export_file: None,
            debug_logging: false,
        }
    }
}

impl Config {
    /// Resolve the backing file path against the data directory
    pub fn data_file(&self, data_dir: &std::path::Path) -> PathBuf {
        self.general
            .data_file
            .clone()
            .unwrap_or_else(|| data_dir.join("phonebook.dat"))
    }

    /// Resolve the JSON export path against the data directory
    pub fn export_file(&self, data_dir: &std::path::Path) -> PathBuf {
        self.general
            .export_file
            .clone()
            .unwrap_or_else(|| data_dir.join("phonebook_export.json"))
    }
}

/// Trait for configuration storage
pub trait ConfigStorage: Send + Sync {
    /// Load configuration from file
    fn load(&self) -> Result<Config>;

    /// Save configuration to file
    fn save(&self, config: &Config) -> Result<()>;

    /// Get the config file path
    fn path(&self) -> &PathBuf;

    /// Create default configuration file if it doesn't exist
    fn create_default(&self) -> Result<()>;
}

/// TOML-based implementation of ConfigStorage
pub struct TomlConfigStorage {
    path: PathBuf,
}

impl TomlConfigStorage {
    /// Create a new TomlConfigStorage with the given path
    pub fn new(path: PathBuf) -> Self {
        TomlConfigStorage { path }
    }
}

impl ConfigStorage for TomlConfigStorage {
    fn load(&self) -> Result<Config> {
        use anyhow::Context;
        use std::fs;

        // If file doesn't exist, create default and return it
        if !self.path.exists() {
            log::info!(
                "Config file not found at {:?}, creating default configuration",
                self.path
            );
            self.create_default()?;
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {:?}", self.path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", self.path))?;

        log::info!("Loaded configuration from {:?}", self.path);

        Ok(config)
    }

    fn save(&self, config: &Config) -> Result<()> {
        use anyhow::Context;
        use std::fs;

        let toml_str =
            toml::to_string_pretty(config).with_context(|| "Failed to serialize configuration")?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        fs::write(&self.path, toml_str)
            .with_context(|| format!("Failed to write config to {:?}", self.path))?;

        log::debug!("Saved configuration to {:?}", self.path);

        Ok(())
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn create_default(&self) -> Result<()> {
        use anyhow::Context;
        use std::fs;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        // Use the example config compiled into the binary
        let example_config = include_str!("../../dialr.toml.example");

        fs::write(&self.path, example_config)
            .with_context(|| format!("Failed to create default config at {:?}", self.path))?;

        log::info!("Created default configuration at {:?}", self.path);

        Ok(())
    }
}
