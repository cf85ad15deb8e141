//! Configuration module for the gcsimt CLI.
//!
//! Loads and saves `gcsimt.toml`, which holds the simulation parameters
//! and output preferences. Command-line flags override file values.

use dirs::{config_dir, home_dir};
use gcsim::{CollectorKind, SimConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GcsimtError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "gcsimt.toml";

/// Application configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Simulation parameters handed to the engine.
    #[serde(default)]
    pub simulation: SimConfig,

    /// How snapshots are printed.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Print snapshots as JSON.
    #[serde(default)]
    pub json: bool,

    /// Draw the cell grid in text output.
    #[serde(default = "default_true")]
    pub grid: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json: false,
            grid: true,
        }
    }
}

/// Values given on the command line that take precedence over the file
/// and the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub collector: Option<CollectorKind>,
    pub grid_size: Option<usize>,
    pub seed: Option<u64>,
    pub tick_interval_ms: Option<u64>,
    pub hold_ms: Option<u64>,
    pub json: bool,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Searches for configuration in the following order:
    /// 1. Current directory
    /// 2. `~/.config/gcsimt/`
    /// 3. System configuration directory
    ///
    /// Returns the default configuration if no config file is found.
    pub fn load() -> Result<Self> {
        match Self::find_config_file() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GcsimtError::Config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| GcsimtError::Config(format!("Failed to parse configuration: {}", e)))?;

        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            GcsimtError::Config(format!("Failed to serialize configuration: {}", e))
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `GCSIM_*` environment variables, then command-line overrides,
    /// and validate the result.
    pub fn with_overrides(mut self, overrides: &Overrides) -> Result<Self> {
        self.simulation = self.simulation.with_env();
        if let Some(collector) = overrides.collector {
            self.simulation.collector = collector;
        }
        if let Some(grid_size) = overrides.grid_size {
            self.simulation.grid_size = grid_size;
        }
        if let Some(seed) = overrides.seed {
            self.simulation.seed = Some(seed);
        }
        if let Some(tick) = overrides.tick_interval_ms {
            self.simulation.tick_interval_ms = tick;
        }
        if let Some(hold) = overrides.hold_ms {
            self.simulation.hold_ms = hold;
        }
        if overrides.json {
            self.output.json = true;
        }

        self.simulation
            .validate()
            .map_err(|e| GcsimtError::Validation(e.to_string()))?;
        Ok(self)
    }

    fn check_current_dir_config() -> Option<PathBuf> {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        path.exists().then_some(path)
    }

    fn check_home_config() -> Option<PathBuf> {
        home_dir()
            .map(|dir| dir.join(".config").join("gcsimt").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    fn check_system_config() -> Option<PathBuf> {
        config_dir()
            .map(|dir| dir.join("gcsimt").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    fn find_config_file() -> Option<PathBuf> {
        Self::check_current_dir_config()
            .or_else(Self::check_home_config)
            .or_else(Self::check_system_config)
    }
}
