//! Configuration file support

use anyhow::{Context, Result};
use mpq::Priority;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// StormLib shared library to load
    pub library: Option<PathBuf>,

    /// Resolution order for attached archives
    pub priority: Option<Priority>,

    /// Default output format ("text" or "json")
    pub default_output: Option<String>,
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mpq-cli").join("config.toml"))
}

/// Load configuration from `path`, or the default location
///
/// A missing file yields the default configuration; an unreadable or
/// malformed one is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(Config::default()),
        },
    };

    let contents = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Invalid config file: {}", config_path.display()))?;

    log::debug!("Loaded config from {}", config_path.display());
    Ok(config)
}
