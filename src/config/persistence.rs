use crate::error::{CowfsError, Result};
use std::path::Path;

use crate::config::paths::*;
use crate::config::schema::*;

/// Load the user config, falling back to defaults when no file exists.
pub fn load_config() -> Result<Config> {
    load_config_from(&get_config_path()?)
}

pub fn load_config_from(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        tracing::debug!("No config file at {}, using defaults", config_path.display());
        return Ok(Config::default());
    }

    let toml_content = std::fs::read_to_string(config_path)
        .map_err(|e| CowfsError::Config(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&toml_content)
        .map_err(|e| CowfsError::Config(format!("Failed to parse config: {}", e)))?;

    validate_config(&config)?;
    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    save_config_to(&get_config_path()?, config)
}

pub fn save_config_to(config_path: &Path, config: &Config) -> Result<()> {
    validate_config(config)?;
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            CowfsError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| CowfsError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(config_path, toml_str)
        .map_err(|e| CowfsError::Config(format!("Failed to write config file: {}", e)))?;
    Ok(())
}
