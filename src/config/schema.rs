use crate::error::{CowfsError, Result};
use serde::{Deserialize, Serialize};

const MAX_MODE: u32 = 0o7777;

/// Settings the overlay applies when the backends cannot answer for
/// themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OverlayConfig {
    /// Mode for copied-up files whose primary permissions cannot be read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_file_mode: Option<u32>,
    /// Mode for secondary directories whose primary permissions cannot be read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_dir_mode: Option<u32>,
    /// Reported by `temp_dir()` when the secondary has no temp directory of its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<String>,
}

impl OverlayConfig {
    pub fn get_default_file_mode(&self) -> u32 {
        self.default_file_mode
            .unwrap_or_else(super::default_file_mode)
    }

    pub fn get_default_dir_mode(&self) -> u32 {
        self.default_dir_mode
            .unwrap_or_else(super::default_dir_mode)
    }

    pub fn get_temp_dir(&self) -> String {
        self.temp_dir.clone().unwrap_or_else(super::default_temp_dir)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `COWFS_LOG` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl LogConfig {
    pub fn get_filter(&self) -> String {
        self.filter.clone().unwrap_or_else(super::default_log_filter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub log: LogConfig,
}

pub fn validate_config(config: &Config) -> Result<()> {
    let overlay = &config.overlay;

    for (key, mode) in [
        ("default_file_mode", overlay.get_default_file_mode()),
        ("default_dir_mode", overlay.get_default_dir_mode()),
    ] {
        if mode > MAX_MODE {
            return Err(CowfsError::Config(format!(
                "Invalid {} {:#o}: must be at most {:#o}",
                key, mode, MAX_MODE
            )));
        }
    }

    if overlay.get_temp_dir().trim().is_empty() {
        return Err(CowfsError::Config(
            "Invalid temp_dir: must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.overlay.get_default_file_mode(), 0o644);
        assert_eq!(config.overlay.get_default_dir_mode(), 0o755);
        assert_eq!(config.overlay.get_temp_dir(), "/tmp");
        assert_eq!(config.log.get_filter(), "info");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_parse_octal_modes() {
        let config: Config = toml::from_str(
            r#"
[overlay]
default_file_mode = 0o600
temp_dir = "/scratch"
"#,
        )
        .unwrap();
        assert_eq!(config.overlay.get_default_file_mode(), 0o600);
        assert_eq!(config.overlay.get_default_dir_mode(), 0o755);
        assert_eq!(config.overlay.get_temp_dir(), "/scratch");
    }

    #[test]
    fn test_validate_rejects_bad_mode() {
        let mut config = Config::default();
        config.overlay.default_dir_mode = Some(0o17777);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("default_dir_mode"));
    }

    #[test]
    fn test_validate_rejects_empty_temp_dir() {
        let mut config = Config::default();
        config.overlay.temp_dir = Some("  ".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_sections_skipped_when_serialized() {
        let toml_str = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(!toml_str.contains("default_file_mode"));
        assert!(!toml_str.contains("filter"));
    }
}
