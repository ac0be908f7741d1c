//! Configuration management for Recap.
//!
//! Configuration is loaded from `~/.config/recap/config.toml` (or a JSON file
//! with the same shape) with sensible defaults for every missing key. The
//! pipeline uses [`Config::load_or_default`], which fails closed: a missing,
//! unreadable or invalid file yields the default configuration.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Recap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Enhancement pipeline settings
    pub enhancement_settings: EnhancementConfig,

    /// Analysis service settings
    pub service: ServiceConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as TOML.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: Config = if is_json {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults on any problem.
    ///
    /// With `path == None` the default location is used. Enhancement stays
    /// enabled unless a valid file explicitly disables it.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let result = match path {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        };
        match result {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.recap.recap/config.toml
    /// - Linux: ~/.config/recap/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\recap\config\config.toml
    ///
    /// Falls back to ~/.recap/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "recap", "recap")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = shellexpand::tilde("~").into_owned();
                PathBuf::from(home).join(".recap").join("config.toml")
            })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        let settings = &config.enhancement_settings;
        assert!(settings.enabled);
        assert!(!settings.api_key_required);
        assert!(settings.fallback_to_original);
        assert_eq!(settings.processing_delay, DelayRange { min: 0.5, max: 1.5 });
        assert_eq!(config.service.model, "gemini-2.5-flash");
        assert_eq!(config.service.api_key, "${GEMINI_API_KEY}");
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[enhancement_settings]"));
        assert!(toml.contains("[service]"));
    }

    #[test]
    fn test_load_json_with_missing_keys_uses_defaults() {
        let file = write_config(
            ".json",
            r#"{"enhancement_settings": {"api_key_required": true}}"#,
        );
        let config = Config::load_from(file.path()).unwrap();
        let settings = &config.enhancement_settings;
        assert!(settings.enabled);
        assert!(settings.api_key_required);
        assert!(settings.fallback_to_original);
        assert_eq!(settings.processing_delay, DelayRange::default());
    }

    #[test]
    fn test_load_json_full_settings() {
        let file = write_config(
            ".json",
            r#"{
                "enhancement_settings": {
                    "enabled": false,
                    "api_key_required": false,
                    "fallback_to_original": false,
                    "processing_delay": {"min": 0.0, "max": 0.0}
                }
            }"#,
        );
        let config = Config::load_from(file.path()).unwrap();
        let settings = &config.enhancement_settings;
        assert!(!settings.enabled);
        assert!(!settings.fallback_to_original);
        assert!(settings.processing_delay.is_zero());
    }

    #[test]
    fn test_load_toml() {
        let file = write_config(
            ".toml",
            "[enhancement_settings]\nenabled = true\ntimeout_ms = 2500\n\n[service]\nmodel = \"gemini-2.5-pro\"\n",
        );
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.enhancement_settings.timeout_ms, 2500);
        assert_eq!(config.service.model, "gemini-2.5-pro");
        assert_eq!(config.service.api_key, "${GEMINI_API_KEY}");
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let file = write_config(".json", "{ this is not json");
        assert!(Config::load_from(file.path()).is_err());

        let config = Config::load_or_default(Some(file.path()));
        assert!(config.enhancement_settings.enabled);
        assert!(config.enhancement_settings.fallback_to_original);
    }

    #[test]
    fn test_oversized_delay_file_is_rejected() {
        let file = write_config(
            ".json",
            r#"{"enhancement_settings": {"processing_delay": {"min": 1e20, "max": 1e20}}}"#,
        );
        assert!(matches!(
            Config::load_from(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
        let config = Config::load_or_default(Some(file.path()));
        assert_eq!(
            config.enhancement_settings.processing_delay,
            DelayRange::default()
        );
    }

    #[test]
    fn test_invalid_delay_falls_back_to_defaults() {
        let file = write_config(
            ".json",
            r#"{"enhancement_settings": {"enabled": false, "processing_delay": {"min": 3.0, "max": 1.0}}}"#,
        );
        let config = Config::load_or_default(Some(file.path()));
        assert!(config.enhancement_settings.enabled);
        assert_eq!(
            config.enhancement_settings.processing_delay,
            DelayRange::default()
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(Some(&dir.path().join("absent.toml")));
        assert!(config.enhancement_settings.enabled);
    }

    #[test]
    fn test_explicit_disable_is_honored() {
        let file = write_config(".toml", "[enhancement_settings]\nenabled = false\n");
        let config = Config::load_or_default(Some(file.path()));
        assert!(!config.enhancement_settings.enabled);
    }
}
