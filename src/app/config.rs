//! Startup configuration
//!
//! Settings are read from a TOML file. Missing files and missing keys fall
//! back to defaults.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::render::{ChartDimensions, ScaleParams, DEFAULT_FILL};

/// Client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// WebSocket endpoint publishing spectrum frames
    pub endpoint_url: String,

    /// Upper bound of the bin index domain
    pub bin_max_index: u32,

    /// Upper bound of the magnitude domain
    pub magnitude_max: u32,

    /// Exponent of the height power scale
    pub height_exponent: f64,

    /// Bar fill colour, `#rrggbb` or a colour name
    pub fill: String,

    /// Chart size used when running headless
    pub chart_width: u32,
    pub chart_height: u32,

    /// Capacity of the connection event channel
    pub channel_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint_url: "ws://127.0.0.1:8080/spectrum".to_string(),
            bin_max_index: 1024,
            magnitude_max: 255,
            height_exponent: 4.0,
            fill: DEFAULT_FILL.to_string(),
            chart_width: 1024,
            chart_height: 256,
            channel_capacity: 256,
        }
    }
}

impl Settings {
    /// Check that the settings describe a usable chart and endpoint
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint_url.starts_with("ws://") || self.endpoint_url.starts_with("wss://")) {
            return Err(Error::Config(format!(
                "endpoint_url must be a ws:// or wss:// URL, got {}",
                self.endpoint_url
            )));
        }
        if self.bin_max_index < 1 {
            return Err(Error::Config("bin_max_index must be at least 1".to_string()));
        }
        if self.magnitude_max < 1 {
            return Err(Error::Config("magnitude_max must be at least 1".to_string()));
        }
        if !self.height_exponent.is_finite() || self.height_exponent <= 0.0 {
            return Err(Error::Config(format!(
                "height_exponent must be a positive number, got {}",
                self.height_exponent
            )));
        }
        if self.channel_capacity < 1 {
            return Err(Error::Config("channel_capacity must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn scale_params(&self) -> ScaleParams {
        ScaleParams {
            bin_max_index: self.bin_max_index,
            magnitude_max: self.magnitude_max,
            height_exponent: self.height_exponent,
        }
    }

    pub fn headless_dimensions(&self) -> ChartDimensions {
        ChartDimensions::new(self.chart_width, self.chart_height)
    }
}

/// Configuration manager
pub struct ConfigManager {
    settings: Settings,
    config_file: PathBuf,
}

impl ConfigManager {
    /// Load settings from the user's config directory
    pub fn new() -> Result<Self> {
        let mut config_file = dirs::config_dir()
            .ok_or_else(|| Error::Config("Failed to determine config directory".to_string()))?;
        config_file.push("spectrum-client");
        config_file.push("config.toml");

        Self::with_file(config_file)
    }

    /// Create a new ConfigManager with a custom file path
    pub fn with_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_file = path.as_ref().to_path_buf();
        let settings = if config_file.exists() {
            Self::load_from_file(&config_file)?
        } else {
            debug!("Config file {:?} not found, using defaults", config_file);
            Settings::default()
        };
        settings.validate()?;

        Ok(Self {
            settings,
            config_file,
        })
    }

    /// Load settings from a TOML file
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Save settings to the config file
    pub fn save(&self) -> Result<()> {
        let toml = toml::to_string_pretty(&self.settings)
            .map_err(|e| Error::Config(format!("Failed to serialize settings: {}", e)))?;

        if let Some(parent) = self.config_file.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.config_file, toml)?;

        debug!("Saved config to {:?}", self.config_file);
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.endpoint_url, "ws://127.0.0.1:8080/spectrum");
        assert_eq!(settings.bin_max_index, 1024);
        assert_eq!(settings.magnitude_max, 255);
        assert_eq!(settings.height_exponent, 4.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn save_and_load() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = ConfigManager::with_file(&config_path).unwrap();
        config.settings_mut().endpoint_url = "ws://10.0.0.2:9000/spectrum".to_string();
        config.settings_mut().height_exponent = 2.0;
        config.save().unwrap();
        assert!(config_path.exists());

        let loaded = ConfigManager::with_file(&config_path).unwrap();
        assert_eq!(loaded.settings(), config.settings());
    }

    #[test]
    fn partial_file_uses_defaults_for_missing_keys() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "bin_max_index = 512\n").unwrap();

        let config = ConfigManager::with_file(&config_path).unwrap();
        assert_eq!(config.settings().bin_max_index, 512);
        assert_eq!(config.settings().magnitude_max, 255);
    }

    #[test]
    fn file_not_found_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = ConfigManager::with_file(temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.settings(), &Settings::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "height_exponent = 0.0\n").unwrap();
        assert!(matches!(
            ConfigManager::with_file(&config_path),
            Err(Error::Config(_))
        ));

        let settings = Settings {
            endpoint_url: "http://127.0.0.1/spectrum".to_string(),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn garbage_file_is_a_config_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "this is not toml = = =").unwrap();
        assert!(matches!(
            ConfigManager::with_file(&config_path),
            Err(Error::Config(_))
        ));
    }
}
