//! Application configuration.
//!
//! Loaded from a TOML file; every section falls back to defaults so a
//! missing or partial file still yields a runnable service.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::control::{PowerBand, PowerLimits};

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ant: AntConfig,
    pub power: PowerConfig,
    pub tracks: TracksConfig,
    pub bus: BusConfig,
}

/// ANT+ radio settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AntConfig {
    /// USB serial device of the ANT stick
    pub device: String,
    /// Broadcast device number for the FE-C channel
    pub sensor_id: u16,
}

impl Default for AntConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            sensor_id: 1,
        }
    }
}

/// Power band and safety limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Absolute lower bound in watts
    pub lower_limit: u16,
    /// Absolute upper bound in watts
    pub upper_limit: u16,
    /// Band floor in watts
    pub min_power: u16,
    /// Band ceiling in watts
    pub max_power: u16,
    /// Grade fraction mapped to the band ceiling
    pub max_grade: f64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        let band = PowerBand::default();
        let limits = PowerLimits::default();
        Self {
            lower_limit: limits.lower,
            upper_limit: limits.upper,
            min_power: band.min_power,
            max_power: band.max_power,
            max_grade: band.max_grade,
        }
    }
}

impl PowerConfig {
    pub fn band(&self) -> PowerBand {
        PowerBand {
            min_power: self.min_power,
            max_power: self.max_power,
            max_grade: self.max_grade,
        }
    }

    pub fn limits(&self) -> PowerLimits {
        PowerLimits {
            lower: self.lower_limit,
            upper: self.upper_limit,
        }
    }
}

/// Track library settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TracksConfig {
    /// Directory scanned for *.gpx files
    pub path: PathBuf,
}

impl Default for TracksConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("tracks"),
        }
    }
}

/// Message bus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub host: String,
    pub port: u16,
    /// Prefix for every published topic
    pub base_topic: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1883,
            base_topic: "velobridge".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or the default location when none is
    /// given. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Platform config file location.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "velobridge")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.power.min_power, 100);
        assert_eq!(config.power.max_power, 200);
        assert_eq!(config.bus.port, 1883);
        assert_eq!(config.tracks.path, PathBuf::from("tracks"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [power]
            upper_limit = 350

            [bus]
            base_topic = "k2"
            "#,
        )
        .unwrap();

        assert_eq!(config.power.upper_limit, 350);
        assert_eq!(config.power.lower_limit, 30);
        assert_eq!(config.bus.base_topic, "k2");
        assert_eq!(config.bus.host, "127.0.0.1");
    }

    #[test]
    fn test_band_and_limits_accessors() {
        let config = AppConfig::default();
        assert_eq!(config.power.band().max_grade, 0.15);
        assert_eq!(config.power.limits().upper, 400);
    }
}
