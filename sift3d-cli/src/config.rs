//! TOML configuration file
//!
//! Every section is optional and missing keys take their defaults:
//!
//! ```toml
//! log_level = "info"
//!
//! [keypoints]
//! blank_lines = "skip"
//!
//! [image]
//! units = [1.0, 1.0, 2.5]
//!
//! [extractor]
//! window_factor = 5.0
//! gaussian_fraction = 0.5
//! truncation = 0.2
//!
//! [output]
//! delimiter = "comma"
//! include_header = false
//! ```

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sift3d_algorithms::ExtractorConfig;
use sift3d_core::{Error, Vector3d};
use sift3d_io::{DescriptorWriteOptions, KeypointCsvOptions};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("failed to read config file {}: {source}", .path.display())]
    ConfigRead { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file {}: {source}", .path.display())]
    ConfigParse { path: PathBuf, source: toml::de::Error },
    #[error("invalid config file {}: {source}", .path.display())]
    ConfigInvalid { path: PathBuf, source: Error },
}

/// Log verbosity level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Image decoding settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageOptions {
    /// Voxel spacing along x, y and z
    pub units: [f64; 3],
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            units: [1.0, 1.0, 1.0],
        }
    }
}

impl ImageOptions {
    pub fn units(&self) -> Vector3d {
        Vector3d::new(self.units[0], self.units[1], self.units[2])
    }

    /// Check every voxel spacing is finite and positive
    pub fn validate(&self) -> sift3d_core::Result<()> {
        for (axis, unit) in ["x", "y", "z"].into_iter().zip(self.units) {
            if !(unit.is_finite() && unit > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "image units along {} must be positive, got {}",
                    axis, unit
                )));
            }
        }
        Ok(())
    }
}

/// Tool configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatConfig {
    pub log_level: Option<LogLevel>,
    pub keypoints: KeypointCsvOptions,
    pub image: ImageOptions,
    pub extractor: ExtractorConfig,
    pub output: DescriptorWriteOptions,
}

impl FeatConfig {
    /// Parse configuration text
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Load the configuration file, or defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<FeatConfig, CliError> {
    let Some(path) = path else {
        return Ok(FeatConfig::default());
    };
    let content = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config = FeatConfig::from_toml_str(&content).map_err(|source| CliError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    config
        .image
        .validate()
        .map_err(|source| CliError::ConfigInvalid {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(config)
}
