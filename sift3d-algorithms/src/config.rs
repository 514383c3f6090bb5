//! Extractor configuration

use serde::{Deserialize, Serialize};
use sift3d_core::{Error, Result};

/// Spatial histogram cells per axis
pub const NHIST_PER_DIM: usize = 4;

/// Spatial histogram cells in total
pub const NHIST: usize = NHIST_PER_DIM * NHIST_PER_DIM * NHIST_PER_DIM;

/// Parameters of the raw descriptor extractor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractorConfig {
    /// Sampling radius as a multiple of keypoint scale
    pub window_factor: f64,
    /// Gaussian weighting sigma as a fraction of the sampling radius
    pub gaussian_fraction: f64,
    /// Histogram values are clamped to this after the first normalization
    pub truncation: f32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            window_factor: 5.0,
            gaussian_fraction: 0.5,
            truncation: 0.2,
        }
    }
}

impl ExtractorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check every parameter is in range
    pub fn validate(&self) -> Result<()> {
        if !(self.window_factor.is_finite() && self.window_factor > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "window_factor must be positive, got {}",
                self.window_factor
            )));
        }
        if !(self.gaussian_fraction.is_finite() && self.gaussian_fraction > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "gaussian_fraction must be positive, got {}",
                self.gaussian_fraction
            )));
        }
        if !(self.truncation > 0.0 && self.truncation <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "truncation must be in (0, 1], got {}",
                self.truncation
            )));
        }
        Ok(())
    }
}
