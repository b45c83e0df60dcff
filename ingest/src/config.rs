//! Runtime settings for a scan
//!
//! The bias/dark split point depends on the camera in use, so it is always
//! supplied by the caller. There is deliberately no default value here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings key for the bias/dark exposure split, as used in environment
/// variables and external configuration.
pub const BIAS_EXPOSURE_MAX_KEY: &str = "bias_exposure_max_secs";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid exposure threshold {raw:?}: expected a finite, non-negative number of seconds")]
    InvalidThreshold { raw: String },
}

/// Validated settings for one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Longest exposure, in seconds, still treated as a bias frame when a
    /// dark is reclassified. Inclusive.
    pub bias_exposure_max_secs: f64,
}

impl IngestConfig {
    pub fn new(bias_exposure_max_secs: f64) -> Result<Self, ConfigError> {
        if !bias_exposure_max_secs.is_finite() || bias_exposure_max_secs < 0.0 {
            return Err(ConfigError::InvalidThreshold {
                raw: bias_exposure_max_secs.to_string(),
            });
        }
        Ok(Self {
            bias_exposure_max_secs,
        })
    }
}

/// Parse a threshold from its textual form, e.g. an environment variable.
pub fn threshold_from_str(raw: &str) -> Result<f64, ConfigError> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidThreshold {
            raw: raw.to_string(),
        })?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(ConfigError::InvalidThreshold {
            raw: raw.to_string(),
        });
    }
    Ok(secs)
}
