//! Configuration errors.
//!
//! Everything in here is raised before the first event is processed. Per-hit
//! and per-event anomalies never surface as errors; they are skipped and
//! logged by the stage that meets them.

use std::path::PathBuf;
use thiserror::Error;

/// Axis of the Hough parameter plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Theta,
    Offset,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Theta => write!(f, "theta"),
            Axis::Offset => write!(f, "offset"),
        }
    }
}

/// Reasons why a finder configuration is rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{axis} axis needs at least one bin (got {bins})")]
    ZeroResolution { axis: Axis, bins: usize },

    #[error("{axis} axis range [{lo}, {hi}] is inverted")]
    InvertedAxis { axis: Axis, lo: f64, hi: f64 },

    #[error("{axis} axis range [{lo}, {hi}] has zero size")]
    EmptyAxis { axis: Axis, lo: f64, hi: f64 },

    #[error("{axis} axis range is not finite")]
    NonFiniteAxis { axis: Axis },

    #[error("tree depth {level} exceeds the supported maximum {max}")]
    DepthTooLarge { level: u32, max: u32 },

    #[error("invalid threshold `{name}`: {reason}")]
    InvalidThreshold { name: &'static str, reason: String },

    #[error("invalid step schedule: {0}")]
    InvalidSchedule(String),

    #[error("invalid detector geometry: {0}")]
    InvalidGeometry(String),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub(crate) fn threshold(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidThreshold {
            name,
            reason: reason.into(),
        }
    }
}
