//! Runtime configuration files of the binaries.
//!
//! Both binaries take a single JSON file. Every section except the paths is
//! optional and falls back to its `Default`.

pub mod synthetic;

use crate::error::ConfigError;
use crate::finder::FinderParams;
use crate::geometry::DetectorGeometry;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputConfig {
    /// Report destination; printed to stdout when absent.
    pub json_out: Option<PathBuf>,
    /// Also write the full per-event trace.
    pub include_trace: bool,
}

/// Configuration of `track_finder_demo`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// JSON file holding an array of hit records.
    pub input_path: PathBuf,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub geometry: DetectorGeometry,
    #[serde(default)]
    pub finder_params: FinderParams,
}

/// Reads and validates a runtime config.
pub fn load_config(path: &Path) -> Result<RuntimeConfig, ConfigError> {
    let config: RuntimeConfig = read_json(path)?;
    config.geometry.validate()?;
    config.finder_params.validate()?;
    Ok(config)
}

pub(crate) fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
