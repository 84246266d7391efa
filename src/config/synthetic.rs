use super::read_json;
use crate::error::ConfigError;
use crate::geometry::DetectorGeometry;
use crate::synthetic::SyntheticConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration of `synthetic_event`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntheticDemoConfig {
    /// Destination of the hit records.
    pub hits_out: PathBuf,
    /// Optional destination of the generated truth.
    #[serde(default)]
    pub truth_out: Option<PathBuf>,
    #[serde(default)]
    pub geometry: DetectorGeometry,
    #[serde(default)]
    pub event: SyntheticConfig,
}

pub fn load_config(path: &Path) -> Result<SyntheticDemoConfig, ConfigError> {
    let config: SyntheticDemoConfig = read_json(path)?;
    config.geometry.validate()?;
    Ok(config)
}
