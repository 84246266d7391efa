//! Parameter types configuring the finder stages.
//!
//! Every group deserializes with `#[serde(default)]`, so a config file only
//! needs to name the knobs it changes. [`FinderParams::validate`] runs before
//! the first event.

use crate::cluster::{ClusterParams, DiversityParams};
use crate::error::ConfigError;
use crate::hough::SearchParams;
use crate::linker::LinkerParams;
use serde::{Deserialize, Serialize};

/// Finder-wide parameters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinderParams {
    /// Primary Hough search.
    pub search: SearchParams,
    pub diversity: DiversityParams,
    pub cluster: ClusterParams,
    /// Decreasing hit thresholds of the primary passes.
    pub schedule: StepSchedule,
    /// Independent second search over the hits free at event start. Its
    /// tracks are merged with the primary ones by the segment linker.
    pub secondary: Option<SearchParams>,
    pub linker: LinkerParams,
}

impl FinderParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.search.validate()?;
        self.diversity.validate()?;
        self.cluster.validate()?;
        self.schedule.validate(self.search.min_hits)?;
        if let Some(secondary) = &self.secondary {
            secondary.validate()?;
        }
        self.linker.validate()?;
        Ok(())
    }
}

/// Stepped thresholds: the first pass keeps only cells with at least
/// `start_hits` hits, each following pass scales the threshold by
/// `step_scale`, and the last pass runs at the search `min_hits`. Without
/// `start_hits` a single pass at `min_hits` is made.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StepSchedule {
    pub start_hits: Option<usize>,
    pub step_scale: f64,
}

impl Default for StepSchedule {
    fn default() -> Self {
        Self {
            start_hits: None,
            step_scale: 0.75,
        }
    }
}

impl StepSchedule {
    pub fn validate(&self, min_hits: usize) -> Result<(), ConfigError> {
        if !(self.step_scale > 0.0 && self.step_scale < 1.0) {
            return Err(ConfigError::InvalidSchedule(format!(
                "step scale {} must lie in (0, 1)",
                self.step_scale
            )));
        }
        if let Some(start) = self.start_hits {
            if start < min_hits {
                return Err(ConfigError::InvalidSchedule(format!(
                    "start threshold {start} is below min_hits {min_hits}"
                )));
            }
        }
        Ok(())
    }

    /// Strictly decreasing thresholds ending at `min_hits`.
    pub fn thresholds(&self, min_hits: usize) -> Vec<usize> {
        let Some(start) = self.start_hits else {
            return vec![min_hits];
        };
        let mut out = Vec::new();
        let mut current = start as f64;
        while current.floor() as usize > min_hits {
            let value = current.floor() as usize;
            if out.last() != Some(&value) {
                out.push(value);
            }
            current *= self.step_scale;
        }
        out.push(min_hits);
        out
    }
}
