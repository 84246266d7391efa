use crate::error::ConfigError;
use crate::hough::Candidate;
use serde::{Deserialize, Serialize};

/// Superlayer diversity thresholds.
///
/// A candidate passes when it touches at least `min_superlayers` distinct
/// superlayers, or when all its superlayers belong to `inner_superlayers` and
/// it touches at least `min_short_superlayers` of them (short tracks curling
/// inside the inner chamber).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiversityParams {
    pub min_superlayers: usize,
    pub min_short_superlayers: usize,
    pub inner_superlayers: Vec<u8>,
    /// Also require a hit in superlayer 0.
    pub require_innermost: bool,
}

impl Default for DiversityParams {
    fn default() -> Self {
        Self {
            min_superlayers: 3,
            min_short_superlayers: 2,
            inner_superlayers: vec![0, 1, 2],
            require_innermost: false,
        }
    }
}

impl DiversityParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_superlayers == 0 {
            return Err(ConfigError::threshold(
                "min_superlayers",
                "must be at least 1",
            ));
        }
        if self.min_short_superlayers == 0 || self.min_short_superlayers > self.min_superlayers {
            return Err(ConfigError::threshold(
                "min_short_superlayers",
                format!(
                    "must be in 1..={} (got {})",
                    self.min_superlayers, self.min_short_superlayers
                ),
            ));
        }
        Ok(())
    }
}

/// Pure candidate filter on distinct superlayer coverage.
#[derive(Clone, Debug, Default)]
pub struct SuperlayerDiversityFilter {
    params: DiversityParams,
}

impl SuperlayerDiversityFilter {
    pub fn new(params: DiversityParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &DiversityParams {
        &self.params
    }

    pub fn accepts(&self, candidate: &Candidate) -> bool {
        let p = &self.params;
        if p.require_innermost && !candidate.superlayers.contains(&0) {
            return false;
        }
        let count = candidate.superlayer_count();
        if count >= p.min_superlayers {
            return true;
        }
        count >= p.min_short_superlayers
            && candidate
                .superlayers
                .iter()
                .all(|sl| p.inner_superlayers.contains(sl))
    }

    /// Keeps accepted candidates in their original order.
    pub fn filter(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates.into_iter().filter(|c| self.accepts(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hough::{CandidateId, ParameterRectangle};
    use crate::types::HitIndex;

    fn candidate(superlayers: &[u8]) -> Candidate {
        Candidate {
            id: CandidateId(0),
            rect: ParameterRectangle {
                level: 0,
                ix: 0,
                iy: 0,
                theta: [0.0, 1.0],
                offset: [0.0, 1.0],
            },
            hits: (0..superlayers.len() as u32).map(HitIndex).collect(),
            superlayers: superlayers.to_vec(),
            level: 0,
        }
    }

    #[test]
    fn long_and_short_tracks() {
        let filter = SuperlayerDiversityFilter::new(DiversityParams::default()).expect("valid");
        assert!(filter.accepts(&candidate(&[2, 4, 6])));
        assert!(filter.accepts(&candidate(&[0, 1])));
        assert!(!filter.accepts(&candidate(&[1, 4])));
        assert!(!filter.accepts(&candidate(&[0])));
    }

    #[test]
    fn innermost_requirement() {
        let filter = SuperlayerDiversityFilter::new(DiversityParams {
            require_innermost: true,
            ..Default::default()
        })
        .expect("valid");
        assert!(!filter.accepts(&candidate(&[2, 4, 6])));
        assert!(filter.accepts(&candidate(&[0, 4, 6])));
    }

    #[test]
    fn lower_threshold_keeps_superset() {
        let strict = SuperlayerDiversityFilter::new(DiversityParams {
            min_superlayers: 4,
            ..Default::default()
        })
        .expect("valid");
        let loose = SuperlayerDiversityFilter::new(DiversityParams::default()).expect("valid");
        let all = vec![
            candidate(&[0, 1, 2, 3]),
            candidate(&[3, 4, 5]),
            candidate(&[0, 2]),
            candidate(&[5]),
        ];
        let kept_strict = strict.filter(all.clone());
        let kept_loose = loose.filter(all);
        assert!(kept_strict.iter().all(|c| kept_loose.contains(c)));
        assert_eq!(kept_loose.len(), 3);
    }

    #[test]
    fn short_threshold_must_not_exceed_main_threshold() {
        let params = DiversityParams {
            min_superlayers: 2,
            min_short_superlayers: 3,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::InvalidThreshold { .. })
        ));
    }
}
