use crate::error::{Axis, ConfigError};
use serde::{Deserialize, Serialize};

/// Deepest tree level accepted by the search.
pub const MAX_TREE_LEVEL: u32 = 20;

/// How the curve/rectangle crossing test samples a hit's locus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CrossingTest {
    /// Locus evaluated at the two angular edges only (linear local
    /// approximation).
    Corners,
    /// Corners plus the locus extremum when it falls inside the cell.
    #[default]
    CornersAndExtremum,
}

/// Options of the recursive Hough search.
///
/// - `theta_range`: Hough angle interval (radians), normally `[0, π]`.
/// - `offset_range`: signed offset (curvature, 1/cm) interval.
/// - `theta_bins` / `offset_bins`: requested resolution per axis. Each axis is
///   bisected until its cell count reaches the largest power of two not above
///   the resolution.
/// - `max_level`: overrides the depth derived from the resolutions.
/// - `min_hits`: nodes holding fewer hits are pruned.
/// - `axial_only`: ignore hits in stereo superlayers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchParams {
    pub theta_range: [f64; 2],
    pub offset_range: [f64; 2],
    pub theta_bins: usize,
    pub offset_bins: usize,
    pub max_level: Option<u32>,
    pub min_hits: usize,
    pub axial_only: bool,
    pub crossing_test: CrossingTest,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            theta_range: [0.0, std::f64::consts::PI],
            offset_range: [-0.15, 0.15],
            theta_bins: 256,
            offset_bins: 256,
            max_level: None,
            min_hits: 10,
            axial_only: false,
            crossing_test: CrossingTest::default(),
        }
    }
}

/// Smallest depth `d` such that `2^(d+1)` exceeds `bins`.
pub fn depth_for_resolution(bins: usize) -> u32 {
    let mut depth = 0u32;
    while depth < 63 && (1u128 << (depth + 1)) <= bins as u128 {
        depth += 1;
    }
    depth
}

impl SearchParams {
    /// Subdivision depth of the θ and offset axes.
    pub fn axis_depths(&self) -> (u32, u32) {
        match self.max_level {
            Some(level) => (level, level),
            None => (
                depth_for_resolution(self.theta_bins),
                depth_for_resolution(self.offset_bins),
            ),
        }
    }

    /// Level at which nodes become terminal.
    pub fn max_level(&self) -> u32 {
        let (t, r) = self.axis_depths();
        t.max(r)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_axis(Axis::Theta, self.theta_range, self.theta_bins)?;
        validate_axis(Axis::Offset, self.offset_range, self.offset_bins)?;
        let level = self.max_level();
        if level > MAX_TREE_LEVEL {
            return Err(ConfigError::DepthTooLarge {
                level,
                max: MAX_TREE_LEVEL,
            });
        }
        if self.min_hits == 0 {
            return Err(ConfigError::threshold("min_hits", "must be at least 1"));
        }
        Ok(())
    }
}

fn validate_axis(axis: Axis, range: [f64; 2], bins: usize) -> Result<(), ConfigError> {
    if bins == 0 {
        return Err(ConfigError::ZeroResolution { axis, bins });
    }
    let [lo, hi] = range;
    if !(lo.is_finite() && hi.is_finite()) {
        return Err(ConfigError::NonFiniteAxis { axis });
    }
    if lo > hi {
        return Err(ConfigError::InvertedAxis { axis, lo, hi });
    }
    if lo == hi {
        return Err(ConfigError::EmptyAxis { axis, lo, hi });
    }
    Ok(())
}
