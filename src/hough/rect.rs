use serde::Serialize;

/// Axis-aligned box in the (θ, offset) Hough plane, identified by its tree
/// level and cell indices. Owns no hits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRectangle {
    pub level: u32,
    pub ix: u32,
    pub iy: u32,
    pub theta: [f64; 2],
    pub offset: [f64; 2],
}

impl ParameterRectangle {
    pub fn center(&self) -> [f64; 2] {
        [
            0.5 * (self.theta[0] + self.theta[1]),
            0.5 * (self.offset[0] + self.offset[1]),
        ]
    }

    pub fn width(&self) -> f64 {
        self.theta[1] - self.theta[0]
    }

    pub fn height(&self) -> f64 {
        self.offset[1] - self.offset[0]
    }
}

/// Maps tree coordinates to rectangle bounds.
///
/// Bounds are always derived from the root range and the cell index rather
/// than by repeated halving, so neighbouring cells share bit-identical edges.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TreeLayout {
    pub theta_range: [f64; 2],
    pub offset_range: [f64; 2],
    pub theta_depth: u32,
    pub offset_depth: u32,
    pub max_level: u32,
}

impl TreeLayout {
    /// Number of θ subdivisions applied at `level`.
    fn theta_splits(&self, level: u32) -> u32 {
        level.min(self.theta_depth)
    }

    fn offset_splits(&self, level: u32) -> u32 {
        level.min(self.offset_depth)
    }

    /// Whether a node at `level` is bisected along θ / offset when filled.
    pub fn splits_at(&self, level: u32) -> (bool, bool) {
        (level < self.theta_depth, level < self.offset_depth)
    }

    pub fn root(&self) -> ParameterRectangle {
        self.rect(0, 0, 0)
    }

    pub fn rect(&self, level: u32, ix: u32, iy: u32) -> ParameterRectangle {
        let nx = (1u64 << self.theta_splits(level)) as f64;
        let ny = (1u64 << self.offset_splits(level)) as f64;
        let [t0, t1] = self.theta_range;
        let [r0, r1] = self.offset_range;
        let tw = (t1 - t0) / nx;
        let rh = (r1 - r0) / ny;
        let theta_hi = if ix as f64 + 1.0 >= nx {
            t1
        } else {
            t0 + (ix + 1) as f64 * tw
        };
        let offset_hi = if iy as f64 + 1.0 >= ny {
            r1
        } else {
            r0 + (iy + 1) as f64 * rh
        };
        ParameterRectangle {
            level,
            ix,
            iy,
            theta: [t0 + ix as f64 * tw, theta_hi],
            offset: [r0 + iy as f64 * rh, offset_hi],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> TreeLayout {
        TreeLayout {
            theta_range: [0.0, 1.0],
            offset_range: [-1.0, 1.0],
            theta_depth: 3,
            offset_depth: 1,
            max_level: 3,
        }
    }

    #[test]
    fn neighbouring_cells_share_edges() {
        let l = layout();
        let a = l.rect(3, 2, 0);
        let b = l.rect(3, 3, 0);
        assert_eq!(a.theta[1], b.theta[0]);
        assert!((a.width() - 0.125).abs() < 1e-12);
        // Offset axis stops splitting after level 1.
        assert!((a.height() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn last_cell_ends_on_root_edge() {
        let l = layout();
        let last = l.rect(3, 7, 1);
        assert_eq!(last.theta[1], 1.0);
        assert_eq!(last.offset[1], 1.0);
        assert_eq!(l.splits_at(0), (true, true));
        assert_eq!(l.splits_at(1), (true, false));
    }
}
