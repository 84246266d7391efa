//! Hit locus versus parameter rectangle test.
//!
//! A hit whose transformed drift circle has centre `(x′, y′)` and radius `ρ`
//! traces two sinusoids in the Hough plane, one per left/right branch:
//! `r_s(θ) = x′·cosθ + y′·sinθ + s·ρ`, `s = ±1`. Widening each by the
//! transformed drift sigma gives a band; the rectangle is crossed when the
//! band of either branch reaches it.

use super::options::CrossingTest;
use super::rect::ParameterRectangle;
use crate::conformal::ConformalHit;
use std::f64::consts::PI;

/// Angular slack applied to the sampled rectangle edges.
const EDGE_SLACK: f64 = 1e-10;

#[derive(Clone, Copy, Debug, Default)]
pub struct CurveBoundEvaluator {
    mode: CrossingTest,
}

impl CurveBoundEvaluator {
    pub fn new(mode: CrossingTest) -> Self {
        Self { mode }
    }

    /// Returns `true` when either ambiguity branch of `hit` enters `rect`.
    pub fn crosses(&self, hit: &ConformalHit, rect: &ParameterRectangle) -> bool {
        let [t1, t2] = rect.theta;
        let mut samples = [0.0f64; 8];
        samples[0] = t1 - EDGE_SLACK;
        samples[1] = t2 + EDGE_SLACK;
        let mut n = 2;
        if self.mode == CrossingTest::CornersAndExtremum {
            let phase = hit.drift_center.y.atan2(hit.drift_center.x);
            let mut k = ((t1 - phase) / PI).ceil();
            while n < samples.len() {
                let t = phase + k * PI;
                if t >= t2 {
                    break;
                }
                if t > t1 {
                    samples[n] = t;
                    n += 1;
                }
                k += 1.0;
            }
        }
        let samples = &samples[..n];

        if branch_crosses(hit, rect, samples, 1.0) {
            return true;
        }
        hit.drift_radius > 0.0 && branch_crosses(hit, rect, samples, -1.0)
    }
}

fn branch_crosses(
    hit: &ConformalHit,
    rect: &ParameterRectangle,
    samples: &[f64],
    sign: f64,
) -> bool {
    let [r_lo, r_hi] = rect.offset;
    let sigma = hit.drift_sigma;
    let mut all_above = true;
    let mut all_below = true;
    for &theta in samples {
        let r = hit.drift_center.x * theta.cos()
            + hit.drift_center.y * theta.sin()
            + sign * hit.drift_radius;
        for d in [r_lo - (r + sigma), r_hi - (r - sigma)] {
            all_above &= d > 0.0;
            all_below &= d < 0.0;
        }
    }
    // Zero differences fall in neither set and count as a crossing.
    !(all_above || all_below)
}
