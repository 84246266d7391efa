//! Angle utilities used across the finder.
//!
//! The Hough angle θ is the direction of a track circle's centre seen from
//! the reference point. A circle is described twice in (θ, r) space: once as
//! (θ, r) and once as (θ + π, −r). The search only covers θ ∈ [0, π), so
//! parameters are folded into that half-turn before comparison.

use std::f64::consts::{PI, TAU};

/// Normalizes an angle into the range [0, π).
#[inline]
pub fn normalize_half_turn(angle: f64) -> f64 {
    let norm = angle.rem_euclid(PI);
    if norm >= PI - 1e-12 {
        0.0
    } else {
        norm
    }
}

/// Normalizes an angle into the range [0, 2π).
#[inline]
pub fn normalize_full_turn(angle: f64) -> f64 {
    let norm = angle.rem_euclid(TAU);
    if norm >= TAU - 1e-12 {
        0.0
    } else {
        norm
    }
}

/// Folds a (centre angle, signed curvature) pair into the θ ∈ [0, π) half of
/// the Hough plane, flipping the curvature sign when the angle is mirrored.
#[inline]
pub fn fold_line_parameters(theta: f64, curvature: f64) -> (f64, f64) {
    let full = normalize_full_turn(theta);
    if full >= PI {
        (normalize_half_turn(full - PI), -curvature)
    } else {
        (full, curvature)
    }
}

/// Smallest unsigned difference between two angles on the full circle.
#[inline]
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(TAU);
    if diff > PI {
        TAU - diff
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn normalize_half_turn_basic() {
        assert!(approx_eq(normalize_half_turn(0.5), 0.5));
        assert!(approx_eq(normalize_half_turn(-FRAC_PI_2), FRAC_PI_2));
        assert!(approx_eq(normalize_half_turn(PI), 0.0));
        assert!(approx_eq(normalize_half_turn(3.0 * PI), 0.0));
    }

    #[test]
    fn fold_mirrors_curvature() {
        let (theta, curvature) = fold_line_parameters(1.25 * PI, 0.01);
        assert!(approx_eq(theta, 0.25 * PI));
        assert!(approx_eq(curvature, -0.01));

        let (theta, curvature) = fold_line_parameters(-0.25 * PI, 0.02);
        assert!(approx_eq(theta, 0.75 * PI));
        assert!(approx_eq(curvature, -0.02));

        let (theta, curvature) = fold_line_parameters(0.4, -0.03);
        assert!(approx_eq(theta, 0.4));
        assert!(approx_eq(curvature, -0.03));
    }

    #[test]
    fn angular_difference_handles_wrap() {
        assert!(approx_eq(angular_difference(0.1, TAU - 0.1), 0.2));
        assert!(approx_eq(angular_difference(0.0, PI), PI));
        assert!(approx_eq(
            angular_difference(FRAC_PI_2, -FRAC_PI_2),
            PI
        ));
    }
}
