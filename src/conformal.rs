//! Conformal map of the transverse plane.
//!
//! `(x, y) → (2x/(x²+y²), 2y/(x²+y²))`, measured from the geometry reference
//! point. Circles through the reference point become straight lines
//! `x′·cosθ + y′·sinθ = r` where θ is the direction of the circle centre and
//! `r` its signed curvature, so track finding becomes a linear Hough problem.
//!
//! The map is an inversion scaled by two; a circle that does not contain the
//! reference point (a drift circle) maps to another circle, which is what
//! [`ConformalMapper::map_hit`] uses to keep the drift information exact.

use crate::geometry::DetectorGeometry;
use crate::types::Hit;
use nalgebra::Vector2;

const MIN_RADIUS_SQ: f64 = 1e-12;

/// Transformed view of a hit used by the Hough search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConformalHit {
    /// Image of the wire position.
    pub position: Vector2<f64>,
    /// Centre of the image of the drift circle.
    pub drift_center: Vector2<f64>,
    /// Radius of the image of the drift circle.
    pub drift_radius: f64,
    /// Drift uncertainty carried through the map.
    pub drift_sigma: f64,
}

/// Maps planar positions relative to the geometry reference point.
#[derive(Clone, Copy, Debug)]
pub struct ConformalMapper {
    reference: Vector2<f64>,
}

impl ConformalMapper {
    pub fn new(geometry: &DetectorGeometry) -> Self {
        Self {
            reference: Vector2::new(geometry.reference_point[0], geometry.reference_point[1]),
        }
    }

    /// Maps a planar position. Undefined at the reference point, where `None`
    /// is returned and the caller must skip the hit.
    pub fn map(&self, point: Vector2<f64>) -> Option<Vector2<f64>> {
        let p = point - self.reference;
        let r2 = p.norm_squared();
        if r2 < MIN_RADIUS_SQ || !r2.is_finite() {
            return None;
        }
        Some(p * (2.0 / r2))
    }

    /// Maps a hit together with its drift circle. Returns `None` when the wire
    /// sits on the reference point or when the drift circle encloses it.
    pub fn map_hit(&self, hit: &Hit) -> Option<ConformalHit> {
        let position = self.map(hit.xy())?;
        let w = hit.xy() - self.reference;
        let d = hit.drift_length();
        let denom = w.norm_squared() - d * d;
        if denom <= MIN_RADIUS_SQ {
            return None;
        }
        let scale = 2.0 / denom;
        Some(ConformalHit {
            position,
            drift_center: w * scale,
            drift_radius: d * scale,
            drift_sigma: hit.drift_sigma() * scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HitId;
    use nalgebra::Vector3;

    fn mapper() -> ConformalMapper {
        ConformalMapper::new(&DetectorGeometry::default())
    }

    #[test]
    fn maps_reference_example() {
        let m = mapper();
        let a = m.map(Vector2::new(1.0, 1.0)).expect("defined");
        let b = m.map(Vector2::new(3.0, 3.0)).expect("defined");
        assert!((a - Vector2::new(1.0, 1.0)).norm() < 1e-12);
        assert!((b - Vector2::new(1.0 / 3.0, 1.0 / 3.0)).norm() < 1e-12);
    }

    #[test]
    fn origin_is_undefined() {
        assert!(mapper().map(Vector2::zeros()).is_none());
    }

    #[test]
    fn honours_reference_point() {
        let geometry = DetectorGeometry {
            reference_point: [1.0, 0.0],
            ..Default::default()
        };
        let m = ConformalMapper::new(&geometry);
        assert!(m.map(Vector2::new(1.0, 0.0)).is_none());
        let p = m.map(Vector2::new(3.0, 0.0)).expect("defined");
        assert!((p - Vector2::new(1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn circle_through_origin_becomes_line() {
        // Circle of radius 50 centred at (0, 50): x'·cos θ + y'·sin θ = 1/50 with θ = π/2.
        let m = mapper();
        for phi in [0.3f64, 0.8, 1.2, 2.0] {
            let p = Vector2::new(50.0 * phi.cos(), 50.0 + 50.0 * phi.sin());
            let q = m.map(p).expect("defined");
            assert!((q.y - 0.02).abs() < 1e-12, "y'={}", q.y);
        }
    }

    #[test]
    fn drift_circle_image_is_tangent_to_track_line() {
        // Track circle centred at (0, 50), radius 50. Wire 0.4 cm outside it.
        let geometry = DetectorGeometry::default();
        let m = ConformalMapper::new(&geometry);
        let phi = 0.7f64;
        let on_track = Vector2::new(50.0 * phi.cos(), 50.0 + 50.0 * phi.sin());
        let outward = (on_track - Vector2::new(0.0, 50.0)).normalize();
        let wire = on_track + outward * 0.4;
        let hit = Hit::new(
            &geometry,
            HitId(0),
            0,
            10,
            Vector3::new(wire.x, wire.y, 0.0),
            0.4,
            0.0,
        )
        .expect("known layer");
        let c = m.map_hit(&hit).expect("regular hit");
        let distance = (c.drift_center.y - 0.02).abs();
        assert!((distance - c.drift_radius).abs() < 1e-12);
    }
}
