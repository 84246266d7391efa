//! Synthetic events for tests and demos.
//!
//! Tracks are circles through the reference point described by
//! [`TrackParameters`]. For every layer the crossing point of the circle is
//! snapped to the nearest sense wire and the drift length is the distance of
//! that wire from the circle, so a noise-free track is exactly tangent to its
//! drift circles. Noise hits sit on random wires with random drift lengths.

use crate::angle::{angular_difference, fold_line_parameters};
use crate::geometry::DetectorGeometry;
use crate::types::{HitRecord, Track, TrackParameters};
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyntheticConfig {
    pub seed: u64,
    /// Explicit tracks.
    pub tracks: Vec<TrackParameters>,
    /// Additional tracks with random direction and curvature.
    pub random_tracks: usize,
    /// Range of the random curvature magnitude (1/cm).
    pub curvature_range: [f64; 2],
    pub noise_hits: usize,
    /// Drift uncertainty attached to every hit (cm).
    pub drift_sigma: f64,
    /// Uniform smearing applied to the true drift length (cm).
    pub drift_smearing: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            tracks: Vec::new(),
            random_tracks: 3,
            curvature_range: [0.002, 0.012],
            noise_hits: 40,
            drift_sigma: 0.02,
            drift_smearing: 0.0,
        }
    }
}

/// Generated circle with the ids of the hits it produced.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TruthTrack {
    /// Folded into θ ∈ [0, π).
    pub params: TrackParameters,
    pub hit_ids: Vec<u32>,
}

impl TruthTrack {
    /// Whether `params` describe the same circle within the tolerances.
    pub fn matches(&self, params: &TrackParameters, theta_tol: f64, curvature_tol: f64) -> bool {
        let (theta, curvature) = fold_line_parameters(params.theta, params.curvature);
        let direct = angular_difference(theta, self.params.theta) <= theta_tol
            && (curvature - self.params.curvature).abs() <= curvature_tol;
        // Near θ = 0 the folded twin sits at θ ≈ π with opposite curvature.
        let mirrored = angular_difference(theta + PI, self.params.theta) <= theta_tol
            && (curvature + self.params.curvature).abs() <= curvature_tol;
        direct || mirrored
    }

    /// Fraction of the track's hit ids present among `ids`.
    pub fn efficiency(&self, ids: &[u32]) -> f64 {
        if self.hit_ids.is_empty() {
            return 0.0;
        }
        let found = self.hit_ids.iter().filter(|id| ids.contains(id)).count();
        found as f64 / self.hit_ids.len() as f64
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntheticEvent {
    pub records: Vec<HitRecord>,
    pub truth: Vec<TruthTrack>,
}

impl SyntheticEvent {
    /// Producer ids of the hits of an output track.
    pub fn hit_ids(pool: &crate::types::HitPool, track: &Track) -> Vec<u32> {
        track.hits.iter().map(|&h| pool.get(h).id().0).collect()
    }
}

pub fn generate_event(geometry: &DetectorGeometry, config: &SyntheticConfig) -> SyntheticEvent {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut tracks = config.tracks.clone();
    for _ in 0..config.random_tracks {
        let [lo, hi] = config.curvature_range;
        let magnitude = if hi > lo { rng.gen_range(lo..hi) } else { lo };
        let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        tracks.push(TrackParameters {
            theta: rng.gen_range(0.0..TAU),
            curvature: sign * magnitude,
        });
    }

    let mut records = Vec::new();
    let mut truth = Vec::new();
    for params in &tracks {
        let mut hit_ids = Vec::new();
        for layer in 0..geometry.layer_count() as u16 {
            let Some(record) = track_hit(geometry, params, layer, records.len() as u32, config, &mut rng)
            else {
                continue;
            };
            hit_ids.push(record.id);
            records.push(record);
        }
        let (theta, curvature) = fold_line_parameters(params.theta, params.curvature);
        truth.push(TruthTrack {
            params: TrackParameters { theta, curvature },
            hit_ids,
        });
    }

    for _ in 0..config.noise_hits {
        let layer = rng.gen_range(0..geometry.layer_count()) as u16;
        let (Some(radius), Some(&wires)) = (
            geometry.layer_radius(layer),
            geometry.wires_per_layer.get(layer as usize),
        ) else {
            continue;
        };
        let wire = rng.gen_range(0..wires);
        let position = wire_position(layer, wire, radius, wires);
        let half_cell = PI * radius / wires as f64;
        records.push(HitRecord {
            id: records.len() as u32,
            wire,
            layer,
            position: [position.x, position.y, 0.0],
            drift_length: rng.gen_range(0.0..half_cell),
            drift_sigma: config.drift_sigma,
            background: false,
        });
    }

    SyntheticEvent { records, truth }
}

fn track_hit(
    geometry: &DetectorGeometry,
    params: &TrackParameters,
    layer: u16,
    id: u32,
    config: &SyntheticConfig,
    rng: &mut StdRng,
) -> Option<HitRecord> {
    let radius = geometry.layer_radius(layer)?;
    let wires = *geometry.wires_per_layer.get(layer as usize)?;
    let crossing = layer_crossing(geometry, params, radius)?;

    let offset = stagger(layer, wires);
    let pitch = TAU / wires as f64;
    let phi = crossing.y.atan2(crossing.x);
    let wire = ((phi - offset) / pitch).round().rem_euclid(wires as f64) as u16;
    let position = wire_position(layer, wire, radius, wires);
    let center = params.center()? + reference(geometry);
    let mut drift = ((position - center).norm() - params.radius()).abs();
    if config.drift_smearing > 0.0 {
        drift = (drift + rng.gen_range(-config.drift_smearing..config.drift_smearing)).abs();
    }
    Some(HitRecord {
        id,
        wire,
        layer,
        position: [position.x, position.y, 0.0],
        drift_length: drift,
        drift_sigma: config.drift_sigma,
        background: false,
    })
}

/// Outgoing intersection of the track circle with the layer circle centred
/// on the detector axis. The arm is chosen by the curvature sign.
fn layer_crossing(
    geometry: &DetectorGeometry,
    params: &TrackParameters,
    radius: f64,
) -> Option<Vector2<f64>> {
    let center = params.center()? + reference(geometry);
    let track_radius = params.radius();
    let d = center.norm();
    if d <= 0.0 || d > radius + track_radius || d < (radius - track_radius).abs() {
        return None;
    }
    let a = (radius * radius - track_radius * track_radius + d * d) / (2.0 * d);
    let h = (radius * radius - a * a).max(0.0).sqrt();
    let u = center / d;
    let perp = Vector2::new(-u.y, u.x);
    Some(u * a + perp * (h * params.curvature.signum()))
}

fn reference(geometry: &DetectorGeometry) -> Vector2<f64> {
    Vector2::new(geometry.reference_point[0], geometry.reference_point[1])
}

/// Odd layers are shifted by half a cell.
fn stagger(layer: u16, wires: u16) -> f64 {
    if layer % 2 == 1 {
        PI / wires.max(1) as f64
    } else {
        0.0
    }
}

fn wire_position(layer: u16, wire: u16, radius: f64, wires: u16) -> Vector2<f64> {
    let angle = stagger(layer, wires) + TAU * wire as f64 / wires.max(1) as f64;
    Vector2::new(radius * angle.cos(), radius * angle.sin())
}
