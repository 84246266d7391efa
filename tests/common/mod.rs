#![allow(dead_code)]

use conformal_track_finder::hough::SearchParams;
use conformal_track_finder::synthetic::{generate_event, SyntheticConfig, SyntheticEvent};
use conformal_track_finder::{DetectorGeometry, FinderParams, HitPool, Track, TrackParameters};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Coarse search grid: both ambiguity branches of a hit stay in
/// neighbouring cells, so a clean track forms a single cluster.
pub fn coarse_search(min_hits: usize) -> SearchParams {
    SearchParams {
        theta_bins: 64,
        offset_bins: 32,
        min_hits,
        ..Default::default()
    }
}

pub fn coarse_params(min_hits: usize) -> FinderParams {
    FinderParams {
        search: coarse_search(min_hits),
        ..Default::default()
    }
}

/// Noise-free event made of the given circles.
pub fn clean_event(geometry: &DetectorGeometry, tracks: &[(f64, f64)]) -> SyntheticEvent {
    event_with_noise(geometry, tracks, 0, 7)
}

pub fn event_with_noise(
    geometry: &DetectorGeometry,
    tracks: &[(f64, f64)],
    noise_hits: usize,
    seed: u64,
) -> SyntheticEvent {
    let config = SyntheticConfig {
        seed,
        tracks: tracks
            .iter()
            .map(|&(theta, curvature)| TrackParameters { theta, curvature })
            .collect(),
        random_tracks: 0,
        noise_hits,
        ..Default::default()
    };
    generate_event(geometry, &config)
}

/// Sorted producer ids of a track's hits.
pub fn track_ids(pool: &HitPool, track: &Track) -> Vec<u32> {
    let mut ids = SyntheticEvent::hit_ids(pool, track);
    ids.sort_unstable();
    ids
}

/// Every hit appears in at most one track.
pub fn assert_disjoint(tracks: &[Track], pool_len: usize) {
    let mut seen = vec![false; pool_len];
    for track in tracks {
        for hit in &track.hits {
            assert!(!seen[hit.get()], "hit {:?} claimed twice", hit);
            seen[hit.get()] = true;
        }
    }
}
