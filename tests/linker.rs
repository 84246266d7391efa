mod common;

use common::{assert_disjoint, clean_event, coarse_params, init_logging};
use conformal_track_finder::{
    DetectorGeometry, HitIndex, HitPool, HitUsage, Track, TrackFinder, TrackId, TrackParameters,
};
use std::collections::BTreeSet;

fn track(pool: &HitPool, id: u32, hits: impl Iterator<Item = u32>) -> Track {
    Track::from_hits(
        pool,
        TrackId(id),
        hits.map(HitIndex).collect(),
        TrackParameters {
            theta: 1.0,
            curvature: 0.003,
        },
    )
}

#[test]
fn near_duplicate_tracks_merge_into_one() {
    init_logging();
    let geometry = DetectorGeometry::default();
    let event = clean_event(&geometry, &[(1.0, 0.003)]);
    let mut pool = HitPool::from_records(&geometry, &event.records);
    let n = pool.len() as u32;
    assert_eq!(n as usize, geometry.layer_count());

    // Two reconstructions of the same particle, each missing a few hits at
    // opposite ends.
    let a = track(&pool, 0, 0..n - 4);
    let b = track(&pool, 0, 4..n);
    let longest_input = a.len().max(b.len());

    let finder = TrackFinder::new(coarse_params(10), geometry).expect("valid params");
    let outcome = finder.link(&mut pool, &[vec![a], vec![b]]);

    assert_eq!(outcome.stats.tracks_in, 2);
    assert_eq!(outcome.stats.shared_hits, (n - 8) as usize);
    assert!(outcome.stats.bridges > 0);
    assert_eq!(outcome.tracks.len(), 1);
    assert_disjoint(&outcome.tracks, pool.len());
    let merged = &outcome.tracks[0];
    assert!(merged.len() > longest_input);
    assert_eq!(merged.len(), n as usize);
    assert!(merged.hits.iter().all(|&h| pool.get(h).usage() == HitUsage::Claimed));
}

#[test]
fn unrelated_tracks_pass_through_unchanged() {
    let geometry = DetectorGeometry::default();
    let event = clean_event(&geometry, &[(0.6, 0.004), (2.4, -0.005)]);
    let mut pool = HitPool::from_records(&geometry, &event.records);

    let first = track(&pool, 0, event.truth[0].hit_ids.iter().copied());
    let second = track(&pool, 0, event.truth[1].hit_ids.iter().copied());
    let expected: BTreeSet<Vec<HitIndex>> = [first.hits.clone(), second.hits.clone()]
        .into_iter()
        .collect();

    let finder = TrackFinder::new(coarse_params(10), geometry).expect("valid params");
    let outcome = finder.link(&mut pool, &[vec![first], vec![second]]);

    assert_eq!(outcome.stats.shared_hits, 0);
    assert_eq!(outcome.stats.passed_through, 2);
    assert_eq!(outcome.stats.dropped, 0);
    let found: BTreeSet<Vec<HitIndex>> = outcome.tracks.iter().map(|t| t.hits.clone()).collect();
    assert_eq!(found, expected);
    assert_eq!(outcome.tracks[0].id, TrackId(0));
    assert_eq!(outcome.tracks[1].id, TrackId(1));
}

#[test]
fn complete_input_track_is_never_dropped() {
    let geometry = DetectorGeometry::default();
    let event = clean_event(&geometry, &[(1.0, 0.003)]);
    let mut pool = HitPool::from_records(&geometry, &event.records);

    // Below every size threshold, but nothing competes for its hits.
    let stub = track(&pool, 0, [0u32, 1].into_iter());
    pool.claim(&stub);
    let finder = TrackFinder::new(coarse_params(10), geometry).expect("valid params");
    let outcome = finder.link(&mut pool, &[vec![stub.clone()]]);

    assert_eq!(outcome.tracks.len(), 1);
    assert_eq!(outcome.tracks[0].hits, stub.hits);
    assert_eq!(outcome.stats.passed_through, 1);
    assert_eq!(pool.get(HitIndex(0)).usage(), HitUsage::Claimed);
    assert_eq!(pool.get(HitIndex(2)).usage(), HitUsage::Free);
}

#[test]
fn hit_references_outside_the_pool_are_ignored() {
    let geometry = DetectorGeometry::default();
    let event = clean_event(&geometry, &[(1.0, 0.003)]);
    let mut pool = HitPool::from_records(&geometry, &event.records);
    let n = pool.len() as u32;

    let mut foreign = track(&pool, 0, 0..n);
    foreign.hits.push(HitIndex(n + 100));
    pool.claim(&foreign);

    let finder = TrackFinder::new(coarse_params(10), geometry).expect("valid params");
    let outcome = finder.link(&mut pool, &[vec![foreign]]);

    assert_eq!(outcome.tracks.len(), 1);
    assert_eq!(outcome.tracks[0].len(), n as usize);
    assert!(outcome.tracks[0].hits.iter().all(|h| h.get() < pool.len()));
    assert!(pool.hits().iter().all(|h| h.usage() == HitUsage::Claimed));
}
