//! Merging of independently produced track sets.
//!
//! Every input track is cut into single-superlayer [`Segment`]s labelled with
//! the other tracks sharing their hits. Radially consecutive segments with a
//! common owner are related, optionally together with near-duplicate segments
//! of different tracks ("bridges"). Inside each connected component a
//! cellular automaton picks the heaviest chain, which becomes an output
//! track; its hits are claimed and the remaining segments are trimmed before
//! the next chain is searched. A hit therefore ends up in at most one output
//! track.

mod automaton;
pub mod ownership;
pub mod relations;
pub mod segment;

pub use ownership::{OwnershipIndex, TrackKey};
pub use relations::{Relation, RelationKind};
pub use segment::Segment;

use crate::error::ConfigError;
use crate::types::{HitIndex, HitPool, Track, TrackId};
use automaton::{best_path, SegmentPath};
use log::{debug, trace};
use relations::{build_relations, UnionFind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Near-duplicate segment detection.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeParams {
    /// Shared hits over the size of the smaller segment.
    pub min_overlap_fraction: f64,
    /// Pearson correlation of the shared hits' positions in both segments.
    pub min_correlation: f64,
}

impl Default for BridgeParams {
    fn default() -> Self {
        Self {
            min_overlap_fraction: 0.8,
            min_correlation: 0.9,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkerParams {
    /// Segments below this size are absorbed into a neighbour.
    pub min_segment_hits: usize,
    /// Largest superlayer step between related segments of different tracks.
    pub max_superlayer_gap: u8,
    /// `None` disables bridging.
    pub bridges: Option<BridgeParams>,
    /// Merged tracks below this size are dropped.
    pub min_output_hits: usize,
}

impl Default for LinkerParams {
    fn default() -> Self {
        Self {
            min_segment_hits: 3,
            max_superlayer_gap: 1,
            bridges: Some(BridgeParams::default()),
            min_output_hits: 3,
        }
    }
}

impl LinkerParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_segment_hits == 0 {
            return Err(ConfigError::threshold(
                "min_segment_hits",
                "must be at least 1",
            ));
        }
        if self.max_superlayer_gap == 0 {
            return Err(ConfigError::threshold(
                "max_superlayer_gap",
                "must be at least 1",
            ));
        }
        if self.min_output_hits == 0 {
            return Err(ConfigError::threshold(
                "min_output_hits",
                "must be at least 1",
            ));
        }
        if let Some(bridges) = &self.bridges {
            let f = bridges.min_overlap_fraction;
            if !(f > 0.0 && f <= 1.0) {
                return Err(ConfigError::threshold(
                    "min_overlap_fraction",
                    format!("must be in (0, 1] (got {f})"),
                ));
            }
            let c = bridges.min_correlation;
            if !(-1.0..=1.0).contains(&c) {
                return Err(ConfigError::threshold(
                    "min_correlation",
                    format!("must be in [-1, 1] (got {c})"),
                ));
            }
        }
        Ok(())
    }
}

/// Counters of one linking run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStats {
    pub tracks_in: usize,
    pub shared_hits: usize,
    pub segments: usize,
    pub relations: usize,
    pub bridges: usize,
    pub components: usize,
    pub tracks_out: usize,
    pub passed_through: usize,
    pub dropped: usize,
}

#[derive(Clone, Debug)]
pub struct LinkOutcome {
    pub tracks: Vec<Track>,
    pub stats: LinkStats,
}

#[derive(Clone, Debug, Default)]
pub struct SegmentLinker {
    params: LinkerParams,
}

impl SegmentLinker {
    pub fn new(params: LinkerParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &LinkerParams {
        &self.params
    }

    /// Merges `inputs` into one hit-disjoint track list. Output ids follow
    /// emission order.
    pub fn link(&self, pool: &HitPool, inputs: &[Vec<Track>]) -> LinkOutcome {
        let ownership = OwnershipIndex::build(pool.len(), inputs);
        let mut stats = LinkStats {
            tracks_in: inputs.iter().map(Vec::len).sum(),
            shared_hits: ownership.shared_hits(),
            ..Default::default()
        };

        let mut tracks: BTreeMap<TrackKey, &Track> = BTreeMap::new();
        for (input, set) in inputs.iter().enumerate() {
            for (index, track) in set.iter().enumerate() {
                let key = TrackKey {
                    input: input as u32,
                    index: index as u32,
                };
                tracks.insert(key, track);
            }
        }
        let mut ranked: Vec<TrackKey> = tracks.keys().copied().collect();
        ranked.sort_by(|a, b| {
            let (ta, tb) = (tracks[a], tracks[b]);
            tb.superlayer_count
                .cmp(&ta.superlayer_count)
                .then(tb.len().cmp(&ta.len()))
                .then(a.cmp(b))
        });
        let rank: BTreeMap<TrackKey, usize> =
            ranked.iter().enumerate().map(|(r, &k)| (k, r)).collect();

        let mut segments: Vec<Segment> = ranked
            .iter()
            .flat_map(|&key| {
                segment::split_track(pool, &ownership, key, tracks[&key], self.params.min_segment_hits)
            })
            .filter(|s| !s.is_empty())
            .collect();
        segments.sort_by(|a, b| {
            a.superlayer
                .cmp(&b.superlayer)
                .then(a.inner_radius.total_cmp(&b.inner_radius))
                .then(rank[&a.track].cmp(&rank[&b.track]))
                .then(a.order.cmp(&b.order))
        });
        stats.segments = segments.len();

        let all: Vec<usize> = (0..segments.len()).collect();
        let relations = build_relations(&segments, &all, &self.params);
        stats.relations = relations.len();
        stats.bridges = relations
            .iter()
            .filter(|r| r.kind == RelationKind::Bridge)
            .count();

        let mut forest = UnionFind::new(segments.len());
        for relation in &relations {
            forest.union(relation.from, relation.to);
        }
        // Segments sharing hits compete for them and belong together.
        let mut first_holder: Vec<Option<usize>> = vec![None; pool.len()];
        for (i, segment) in segments.iter().enumerate() {
            for &hit in &segment.hits {
                match first_holder[hit.get()] {
                    Some(j) => forest.union(i, j),
                    None => first_holder[hit.get()] = Some(i),
                }
            }
        }
        let components = forest.components();
        stats.components = components.len();

        let mut claimed = vec![false; pool.len()];
        let mut output: Vec<Track> = Vec::new();
        for component in components {
            let mut alive = component;
            loop {
                for &i in &alive {
                    let segment = &mut segments[i];
                    let before = segment.len();
                    segment.hits.retain(|h| !claimed[h.get()]);
                    if segment.len() != before && !segment.is_empty() {
                        segment.refresh_radii(pool);
                    }
                }
                alive.retain(|&i| !segments[i].is_empty());
                if alive.is_empty() {
                    break;
                }
                let relations = build_relations(&segments, &alive, &self.params);
                let Some(path) = best_path(&segments, &alive, &relations, |s| rank[&s.track])
                else {
                    break;
                };
                for &i in &path.nodes {
                    for &hit in &segments[i].hits {
                        claimed[hit.get()] = true;
                    }
                }
                match self.emit(pool, &segments, &path, &tracks, &rank, output.len()) {
                    Emitted::PassThrough(track) => {
                        stats.passed_through += 1;
                        output.push(track);
                    }
                    Emitted::Merged(track) => output.push(track),
                    Emitted::Dropped(size) => {
                        trace!("dropped merged path with {size} hits");
                        stats.dropped += 1;
                    }
                }
            }
        }
        stats.tracks_out = output.len();
        debug!(
            "linked {} tracks into {} ({} segments, {} relations, {} bridges, {} components)",
            stats.tracks_in,
            stats.tracks_out,
            stats.segments,
            stats.relations,
            stats.bridges,
            stats.components
        );
        LinkOutcome {
            tracks: output,
            stats,
        }
    }

    fn emit(
        &self,
        pool: &HitPool,
        segments: &[Segment],
        path: &SegmentPath,
        tracks: &BTreeMap<TrackKey, &Track>,
        rank: &BTreeMap<TrackKey, usize>,
        next_id: usize,
    ) -> Emitted {
        let id = TrackId(next_id as u32);
        let mut hits: Vec<HitIndex> = Vec::new();
        let mut contribution: BTreeMap<TrackKey, usize> = BTreeMap::new();
        for &i in &path.nodes {
            let segment = &segments[i];
            *contribution.entry(segment.track).or_default() += segment.len();
            for &hit in &segment.hits {
                if !hits.contains(&hit) {
                    hits.push(hit);
                }
            }
        }

        if contribution.len() == 1 {
            if let Some((key, _)) = contribution.iter().next() {
                let original = tracks[key];
                let mut own: Vec<HitIndex> = original.hits.clone();
                own.sort_unstable();
                own.dedup();
                let mut path_hits = hits.clone();
                path_hits.sort_unstable();
                if own == path_hits {
                    return Emitted::PassThrough(Track {
                        id,
                        ..original.clone()
                    });
                }
            }
        }

        if hits.len() < self.params.min_output_hits {
            return Emitted::Dropped(hits.len());
        }
        let params = contribution
            .iter()
            .max_by_key(|&(key, n)| (*n, std::cmp::Reverse(rank[key])))
            .map(|(key, _)| tracks[key].params)
            .unwrap_or_default();
        Emitted::Merged(Track::from_hits(pool, id, hits, params))
    }
}

enum Emitted {
    PassThrough(Track),
    Merged(Track),
    Dropped(usize),
}
