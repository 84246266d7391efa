//! Event pipeline wiring the finder stages.
//!
//! [`TrackFinder`] maps the hits conformally, runs the Hough search in passes
//! of decreasing hit thresholds, filters and clusters the terminal cells,
//! turns clusters into tracks and claims their hits. When a secondary search
//! is configured its tracks are merged with the primary ones by the segment
//! linker.
//!
//! Typical usage:
//! ```no_run
//! use conformal_track_finder::{DetectorGeometry, FinderParams, HitPool, TrackFinder};
//!
//! # fn example(mut pool: HitPool) -> Result<(), conformal_track_finder::ConfigError> {
//! let finder = TrackFinder::new(FinderParams::default(), DetectorGeometry::default())?;
//! let report = finder.process(&mut pool);
//! println!("{} tracks", report.tracks.len());
//! # Ok(())
//! # }
//! ```
use super::params::FinderParams;
use crate::angle::fold_line_parameters;
use crate::cluster::{CandidateClusterer, SuperlayerDiversityFilter};
use crate::conformal::{ConformalHit, ConformalMapper};
use crate::diagnostics::{
    FinderReport, FinderTrace, InputDescriptor, LinkingStage, SearchPassStage, TimingBreakdown,
};
use crate::error::ConfigError;
use crate::geometry::DetectorGeometry;
use crate::hough::QuadTreeSearch;
use crate::linker::{LinkOutcome, SegmentLinker};
use crate::types::{HitIndex, HitPool, HitUsage, Track, TrackId, TrackParameters};
use log::debug;
use rayon::prelude::*;
use std::time::Instant;

/// Conformal Hough track finder for one detector geometry.
#[derive(Clone, Debug)]
pub struct TrackFinder {
    params: FinderParams,
    geometry: DetectorGeometry,
    mapper: ConformalMapper,
    search: QuadTreeSearch,
    secondary: Option<QuadTreeSearch>,
    filter: SuperlayerDiversityFilter,
    clusterer: CandidateClusterer,
    linker: SegmentLinker,
}

impl TrackFinder {
    /// Validates `params` and `geometry`; nothing is processed on error.
    pub fn new(params: FinderParams, geometry: DetectorGeometry) -> Result<Self, ConfigError> {
        geometry.validate()?;
        params.validate()?;
        let search = QuadTreeSearch::new(params.search.clone(), &geometry)?;
        let secondary = params
            .secondary
            .clone()
            .map(|p| QuadTreeSearch::new(p, &geometry))
            .transpose()?;
        Ok(Self {
            mapper: ConformalMapper::new(&geometry),
            search,
            secondary,
            filter: SuperlayerDiversityFilter::new(params.diversity.clone())?,
            clusterer: CandidateClusterer::new(params.cluster.clone())?,
            linker: SegmentLinker::new(params.linker.clone())?,
            params,
            geometry,
        })
    }

    pub fn params(&self) -> &FinderParams {
        &self.params
    }

    pub fn geometry(&self) -> &DetectorGeometry {
        &self.geometry
    }

    /// Finds tracks among the free hits of `pool` and claims their hits.
    pub fn process(&self, pool: &mut HitPool) -> FinderReport {
        let total_start = Instant::now();
        let mut trace = FinderTrace::default();
        let mut timings = TimingBreakdown::default();

        let map_start = Instant::now();
        let (mapped, input) = self.map_hits(pool);
        timings.record_since("conformal", map_start);
        trace.input = input;
        let free_at_start = pool.free_indices();

        let search_start = Instant::now();
        let mut primary: Vec<Track> = Vec::new();
        for min_hits in self.params.schedule.thresholds(self.params.search.min_hits) {
            let search = self.search.with_min_hits(min_hits);
            let hits = pool.free_indices();
            let (tracks, stage) = self.run_pass(pool, &mapped, &search, &hits, primary.len());
            for track in &tracks {
                pool.claim(track);
            }
            primary.extend(tracks);
            trace.passes.push(stage);
        }
        timings.record_since("search", search_start);

        let tracks = match &self.secondary {
            None => primary,
            Some(secondary) => {
                let start = Instant::now();
                let (tracks, stage) =
                    self.run_pass(pool, &mapped, secondary, &free_at_start, 0);
                trace.secondary = Some(stage);
                timings.record_since("secondary", start);

                let start = Instant::now();
                let (outcome, released) = self.relink(pool, &[primary, tracks]);
                trace.linking = Some(LinkingStage {
                    stats: outcome.stats,
                    released_hits: released,
                });
                timings.record_since("linking", start);
                outcome.tracks
            }
        };

        timings.total_ms = crate::diagnostics::elapsed_ms(total_start);
        trace.timings = timings;
        debug!("event done: {}", trace.summary());
        FinderReport { tracks, trace }
    }

    /// Processes independent events in parallel, one event per worker.
    pub fn process_events(&self, pools: &mut [HitPool]) -> Vec<FinderReport> {
        pools.par_iter_mut().map(|pool| self.process(pool)).collect()
    }

    /// Merges externally produced track sets: the hits of every input track
    /// are released and the merged tracks claim theirs.
    pub fn link(&self, pool: &mut HitPool, sets: &[Vec<Track>]) -> LinkOutcome {
        self.relink(pool, sets).0
    }

    fn relink(&self, pool: &mut HitPool, sets: &[Vec<Track>]) -> (LinkOutcome, usize) {
        let claimed_before = pool
            .hits()
            .iter()
            .filter(|h| h.usage() == HitUsage::Claimed)
            .count();
        for track in sets.iter().flatten() {
            pool.release(track);
        }
        let claimed_after = pool
            .hits()
            .iter()
            .filter(|h| h.usage() == HitUsage::Claimed)
            .count();
        let outcome = self.linker.link(pool, sets);
        for track in &outcome.tracks {
            pool.claim(track);
        }
        (outcome, claimed_before - claimed_after)
    }

    fn map_hits(&self, pool: &HitPool) -> (Vec<Option<ConformalHit>>, InputDescriptor) {
        let mut input = InputDescriptor {
            hits: pool.len(),
            ..Default::default()
        };
        let mapped = pool
            .iter()
            .map(|(index, hit)| {
                match hit.usage() {
                    HitUsage::Background => {
                        input.background += 1;
                        return None;
                    }
                    HitUsage::Free => input.free += 1,
                    HitUsage::Claimed => {}
                }
                if self.mapper.map(hit.xy()).is_none() {
                    debug!("hit {:?} sits on the reference point, skipped", index);
                    input.skipped_origin += 1;
                    return None;
                }
                match self.mapper.map_hit(hit) {
                    Some(c) => {
                        input.mapped += 1;
                        Some(c)
                    }
                    None => {
                        debug!("drift circle of hit {:?} encloses the reference point, skipped", index);
                        input.skipped_degenerate += 1;
                        None
                    }
                }
            })
            .collect();
        (mapped, input)
    }

    /// One search → filter → cluster → track pass over `hits`. Tracks are
    /// built best cluster first; a later track loses the hits already taken
    /// and is dropped when it falls below the pass threshold.
    fn run_pass(
        &self,
        pool: &HitPool,
        mapped: &[Option<ConformalHit>],
        search: &QuadTreeSearch,
        hits: &[HitIndex],
        first_id: usize,
    ) -> (Vec<Track>, SearchPassStage) {
        let min_hits = search.params().min_hits;
        let outcome = search.search(pool, mapped, hits);
        let candidates = outcome.candidates.len();
        let accepted = self.filter.filter(outcome.candidates);
        let mut clusters = self.clusterer.cluster(&accepted);
        clusters.sort_by(|a, b| {
            b.superlayer_count()
                .cmp(&a.superlayer_count())
                .then(b.hits.len().cmp(&a.hits.len()))
        });

        let mut taken = vec![false; pool.len()];
        let mut tracks = Vec::new();
        for cluster in &clusters {
            let own: Vec<HitIndex> = cluster
                .hits
                .iter()
                .copied()
                .filter(|h| !taken[h.get()])
                .collect();
            if own.len() < min_hits {
                continue;
            }
            for h in &own {
                taken[h.get()] = true;
            }
            let (theta, curvature) =
                fold_line_parameters(cluster.estimate.theta, cluster.estimate.curvature);
            let id = TrackId((first_id + tracks.len()) as u32);
            tracks.push(Track::from_hits(
                pool,
                id,
                own,
                TrackParameters { theta, curvature },
            ));
        }

        let stage = SearchPassStage {
            min_hits,
            input_hits: hits.len(),
            candidates,
            accepted: accepted.len(),
            clusters: clusters.len(),
            tracks: tracks.len(),
            claimed_hits: tracks.iter().map(Track::len).sum(),
            search: outcome.stats,
        };
        debug!(
            "pass min_hits={}: {} candidates, {} accepted, {} clusters, {} tracks",
            min_hits, stage.candidates, stage.accepted, stage.clusters, stage.tracks
        );
        (tracks, stage)
    }
}
