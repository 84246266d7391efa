//! Grouping of adjacent terminal cells.
//!
//! Candidates are ranked by (distinct superlayers, hit count); the best
//! unclustered candidate seeds a cluster, which then absorbs every connected
//! candidate breadth first. In local-maximum mode a neighbour ranked below
//! the seed is not absorbed: it is recorded as rejected, or left for a later
//! seed when it is itself a local maximum. The walk continues through
//! rejected cells; whatever it reaches from there is rejected too, until the
//! ranks rise again.

use super::adjacency::Adjacency;
use crate::error::ConfigError;
use crate::hough::Candidate;
use crate::types::{HitIndex, TrackParameters};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterParams {
    pub adjacency: Adjacency,
    pub local_max_only: bool,
    /// Clusters with fewer member cells are dropped.
    pub min_cells: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            adjacency: Adjacency::default(),
            local_max_only: false,
            min_cells: 1,
        }
    }
}

impl ClusterParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_cells == 0 {
            return Err(ConfigError::threshold("min_cells", "must be at least 1"));
        }
        Ok(())
    }
}

/// Inclusive cell-index bounding box of a cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellBounds {
    pub ix: [u32; 2],
    pub iy: [u32; 2],
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Sorted by cell index.
    pub members: Vec<Candidate>,
    /// Lower-ranked neighbours consumed in local-maximum mode.
    pub rejected: Vec<Candidate>,
    /// Deduplicated union of member hits, sorted by index.
    pub hits: Vec<HitIndex>,
    pub superlayers: Vec<u8>,
    /// Mean of the member rectangle centres.
    pub estimate: TrackParameters,
    pub bounds: CellBounds,
}

impl Cluster {
    fn from_members(mut members: Vec<Candidate>, mut rejected: Vec<Candidate>) -> Self {
        members.sort_by_key(|c| (c.cell(), c.id));
        rejected.sort_by_key(|c| (c.cell(), c.id));

        let mut hits: Vec<HitIndex> = members.iter().flat_map(|c| c.hits.iter().copied()).collect();
        hits.sort_unstable();
        hits.dedup();
        let mut superlayers: Vec<u8> = members
            .iter()
            .flat_map(|c| c.superlayers.iter().copied())
            .collect();
        superlayers.sort_unstable();
        superlayers.dedup();

        let n = members.len().max(1) as f64;
        let (theta, curvature) = members.iter().fold((0.0, 0.0), |(t, r), c| {
            let [ct, cr] = c.rect.center();
            (t + ct, r + cr)
        });
        let bounds = members.iter().fold(
            CellBounds {
                ix: [u32::MAX, 0],
                iy: [u32::MAX, 0],
            },
            |b, c| CellBounds {
                ix: [b.ix[0].min(c.rect.ix), b.ix[1].max(c.rect.ix)],
                iy: [b.iy[0].min(c.rect.iy), b.iy[1].max(c.rect.iy)],
            },
        );
        Self {
            members,
            rejected,
            hits,
            superlayers,
            estimate: TrackParameters {
                theta: theta / n,
                curvature: curvature / n,
            },
            bounds,
        }
    }

    pub fn superlayer_count(&self) -> usize {
        self.superlayers.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Status {
    Free,
    Clustered,
    Rejected,
}

/// Compares (diversity, hit count); greater is better.
fn rank(c: &Candidate) -> (usize, usize) {
    (c.superlayer_count(), c.hit_count())
}

#[derive(Clone, Debug, Default)]
pub struct CandidateClusterer {
    params: ClusterParams,
}

impl CandidateClusterer {
    pub fn new(params: ClusterParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &ClusterParams {
        &self.params
    }

    /// Groups `candidates` into clusters, best seed first. The result does
    /// not depend on the input order.
    pub fn cluster(&self, candidates: &[Candidate]) -> Vec<Cluster> {
        let mut by_cell: BTreeMap<(u32, u32), Vec<usize>> = BTreeMap::new();
        for (i, c) in candidates.iter().enumerate() {
            by_cell.entry(c.cell()).or_default().push(i);
        }
        let adjacency = self.params.adjacency;
        let neighbours = |i: usize| -> Vec<usize> {
            let cell = candidates[i].cell();
            let mut out: Vec<usize> = by_cell
                .get(&cell)
                .into_iter()
                .flatten()
                .copied()
                .filter(|&j| j != i)
                .collect();
            for n in adjacency.neighbours(cell) {
                if let Some(list) = by_cell.get(&n) {
                    out.extend(list.iter().copied());
                }
            }
            out.sort_by(|&a, &b| seed_order(&candidates[a], &candidates[b]));
            out
        };

        let is_local_max = |i: usize| -> bool {
            neighbours(i)
                .into_iter()
                .all(|m| rank(&candidates[m]) <= rank(&candidates[i]))
        };

        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by(|&a, &b| seed_order(&candidates[a], &candidates[b]));

        let mut status = vec![Status::Free; candidates.len()];
        let mut clusters = Vec::new();
        let mut dropped = 0usize;
        for &seed in &order {
            if status[seed] != Status::Free {
                continue;
            }
            status[seed] = Status::Clustered;
            let seed_rank = rank(&candidates[seed]);
            let mut members = vec![seed];
            let mut rejected = Vec::new();
            let mut queue = VecDeque::from([seed]);
            while let Some(current) = queue.pop_front() {
                for n in neighbours(current) {
                    if status[n] != Status::Free {
                        continue;
                    }
                    if self.params.local_max_only {
                        let from_rejected = status[current] == Status::Rejected;
                        if from_rejected && rank(&candidates[n]) > rank(&candidates[current]) {
                            // Rising again behind a rejected cell: another peak.
                            continue;
                        }
                        let lower = rank(&candidates[n]) < seed_rank;
                        if !from_rejected && lower && is_local_max(n) {
                            continue;
                        }
                        if from_rejected || lower {
                            status[n] = Status::Rejected;
                            rejected.push(n);
                            queue.push_back(n);
                            continue;
                        }
                    }
                    status[n] = Status::Clustered;
                    members.push(n);
                    queue.push_back(n);
                }
            }
            if members.len() < self.params.min_cells {
                dropped += 1;
                continue;
            }
            clusters.push(Cluster::from_members(
                members.into_iter().map(|i| candidates[i].clone()).collect(),
                rejected.into_iter().map(|i| candidates[i].clone()).collect(),
            ));
        }
        debug!(
            "clustered {} candidates into {} clusters ({} below min_cells)",
            candidates.len(),
            clusters.len(),
            dropped
        );
        clusters
    }
}

/// Best rank first, ties by lowest cell index then emission order.
fn seed_order(a: &Candidate, b: &Candidate) -> Ordering {
    rank(b)
        .cmp(&rank(a))
        .then(a.cell().cmp(&b.cell()))
        .then(a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hough::{CandidateId, ParameterRectangle};

    fn cand(id: u32, ix: u32, iy: u32, superlayers: usize, hits: u32) -> Candidate {
        Candidate {
            id: CandidateId(id),
            rect: ParameterRectangle {
                level: 3,
                ix,
                iy,
                theta: [ix as f64, ix as f64 + 1.0],
                offset: [iy as f64, iy as f64 + 1.0],
            },
            hits: (0..hits).map(HitIndex).collect(),
            superlayers: (0..superlayers as u8).collect(),
            level: 3,
        }
    }

    #[test]
    fn separate_blobs_form_separate_clusters() {
        let candidates = vec![
            cand(0, 0, 0, 3, 10),
            cand(1, 1, 0, 3, 12),
            cand(2, 5, 5, 4, 9),
            cand(3, 5, 6, 3, 9),
        ];
        let clusters = CandidateClusterer::default().cluster(&candidates);
        assert_eq!(clusters.len(), 2);
        // Diversity ranks before hit count.
        assert_eq!(clusters[0].members[0].cell(), (5, 5));
        assert_eq!(clusters[1].members.len(), 2);
        assert_eq!(clusters[1].hits.len(), 12);
        assert!((clusters[1].estimate.theta - 1.0).abs() < 1e-12);
        assert!((clusters[1].estimate.curvature - 0.5).abs() < 1e-12);
        assert_eq!(clusters[1].bounds.ix, [0, 1]);
    }

    #[test]
    fn adjacency_rule_controls_diagonals() {
        let candidates = vec![cand(0, 2, 2, 3, 10), cand(1, 3, 3, 3, 10), cand(2, 3, 1, 3, 10)];
        let edge = CandidateClusterer::new(ClusterParams {
            adjacency: Adjacency::Edge,
            ..Default::default()
        })
        .expect("valid");
        assert_eq!(edge.cluster(&candidates).len(), 3);
        let rising = CandidateClusterer::new(ClusterParams {
            adjacency: Adjacency::EdgeAndRisingDiagonal,
            ..Default::default()
        })
        .expect("valid");
        assert_eq!(rising.cluster(&candidates).len(), 2);
        assert_eq!(CandidateClusterer::default().cluster(&candidates).len(), 1);
    }

    #[test]
    fn local_max_mode_rejects_weaker_neighbours() {
        // Peak at (1,0); (2,0) is weaker; (3,0) is a separate local maximum
        // connected through (2,0).
        let candidates = vec![
            cand(0, 1, 0, 4, 20),
            cand(1, 2, 0, 3, 10),
            cand(2, 3, 0, 4, 15),
            cand(3, 0, 0, 4, 20),
        ];
        let clusterer = CandidateClusterer::new(ClusterParams {
            adjacency: Adjacency::Edge,
            local_max_only: true,
            min_cells: 1,
        })
        .expect("valid");
        let clusters = clusterer.cluster(&candidates);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members.len(), 2);
        assert_eq!(clusters[0].rejected.len(), 1);
        assert_eq!(clusters[0].rejected[0].cell(), (2, 0));
        assert_eq!(clusters[1].members[0].cell(), (3, 0));
    }

    #[test]
    fn local_max_mode_rejects_the_whole_lower_plateau() {
        let candidates = vec![
            cand(0, 0, 0, 4, 20),
            cand(1, 1, 0, 3, 10),
            cand(2, 2, 0, 3, 10),
            cand(3, 3, 0, 3, 10),
        ];
        let clusterer = CandidateClusterer::new(ClusterParams {
            adjacency: Adjacency::Edge,
            local_max_only: true,
            min_cells: 1,
        })
        .expect("valid");
        let clusters = clusterer.cluster(&candidates);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 1);
        assert_eq!(clusters[0].members[0].cell(), (0, 0));
        let rejected: Vec<_> = clusters[0].rejected.iter().map(Candidate::cell).collect();
        assert_eq!(rejected, vec![(1, 0), (2, 0), (3, 0)]);
    }

    #[test]
    fn min_cells_drops_small_clusters() {
        let candidates = vec![cand(0, 0, 0, 3, 10), cand(1, 0, 1, 3, 10), cand(2, 7, 7, 3, 10)];
        let clusterer = CandidateClusterer::new(ClusterParams {
            min_cells: 2,
            ..Default::default()
        })
        .expect("valid");
        let clusters = clusterer.cluster(&candidates);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 2);
    }

    #[test]
    fn clustering_is_idempotent_and_order_independent() {
        let candidates = vec![
            cand(0, 4, 4, 3, 10),
            cand(1, 4, 5, 3, 11),
            cand(2, 5, 5, 5, 9),
            cand(3, 6, 6, 3, 8),
        ];
        let clusterer = CandidateClusterer::default();
        let first = clusterer.cluster(&candidates);
        assert_eq!(first.len(), 1);
        let again = clusterer.cluster(&first[0].members);
        assert_eq!(again, first);

        let mut reversed = candidates.clone();
        reversed.reverse();
        assert_eq!(clusterer.cluster(&reversed), first);
    }
}
