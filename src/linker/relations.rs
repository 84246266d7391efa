//! Weighted relations between segments and their connected components.
//!
//! Segments are addressed by their position in the key-sorted segment list;
//! relations always point from a lower to a higher position, so the relation
//! graph is acyclic.

use super::segment::Segment;
use super::{BridgeParams, LinkerParams};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    /// Radially consecutive, hit-disjoint segments with a common owner.
    Successor,
    /// Near-duplicate segments of different tracks in the same superlayer.
    Bridge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub from: usize,
    pub to: usize,
    pub weight: usize,
    pub kind: RelationKind,
}

/// Relations among the segments listed in `alive` (ascending positions).
pub fn build_relations(
    segments: &[Segment],
    alive: &[usize],
    params: &LinkerParams,
) -> Vec<Relation> {
    let mut relations = Vec::new();
    for (n, &i) in alive.iter().enumerate() {
        let a = &segments[i];
        for &j in &alive[n + 1..] {
            let b = &segments[j];
            if let Some(relation) = successor(a, b, params.max_superlayer_gap) {
                relations.push(Relation {
                    from: i,
                    to: j,
                    ..relation
                });
            } else if let Some(bridge) = params.bridges.as_ref() {
                if let Some(weight) = bridge_weight(a, b, bridge) {
                    relations.push(Relation {
                        from: i,
                        to: j,
                        weight,
                        kind: RelationKind::Bridge,
                    });
                }
            }
        }
    }
    relations
}

fn successor(a: &Segment, b: &Segment, max_gap: u8) -> Option<Relation> {
    let same_track_after = a.track == b.track && b.order > a.order;
    let radially_after = if b.superlayer > a.superlayer {
        b.superlayer - a.superlayer <= max_gap
    } else {
        b.superlayer == a.superlayer && b.inner_radius >= a.outer_radius
    };
    if !(same_track_after || radially_after) {
        return None;
    }
    if !a.shares_owner(b) || a.hits.iter().any(|h| b.hits.contains(h)) {
        return None;
    }
    Some(Relation {
        from: 0,
        to: 0,
        weight: b.len(),
        kind: RelationKind::Successor,
    })
}

/// Weight of the bridge `a → b`: the hits `b` adds to `a`.
fn bridge_weight(a: &Segment, b: &Segment, params: &BridgeParams) -> Option<usize> {
    if a.track == b.track || a.superlayer != b.superlayer {
        return None;
    }
    let pairs: Vec<(f64, f64)> = a
        .hits
        .iter()
        .enumerate()
        .filter_map(|(pa, h)| {
            b.hits
                .iter()
                .position(|x| x == h)
                .map(|pb| (pa as f64, pb as f64))
        })
        .collect();
    let shared = pairs.len();
    let smaller = a.len().min(b.len());
    if shared < 2 || smaller == 0 {
        return None;
    }
    if (shared as f64) / (smaller as f64) < params.min_overlap_fraction {
        return None;
    }
    if pearson(&pairs)? < params.min_correlation {
        return None;
    }
    Some(b.len() - shared)
}

/// Pearson correlation coefficient; `None` when either coordinate is constant.
pub(crate) fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    let n = pairs.len() as f64;
    if n < 2.0 {
        return None;
    }
    let (sx, sy) = pairs
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
    let (mx, my) = (sx / n, sy / n);
    let (mut cov, mut vx, mut vy) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        cov += (x - mx) * (y - my);
        vx += (x - mx) * (x - mx);
        vy += (y - my) * (y - my);
    }
    if vx <= 0.0 || vy <= 0.0 {
        return None;
    }
    Some(cov / (vx * vy).sqrt())
}

/// Disjoint-set forest over segment positions.
#[derive(Clone, Debug)]
pub(crate) struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// The smaller root survives so component ids follow segment order.
    pub fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }

    /// Members of every set, ascending, ordered by smallest member.
    pub fn components(&mut self) -> Vec<Vec<usize>> {
        let n = self.parent.len();
        let mut slot = vec![usize::MAX; n];
        let mut out: Vec<Vec<usize>> = Vec::new();
        for x in 0..n {
            let root = self.find(x);
            if slot[root] == usize::MAX {
                slot[root] = out.len();
                out.push(Vec::new());
            }
            out[slot[root]].push(x);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linker::TrackKey;
    use crate::types::HitIndex;

    fn segment(track: u32, order: usize, superlayer: u8, hits: &[u32], radii: (f64, f64)) -> Segment {
        Segment {
            track: TrackKey {
                input: 0,
                index: track,
            },
            order,
            superlayer,
            signature: Vec::new(),
            hits: hits.iter().copied().map(HitIndex).collect(),
            inner_radius: radii.0,
            outer_radius: radii.1,
        }
    }

    #[test]
    fn consecutive_segments_of_one_track_are_linked() {
        let segments = vec![
            segment(0, 0, 0, &[0, 1, 2], (17.0, 19.0)),
            segment(0, 1, 1, &[3, 4, 5], (27.0, 29.0)),
            segment(1, 0, 1, &[6, 7, 8], (27.0, 29.0)),
        ];
        let relations = build_relations(&segments, &[0, 1, 2], &LinkerParams::default());
        assert_eq!(
            relations,
            vec![Relation {
                from: 0,
                to: 1,
                weight: 3,
                kind: RelationKind::Successor
            }]
        );
    }

    #[test]
    fn gap_limit_applies_across_tracks_only() {
        let mut far = segment(0, 1, 5, &[3, 4, 5], (60.0, 62.0));
        let near = segment(0, 0, 0, &[0, 1, 2], (17.0, 19.0));
        let params = LinkerParams::default();
        assert!(successor(&near, &far, params.max_superlayer_gap).is_some());
        far.track.index = 1;
        far.signature = vec![near.track];
        assert!(successor(&near, &far, params.max_superlayer_gap).is_none());
    }

    #[test]
    fn bridge_requires_overlap_and_correlation() {
        let a = segment(0, 0, 0, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9], (17.0, 26.0));
        let b = segment(1, 0, 0, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 10], (17.0, 26.5));
        let params = BridgeParams::default();
        assert_eq!(bridge_weight(&a, &b, &params), Some(1));

        let c = segment(1, 0, 0, &[0, 1, 2, 20, 21, 22, 23, 24, 25, 26], (17.0, 26.5));
        assert_eq!(bridge_weight(&a, &c, &params), None);

        let reversed = segment(1, 0, 0, &[9, 8, 7, 6, 5, 4, 3, 2, 1, 0], (17.0, 26.0));
        assert_eq!(bridge_weight(&a, &reversed, &params), None);
    }

    #[test]
    fn union_find_groups_components() {
        let mut uf = UnionFind::new(5);
        uf.union(3, 1);
        uf.union(4, 3);
        assert_eq!(uf.components(), vec![vec![0], vec![1, 3, 4], vec![2]]);
    }

    #[test]
    fn pearson_of_perfect_line() {
        let pairs = [(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)];
        assert!((pearson(&pairs).expect("defined") - 1.0).abs() < 1e-12);
        assert!(pearson(&[(1.0, 1.0), (1.0, 2.0)]).is_none());
    }
}
