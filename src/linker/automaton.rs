use super::relations::Relation;
use super::segment::Segment;
use std::cmp::Reverse;

/// Highest-weight chain of segments found in one component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SegmentPath {
    /// Segment positions, innermost first.
    pub nodes: Vec<usize>,
    pub score: usize,
}

/// Cellular automaton over the acyclic relation graph.
///
/// Each alive segment starts with its own hit count as state; visiting the
/// segments in key order, a segment takes the best `state(a) + weight` over
/// its incoming relations. The end node with the highest state (ties: better
/// track rank, then lower position) is then followed back through the
/// recorded predecessors.
pub(crate) fn best_path(
    segments: &[Segment],
    alive: &[usize],
    relations: &[Relation],
    track_rank: impl Fn(&Segment) -> usize,
) -> Option<SegmentPath> {
    let n = segments.len();
    let mut state = vec![0usize; n];
    let mut pred: Vec<Option<usize>> = vec![None; n];
    let mut incoming: Vec<Vec<&Relation>> = vec![Vec::new(); n];
    for relation in relations {
        incoming[relation.to].push(relation);
    }

    for &b in alive {
        let mut best = segments[b].len();
        let mut from = None;
        let mut sources = incoming[b].clone();
        sources.sort_by_key(|r| r.from);
        for relation in sources {
            let candidate = state[relation.from] + relation.weight;
            if candidate > best {
                best = candidate;
                from = Some(relation.from);
            }
        }
        state[b] = best;
        pred[b] = from;
    }

    let end = alive
        .iter()
        .copied()
        .max_by_key(|&i| (state[i], Reverse(track_rank(&segments[i])), Reverse(i)))?;

    let mut nodes = vec![end];
    let mut cursor = end;
    while let Some(prev) = pred[cursor] {
        nodes.push(prev);
        cursor = prev;
    }
    nodes.reverse();
    Some(SegmentPath {
        nodes,
        score: state[end],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linker::relations::RelationKind;
    use crate::linker::TrackKey;
    use crate::types::HitIndex;

    fn segment(track: u32, hits: u32) -> Segment {
        Segment {
            track: TrackKey {
                input: 0,
                index: track,
            },
            order: 0,
            superlayer: 0,
            signature: Vec::new(),
            hits: (0..hits).map(HitIndex).collect(),
            inner_radius: 0.0,
            outer_radius: 0.0,
        }
    }

    fn rel(from: usize, to: usize, weight: usize) -> Relation {
        Relation {
            from,
            to,
            weight,
            kind: RelationKind::Successor,
        }
    }

    #[test]
    fn follows_heaviest_chain() {
        // 0 → 1 → 3 carries 4 + 5 + 6; 0 → 2 → 3 only 4 + 2 + 6.
        let segments = vec![segment(0, 4), segment(0, 5), segment(1, 2), segment(0, 6)];
        let relations = vec![rel(0, 1, 5), rel(0, 2, 2), rel(1, 3, 6), rel(2, 3, 6)];
        let path = best_path(&segments, &[0, 1, 2, 3], &relations, |s| s.track.index as usize)
            .expect("non-empty");
        assert_eq!(path.nodes, vec![0, 1, 3]);
        assert_eq!(path.score, 15);
    }

    #[test]
    fn ties_prefer_better_ranked_track() {
        let segments = vec![segment(1, 5), segment(0, 5)];
        let path = best_path(&segments, &[0, 1], &[], |s| s.track.index as usize)
            .expect("non-empty");
        assert_eq!(path.nodes, vec![1]);
    }

    #[test]
    fn nothing_alive_yields_no_path() {
        assert!(best_path(&[segment(0, 3)], &[], &[], |_| 0).is_none());
    }
}
