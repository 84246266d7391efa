//! Splitting of tracks into single-superlayer segments.

use super::ownership::{OwnershipIndex, TrackKey};
use crate::types::{HitIndex, HitPool, Track};
use serde::Serialize;

/// Radius-ordered piece of one track confined to one superlayer and one
/// ownership signature.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub track: TrackKey,
    /// Position of the segment along its track, innermost first.
    pub order: usize,
    pub superlayer: u8,
    /// Tracks other than `track` sharing the segment's hits.
    pub signature: Vec<TrackKey>,
    pub hits: Vec<HitIndex>,
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// The owning track together with its signature.
    pub fn owners(&self) -> impl Iterator<Item = TrackKey> + '_ {
        std::iter::once(self.track).chain(self.signature.iter().copied())
    }

    pub fn shares_owner(&self, other: &Segment) -> bool {
        self.owners().any(|k| other.owners().any(|o| o == k))
    }

    pub(crate) fn refresh_radii(&mut self, pool: &HitPool) {
        let radii = self.hits.iter().map(|&h| pool.get(h).radius());
        let (lo, hi) = radii.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
            (lo.min(r), hi.max(r))
        });
        self.inner_radius = lo;
        self.outer_radius = hi;
    }
}

#[derive(Clone, Debug)]
struct Run {
    superlayer: u8,
    signature: Vec<TrackKey>,
    hits: Vec<HitIndex>,
}

/// Splits `track` at every superlayer or signature change, then absorbs runs
/// shorter than `min_segment_hits` into a same-superlayer neighbour until
/// nothing changes.
pub fn split_track(
    pool: &HitPool,
    ownership: &OwnershipIndex,
    key: TrackKey,
    track: &Track,
    min_segment_hits: usize,
) -> Vec<Segment> {
    let mut hits: Vec<HitIndex> = track
        .hits
        .iter()
        .copied()
        .filter(|h| h.get() < pool.len())
        .collect();
    pool.sort_by_radius(&mut hits);
    hits.dedup();

    let mut runs: Vec<Run> = Vec::new();
    for hit in hits {
        let superlayer = pool.get(hit).superlayer();
        let signature = ownership.signature(hit, key);
        match runs.last_mut() {
            Some(run) if run.superlayer == superlayer && run.signature == signature => {
                run.hits.push(hit)
            }
            _ => runs.push(Run {
                superlayer,
                signature,
                hits: vec![hit],
            }),
        }
    }

    while absorb_one(&mut runs, min_segment_hits) {
        coalesce(&mut runs);
    }

    runs.into_iter()
        .enumerate()
        .map(|(order, run)| {
            let mut segment = Segment {
                track: key,
                order,
                superlayer: run.superlayer,
                signature: run.signature,
                hits: run.hits,
                inner_radius: 0.0,
                outer_radius: 0.0,
            };
            segment.refresh_radii(pool);
            segment
        })
        .collect()
}

/// Merges the first undersized run into a same-superlayer neighbour with the
/// same signature or below the size limit itself. Returns `false` when no run
/// can be absorbed.
fn absorb_one(runs: &mut Vec<Run>, min_segment_hits: usize) -> bool {
    for i in 0..runs.len() {
        if runs[i].hits.len() >= min_segment_hits {
            continue;
        }
        let neighbours = [i.checked_sub(1), Some(i + 1).filter(|&j| j < runs.len())];
        // Only a same-signature or undersized neighbour may take the run;
        // same signature first, then the larger one.
        let target = neighbours
            .into_iter()
            .flatten()
            .filter(|&j| runs[j].superlayer == runs[i].superlayer)
            .filter(|&j| {
                runs[j].signature == runs[i].signature || runs[j].hits.len() < min_segment_hits
            })
            .max_by_key(|&j| {
                (
                    runs[j].signature == runs[i].signature,
                    runs[j].hits.len(),
                    std::cmp::Reverse(j),
                )
            });
        let Some(j) = target else {
            continue;
        };
        let run = runs.remove(i);
        let j = if j > i { j - 1 } else { j };
        let target = &mut runs[j];
        if j < i {
            target.hits.extend(run.hits);
        } else {
            let mut hits = run.hits;
            hits.append(&mut target.hits);
            target.hits = hits;
        }
        return true;
    }
    false
}

fn coalesce(runs: &mut Vec<Run>) {
    let mut merged: Vec<Run> = Vec::with_capacity(runs.len());
    for run in runs.drain(..) {
        match merged.last_mut() {
            Some(last) if last.superlayer == run.superlayer && last.signature == run.signature => {
                last.hits.extend(run.hits)
            }
            _ => merged.push(run),
        }
    }
    *runs = merged;
}
