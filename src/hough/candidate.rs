use super::rect::ParameterRectangle;
use crate::types::{HitIndex, HitPool};
use serde::Serialize;

/// Emission order of a candidate within one search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CandidateId(pub u32);

/// Terminal cell of the search with the hits whose loci cross it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    pub rect: ParameterRectangle,
    /// Sorted by hit index.
    pub hits: Vec<HitIndex>,
    /// Distinct superlayers touched, ascending.
    pub superlayers: Vec<u8>,
    pub level: u32,
}

impl Candidate {
    pub(crate) fn new(
        pool: &HitPool,
        id: CandidateId,
        rect: ParameterRectangle,
        mut hits: Vec<HitIndex>,
    ) -> Self {
        hits.sort_unstable();
        hits.dedup();
        let mut superlayers: Vec<u8> = hits.iter().map(|&h| pool.get(h).superlayer()).collect();
        superlayers.sort_unstable();
        superlayers.dedup();
        Self {
            id,
            level: rect.level,
            rect,
            hits,
            superlayers,
        }
    }

    pub fn superlayer_count(&self) -> usize {
        self.superlayers.len()
    }

    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }

    /// Terminal cell index `(ix, iy)`.
    pub fn cell(&self) -> (u32, u32) {
        (self.rect.ix, self.rect.iy)
    }
}
