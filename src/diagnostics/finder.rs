use super::timing::TimingBreakdown;
use crate::hough::SearchStats;
use crate::linker::LinkStats;
use crate::types::Track;
use serde::Serialize;

/// Result of [`TrackFinder::process`](crate::TrackFinder::process): the final
/// tracks and a trace of every stage that ran.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinderReport {
    pub tracks: Vec<Track>,
    pub trace: FinderTrace,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinderTrace {
    pub input: InputDescriptor,
    pub timings: TimingBreakdown,
    pub passes: Vec<SearchPassStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<SearchPassStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linking: Option<LinkingStage>,
}

impl FinderTrace {
    /// One-line summary used by the demo binaries.
    pub fn summary(&self) -> String {
        let candidates: usize = self.passes.iter().map(|p| p.candidates).sum();
        let linked = self
            .linking
            .as_ref()
            .map(|l| format!("{}→{}", l.stats.tracks_in, l.stats.tracks_out))
            .unwrap_or_else(|| "-".to_string());
        format!(
            "hits={} mapped={} passes={} candidates={} linked={} total={:.3}ms",
            self.input.hits,
            self.input.mapped,
            self.passes.len(),
            candidates,
            linked,
            self.timings.total_ms
        )
    }
}

/// Hit bookkeeping at event start.
#[derive(Clone, Copy, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub hits: usize,
    pub free: usize,
    pub background: usize,
    pub mapped: usize,
    /// Wires sitting on the conformal reference point.
    pub skipped_origin: usize,
    /// Drift circles enclosing the reference point.
    pub skipped_degenerate: usize,
}

/// Counters of one search → filter → cluster → track pass.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPassStage {
    pub min_hits: usize,
    pub input_hits: usize,
    pub candidates: usize,
    pub accepted: usize,
    pub clusters: usize,
    pub tracks: usize,
    pub claimed_hits: usize,
    pub search: SearchStats,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkingStage {
    pub stats: LinkStats,
    pub released_hits: usize,
}
