#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod diagnostics;
pub mod error;
pub mod finder;
pub mod geometry;
pub mod types;

// “Expert” modules – still public, but considered unstable internals.
pub mod angle;
pub mod cluster;
pub mod conformal;
pub mod hough;
pub mod linker;

// Tooling for the binaries and tests.
pub mod config;
pub mod io;
pub mod synthetic;

// --- High-level re-exports -------------------------------------------------

// Main entry points: finder, parameters, geometry.
pub use crate::error::ConfigError;
pub use crate::finder::{FinderParams, StepSchedule, TrackFinder};
pub use crate::geometry::DetectorGeometry;
pub use crate::types::{
    Hit, HitId, HitIndex, HitPool, HitRecord, HitUsage, Track, TrackId, TrackParameters,
};

// High-level diagnostics returned by the finder.
pub use crate::diagnostics::{FinderReport, FinderTrace};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use conformal_track_finder::prelude::*;
///
/// # fn main() -> Result<(), ConfigError> {
/// let geometry = DetectorGeometry::default();
/// let event = generate_event(&geometry, &SyntheticConfig::default());
/// let mut pool = HitPool::from_records(&geometry, &event.records);
///
/// let finder = TrackFinder::new(FinderParams::default(), geometry)?;
/// let report = finder.process(&mut pool);
/// println!("tracks={} {}", report.tracks.len(), report.trace.summary());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::synthetic::{generate_event, SyntheticConfig};
    pub use crate::{
        ConfigError, DetectorGeometry, FinderParams, HitPool, Track, TrackFinder,
        TrackParameters,
    };
}

// --- Stage-level API (for tools & advanced users) --------------------------

pub mod stages {
    // Stage runners.
    pub use crate::cluster::{CandidateClusterer, SuperlayerDiversityFilter};
    pub use crate::conformal::{ConformalHit, ConformalMapper};
    pub use crate::hough::{CurveBoundEvaluator, QuadTreeSearch};
    pub use crate::linker::SegmentLinker;

    // Stage parameters and outputs.
    pub use crate::cluster::{Adjacency, Cluster, ClusterParams, DiversityParams};
    pub use crate::hough::{Candidate, CrossingTest, ParameterRectangle, SearchOutcome, SearchParams};
    pub use crate::linker::{BridgeParams, LinkOutcome, LinkStats, LinkerParams, Segment};

    // Structured diagnostics types.
    pub use crate::diagnostics::{
        InputDescriptor, LinkingStage, SearchPassStage, StageTiming, TimingBreakdown,
    };
}
