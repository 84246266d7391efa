//! Diagnostics data model returned by the finder.
//!
//! [`FinderReport`] bundles the output tracks with a [`FinderTrace`] that
//! records input bookkeeping, per-pass search counters, linking statistics
//! and stage timings. Everything is serializable for the demo binaries.

pub mod finder;
pub mod timing;

pub use finder::{FinderReport, FinderTrace, InputDescriptor, LinkingStage, SearchPassStage};
pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};
