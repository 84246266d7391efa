//! Track finder orchestrating the conformal Hough pipeline.
//!
//! Overview
//! - Maps every usable hit into conformal space, keeping the drift circle
//!   image for the left/right ambiguity.
//! - Runs the quad-tree Hough search in passes of decreasing hit thresholds;
//!   every pass filters cells on superlayer diversity, clusters adjacent
//!   cells, turns clusters into tracks and claims their hits.
//! - Optionally repeats the search with independent parameters and merges
//!   both track sets with the segment linker.
//!
//! Modules
//! - [`params`] – configuration types used by the finder and the CLI.
//! - `pipeline` – the [`TrackFinder`] implementation.

pub mod params;
mod pipeline;

pub use params::{FinderParams, StepSchedule};
pub use pipeline::TrackFinder;
