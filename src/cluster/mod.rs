//! Candidate post-processing: superlayer diversity filtering and clustering
//! of adjacent terminal cells.

pub mod adjacency;
pub mod clusterer;
pub mod diversity;

pub use adjacency::Adjacency;
pub use clusterer::{CandidateClusterer, CellBounds, Cluster, ClusterParams};
pub use diversity::{DiversityParams, SuperlayerDiversityFilter};
