//! Hough-space search over conformally mapped hits.
//!
//! - `options`: search parameters and axis depth rules.
//! - `rect`: parameter rectangles and the index → bounds layout.
//! - `curve`: hit locus versus rectangle crossing test.
//! - `candidate`: terminal cells emitted by the search.
//! - `quadtree`: arena-backed recursive subdivision.

pub mod candidate;
pub mod curve;
pub mod options;
pub mod quadtree;
pub mod rect;

pub use candidate::{Candidate, CandidateId};
pub use curve::CurveBoundEvaluator;
pub use options::{depth_for_resolution, CrossingTest, SearchParams, MAX_TREE_LEVEL};
pub use quadtree::{
    Node, NodeId, NodeState, QuadTree, QuadTreeSearch, SearchOutcome, SearchStats,
};
pub use rect::ParameterRectangle;
