//! Recursive subdivision of the Hough plane.
//!
//! Nodes are stored in an arena ([`QuadTree`]) and addressed by [`NodeId`].
//! Every node keeps its parent and children ids, its rectangle and the hits
//! whose loci cross it. The traversal is depth first: a node with too few
//! hits is pruned, a node at the maximum level becomes a [`Candidate`], and
//! any other node is split along the axes that have not yet reached their
//! depth. Children are visited by decreasing hit count so the strongest
//! regions are reached first.

use super::candidate::{Candidate, CandidateId};
use super::curve::CurveBoundEvaluator;
use super::options::SearchParams;
use super::rect::{ParameterRectangle, TreeLayout};
use crate::conformal::ConformalHit;
use crate::error::ConfigError;
use crate::geometry::DetectorGeometry;
use crate::types::{HitIndex, HitPool};
use log::{debug, trace};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    fn get(self) -> usize {
        self.0 as usize
    }
}

/// Lifecycle of a tree node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeState {
    Unprocessed,
    /// Children created and populated.
    Filled,
    /// Children visited.
    Recursed,
    /// Emitted as a candidate.
    Terminal,
    Pruned,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub rect: ParameterRectangle,
    pub hits: Vec<HitIndex>,
    pub state: NodeState,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn level(&self) -> u32 {
        self.rect.level
    }
}

/// Node arena of one search.
#[derive(Clone, Debug, Default)]
pub struct QuadTree {
    nodes: Vec<Node>,
}

impl QuadTree {
    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeId(0))
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.get()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }
}

/// Node counters gathered during a search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    pub nodes_created: usize,
    pub nodes_pruned: usize,
    pub terminal_nodes: usize,
    pub max_level_reached: u32,
}

#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// In emission order.
    pub candidates: Vec<Candidate>,
    pub stats: SearchStats,
    pub tree: QuadTree,
}

/// Bounded recursive Hough search.
#[derive(Clone, Debug)]
pub struct QuadTreeSearch {
    params: SearchParams,
    layout: TreeLayout,
    evaluator: CurveBoundEvaluator,
    /// Axial flag per superlayer.
    axial: Vec<bool>,
}

impl QuadTreeSearch {
    pub fn new(params: SearchParams, geometry: &DetectorGeometry) -> Result<Self, ConfigError> {
        params.validate()?;
        let (theta_depth, offset_depth) = params.axis_depths();
        let layout = TreeLayout {
            theta_range: params.theta_range,
            offset_range: params.offset_range,
            theta_depth,
            offset_depth,
            max_level: params.max_level(),
        };
        Ok(Self {
            evaluator: CurveBoundEvaluator::new(params.crossing_test),
            layout,
            axial: (0..geometry.superlayer_count())
                .map(|sl| geometry.is_axial(sl as u8))
                .collect(),
            params,
        })
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    fn is_axial(&self, superlayer: u8) -> bool {
        self.axial.get(superlayer as usize).copied().unwrap_or(true)
    }

    /// Same search with a different pruning threshold.
    pub fn with_min_hits(&self, min_hits: usize) -> Self {
        let mut search = self.clone();
        search.params.min_hits = min_hits.max(1);
        search
    }

    /// Runs the search over `hits`. `mapped` is aligned with `pool`; hits
    /// without a transformed image are ignored.
    pub fn search(
        &self,
        pool: &HitPool,
        mapped: &[Option<ConformalHit>],
        hits: &[HitIndex],
    ) -> SearchOutcome {
        let mut root_hits: Vec<HitIndex> = hits
            .iter()
            .copied()
            .filter(|h| mapped.get(h.get()).map_or(false, Option::is_some))
            .filter(|h| !self.params.axial_only || self.is_axial(pool.get(*h).superlayer()))
            .collect();
        root_hits.sort_unstable();
        root_hits.dedup();

        let mut run = SearchRun {
            search: self,
            pool,
            mapped,
            tree: QuadTree::default(),
            candidates: Vec::new(),
            stats: SearchStats::default(),
        };
        let root = run.create(None, self.layout.root(), root_hits);
        run.visit(root);

        debug!(
            "hough search: {} candidates, {} nodes ({} pruned, {} terminal), min_hits={}",
            run.candidates.len(),
            run.stats.nodes_created,
            run.stats.nodes_pruned,
            run.stats.terminal_nodes,
            self.params.min_hits
        );
        SearchOutcome {
            candidates: run.candidates,
            stats: run.stats,
            tree: run.tree,
        }
    }
}

struct SearchRun<'a> {
    search: &'a QuadTreeSearch,
    pool: &'a HitPool,
    mapped: &'a [Option<ConformalHit>],
    tree: QuadTree,
    candidates: Vec<Candidate>,
    stats: SearchStats,
}

impl SearchRun<'_> {
    fn create(
        &mut self,
        parent: Option<NodeId>,
        rect: ParameterRectangle,
        hits: Vec<HitIndex>,
    ) -> NodeId {
        self.stats.nodes_created += 1;
        self.tree.push(Node {
            rect,
            hits,
            state: NodeState::Unprocessed,
            parent,
            children: Vec::new(),
        })
    }

    fn visit(&mut self, id: NodeId) {
        let (level, hit_count) = {
            let node = self.tree.node(id);
            (node.level(), node.hits.len())
        };
        self.stats.max_level_reached = self.stats.max_level_reached.max(level);

        if hit_count < self.search.params.min_hits {
            self.tree.nodes[id.get()].state = NodeState::Pruned;
            self.stats.nodes_pruned += 1;
            return;
        }
        if level >= self.search.layout.max_level {
            self.emit(id);
            return;
        }

        self.fill(id);
        let mut order = self.tree.node(id).children.clone();
        order.sort_by(|&a, &b| {
            let na = self.tree.node(a);
            let nb = self.tree.node(b);
            nb.hits
                .len()
                .cmp(&na.hits.len())
                .then((na.rect.ix, na.rect.iy).cmp(&(nb.rect.ix, nb.rect.iy)))
        });
        self.tree.nodes[id.get()].state = NodeState::Recursed;
        for child in order {
            self.visit(child);
        }
    }

    fn fill(&mut self, id: NodeId) {
        let layout = self.search.layout;
        let (rect, hits) = {
            let node = self.tree.node(id);
            (node.rect, node.hits.clone())
        };
        let (split_theta, split_offset) = layout.splits_at(rect.level);
        let nx = if split_theta { 2 } else { 1 };
        let ny = if split_offset { 2 } else { 1 };
        let level = rect.level + 1;

        let mut children = Vec::with_capacity(nx * ny);
        for dx in 0..nx as u32 {
            for dy in 0..ny as u32 {
                let ix = if split_theta { rect.ix * 2 + dx } else { rect.ix };
                let iy = if split_offset { rect.iy * 2 + dy } else { rect.iy };
                let child_rect = layout.rect(level, ix, iy);
                let child_hits: Vec<HitIndex> = hits
                    .iter()
                    .copied()
                    .filter(|h| {
                        self.mapped[h.get()]
                            .as_ref()
                            .map_or(false, |c| self.search.evaluator.crosses(c, &child_rect))
                    })
                    .collect();
                children.push(self.create(Some(id), child_rect, child_hits));
            }
        }
        let node = &mut self.tree.nodes[id.get()];
        node.children = children;
        node.state = NodeState::Filled;
    }

    fn emit(&mut self, id: NodeId) {
        let node = &mut self.tree.nodes[id.get()];
        node.state = NodeState::Terminal;
        self.stats.terminal_nodes += 1;
        let candidate_id = CandidateId(self.candidates.len() as u32);
        let candidate = Candidate::new(self.pool, candidate_id, node.rect, node.hits.clone());
        trace!(
            "candidate {} at cell ({}, {}) with {} hits",
            candidate_id.0,
            candidate.rect.ix,
            candidate.rect.iy,
            candidate.hits.len()
        );
        self.candidates.push(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformal::ConformalMapper;
    use crate::types::{Hit, HitId};
    use nalgebra::Vector3;
    use std::f64::consts::PI;

    fn pool_of(points: &[(f64, f64, u16)]) -> (DetectorGeometry, HitPool) {
        let geometry = DetectorGeometry::default();
        let mut pool = HitPool::new();
        for (i, &(x, y, layer)) in points.iter().enumerate() {
            let hit = Hit::new(
                &geometry,
                HitId(i as u32),
                0,
                layer,
                Vector3::new(x, y, 0.0),
                0.0,
                0.0,
            )
            .expect("known layer");
            pool.push(hit);
        }
        (geometry, pool)
    }

    fn mapped(geometry: &DetectorGeometry, pool: &HitPool) -> Vec<Option<ConformalHit>> {
        let mapper = ConformalMapper::new(geometry);
        pool.hits().iter().map(|h| mapper.map_hit(h)).collect()
    }

    #[test]
    fn two_hit_example_yields_single_candidate() {
        let (geometry, pool) = pool_of(&[(1.0, 1.0, 0), (3.0, 3.0, 8)]);
        let params = SearchParams {
            theta_range: [0.0, PI],
            offset_range: [-0.5, 1.5],
            theta_bins: 2,
            offset_bins: 2,
            min_hits: 2,
            ..Default::default()
        };
        let search = QuadTreeSearch::new(params, &geometry).expect("valid params");
        let outcome = search.search(&pool, &mapped(&geometry, &pool), &pool.free_indices());

        assert_eq!(outcome.candidates.len(), 1);
        let candidate = &outcome.candidates[0];
        assert_eq!(candidate.cell(), (1, 0));
        assert_eq!(candidate.level, 1);
        assert_eq!(candidate.hits, vec![HitIndex(0), HitIndex(1)]);
        assert_eq!(candidate.superlayer_count(), 2);
        assert!((candidate.rect.theta[0] - PI / 2.0).abs() < 1e-12);
        assert!((candidate.rect.offset[1] - 0.5).abs() < 1e-12);
        assert_eq!(outcome.stats.nodes_created, 5);
        assert_eq!(outcome.stats.terminal_nodes, 1);
        assert_eq!(outcome.stats.nodes_pruned, 3);
    }

    #[test]
    fn empty_input_prunes_root() {
        let (geometry, pool) = pool_of(&[]);
        let search = QuadTreeSearch::new(SearchParams::default(), &geometry).expect("valid");
        let outcome = search.search(&pool, &[], &[]);
        assert!(outcome.candidates.is_empty());
        let root = outcome.tree.root().expect("root exists");
        assert_eq!(outcome.tree.node(root).state, NodeState::Pruned);
        assert_eq!(outcome.stats.nodes_created, 1);
    }

    #[test]
    fn children_follow_parent_links_and_cover_parent() {
        let (geometry, pool) = pool_of(&[(20.0, 5.0, 3), (30.0, 9.0, 12), (40.0, 14.0, 20)]);
        let params = SearchParams {
            theta_bins: 16,
            offset_bins: 4,
            min_hits: 3,
            ..Default::default()
        };
        let search = QuadTreeSearch::new(params, &geometry).expect("valid");
        let outcome = search.search(&pool, &mapped(&geometry, &pool), &pool.free_indices());
        for (id, node) in outcome.tree.iter() {
            for &child in &node.children {
                let c = outcome.tree.node(child);
                assert_eq!(c.parent, Some(id));
                assert_eq!(c.level(), node.level() + 1);
                assert!(c.rect.theta[0] >= node.rect.theta[0]);
                assert!(c.rect.theta[1] <= node.rect.theta[1]);
                assert!(c.hits.iter().all(|h| node.hits.contains(h)));
            }
            assert!(matches!(
                node.state,
                NodeState::Recursed | NodeState::Terminal | NodeState::Pruned
            ));
        }
        // Offset axis has depth 2, θ axis depth 4: deeper levels split θ only.
        let deep = outcome
            .tree
            .iter()
            .find(|(_, n)| n.level() == 3 && !n.children.is_empty());
        if let Some((_, node)) = deep {
            assert_eq!(node.children.len(), 2);
        }
        assert!(outcome.candidates.iter().all(|c| c.level == 4));
    }

    #[test]
    fn axial_only_ignores_stereo_hits() {
        let (geometry, pool) = pool_of(&[(1.0, 1.0, 0), (3.0, 3.0, 8)]);
        let params = SearchParams {
            theta_range: [0.0, PI],
            offset_range: [-0.5, 1.5],
            theta_bins: 2,
            offset_bins: 2,
            min_hits: 2,
            axial_only: true,
            ..Default::default()
        };
        let search = QuadTreeSearch::new(params, &geometry).expect("valid");
        let outcome = search.search(&pool, &mapped(&geometry, &pool), &pool.free_indices());
        assert!(outcome.candidates.is_empty());
    }
}
