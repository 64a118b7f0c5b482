use std::cmp::Ordering;

use crate::core::sketch::Sketch;
use crate::core::types::NodeId;
use crate::parsing::records::SketchTable;

/// Similarity between the query and one candidate node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeScore {
    pub node: NodeId,
    /// Estimated Jaccard similarity (0.0 - 1.0)
    pub similarity: f64,
}

/// Score every candidate that has a sketch. Candidates without one are skipped.
pub fn score_nodes(
    query: &Sketch,
    sketches: &SketchTable,
    candidates: impl IntoIterator<Item = NodeId>,
) -> Vec<NodeScore> {
    candidates
        .into_iter()
        .filter_map(|node| {
            sketches.get(&node).map(|sketch| NodeScore {
                node,
                similarity: query.jaccard(sketch),
            })
        })
        .collect()
}

/// The highest-scoring node with positive similarity; ties go to the lowest id
#[must_use]
pub fn best_score(scores: &[NodeScore]) -> Option<NodeScore> {
    scores
        .iter()
        .copied()
        .filter(|s| s.similarity > 0.0)
        .fold(None, |best: Option<NodeScore>, s| match best {
            None => Some(s),
            Some(b) => match s.similarity.total_cmp(&b.similarity) {
                Ordering::Greater => Some(s),
                Ordering::Equal if s.node < b.node => Some(s),
                _ => Some(b),
            },
        })
}

/// Every node sharing the maximal positive similarity, in ascending id order
#[must_use]
pub fn maximal_nodes(scores: &[NodeScore]) -> Vec<NodeId> {
    let Some(best) = best_score(scores) else {
        return Vec::new();
    };
    let mut nodes: Vec<NodeId> = scores
        .iter()
        .filter(|s| s.similarity.total_cmp(&best.similarity) == Ordering::Equal)
        .map(|s| s.node)
        .collect();
    nodes.sort_unstable();
    nodes
}

/// A candidate during greedy hash covering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatherCandidate {
    pub node: NodeId,
    /// Still-uncovered query hashes this node's sketch contains
    pub covered: usize,
    /// Total number of hashes in the node's sketch
    pub sketch_size: usize,
}

impl GatherCandidate {
    /// Rank by covered hashes, then lowest id
    #[must_use]
    pub fn cmp_by_coverage(&self, other: &Self) -> Ordering {
        self.covered
            .cmp(&other.covered)
            .then_with(|| other.node.cmp(&self.node))
    }

    /// Rank by `covered² / sketch_size`, i.e. coverage weighted by the share of
    /// the node's sketch that is useful to the query. Large nodes that touch
    /// the query only lightly lose to small, specific ones. Ties go to more
    /// covered hashes, then the lowest id.
    #[must_use]
    pub fn cmp_by_weighted_coverage(&self, other: &Self) -> Ordering {
        let lhs = weighted(self.covered, other.sketch_size);
        let rhs = weighted(other.covered, self.sketch_size);
        lhs.cmp(&rhs)
            .then_with(|| self.covered.cmp(&other.covered))
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// `covered² × other_size`, the cross-multiplied form of `covered² / own_size`
fn weighted(covered: usize, other_size: usize) -> u128 {
    let covered = covered as u128;
    covered * covered * other_size as u128
}
