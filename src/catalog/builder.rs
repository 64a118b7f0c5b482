//! Segment graph builder for the compact de Bruijn graph.
//!
//! The `SegmentGraphBuilder` is driven by a graph traversal that discovers
//! branch k-mers (high-degree nodes) and the linear runs between them. It
//! assigns each segment a stable, strictly increasing id, tracks the
//! undirected adjacency between segments, collects labels per k-mer, and keeps
//! an append-only log of per-segment sketches.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::sketch::Sketch;
use crate::core::types::{KmerHash, Label, LabelSet, NodeId};

#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("Linear segment has no k-mers")]
    EmptySegment,

    #[error("Conflict: k-mer {kmer} already belongs to node {existing}")]
    KmerConflict { kmer: KmerHash, existing: NodeId },

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Sketch already recorded for node {0}")]
    DuplicateSketch(NodeId),

    #[error("Node offset {0} exceeds the maximum of {MAX_NODE_OFFSET}")]
    OffsetTooLarge(NodeId),
}

/// Largest accepted node offset. The upper half of the id space is left for
/// allocation, which therefore cannot overflow.
pub const MAX_NODE_OFFSET: NodeId = NodeId::MAX / 2;

/// One entry of the sketch side-channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SketchRecord {
    pub node: NodeId,
    pub sketch: Sketch,
}

impl std::fmt::Display for SketchRecord {
    /// `<node_id>,<space-joined hashes>`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.node, self.sketch)
    }
}

/// Undirected edge set kept in first-insertion order
///
/// Each edge is stored once as `(min, max)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Adjacency {
    edges: Vec<(NodeId, NodeId)>,
    seen: HashSet<(NodeId, NodeId)>,
}

impl Adjacency {
    /// Insert the canonical form of `a`-`b`; returns whether the edge was new.
    /// Self-loops are never stored.
    pub fn insert(&mut self, a: NodeId, b: NodeId) -> bool {
        if a == b {
            return false;
        }
        let edge = (a.min(b), a.max(b));
        if self.seen.insert(edge) {
            self.edges.push(edge);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn contains(&self, a: NodeId, b: NodeId) -> bool {
        self.seen.contains(&(a.min(b), a.max(b)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.edges.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Incrementally assigns ids to graph segments and records their metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentGraphBuilder {
    /// k-mer size of the graph
    pub ksize: u32,

    /// Next id to hand out
    next_id: NodeId,

    /// Node id -> size in k-mers. Ids are allocated in increasing order so
    /// key order is insertion order.
    sizes: BTreeMap<NodeId, u64>,

    /// Node id -> representative k-mer
    node_kmers: BTreeMap<NodeId, KmerHash>,

    /// Representative k-mer -> node id
    kmer_nodes: HashMap<KmerHash, NodeId>,

    adjacency: Adjacency,

    /// Labels keyed by k-mer, not by node
    labels: HashMap<KmerHash, LabelSet>,

    sketch_log: Vec<SketchRecord>,
    sketched: HashSet<NodeId>,
}

impl SegmentGraphBuilder {
    #[must_use]
    pub fn new(ksize: u32) -> Self {
        Self::starting_at(ksize, 1)
    }

    /// Create a builder whose first id is `1 + offset`, for graphs that are
    /// assembled from several independently numbered pieces
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::OffsetTooLarge` if `offset` exceeds
    /// [`MAX_NODE_OFFSET`].
    pub fn with_node_offset(ksize: u32, offset: NodeId) -> Result<Self, BuilderError> {
        if offset > MAX_NODE_OFFSET {
            return Err(BuilderError::OffsetTooLarge(offset));
        }
        Ok(Self::starting_at(ksize, offset + 1))
    }

    fn starting_at(ksize: u32, first_id: NodeId) -> Self {
        Self {
            ksize,
            next_id: first_id,
            sizes: BTreeMap::new(),
            node_kmers: BTreeMap::new(),
            kmer_nodes: HashMap::new(),
            adjacency: Adjacency::default(),
            labels: HashMap::new(),
            sketch_log: Vec::new(),
            sketched: HashSet::new(),
        }
    }

    fn allocate(&mut self, kmer: KmerHash, size: u64) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.sizes.insert(id, size);
        self.node_kmers.insert(id, kmer);
        self.kmer_nodes.insert(kmer, id);
        id
    }

    /// Register a branch k-mer, returning its node id.
    ///
    /// A k-mer that is already registered keeps its id; only unseen k-mers
    /// allocate a new node of size 1.
    pub fn ensure_branch_node(&mut self, kmer: KmerHash) -> NodeId {
        if let Some(&existing) = self.kmer_nodes.get(&kmer) {
            return existing;
        }
        let id = self.allocate(kmer, 1);
        debug!(node = id, kmer, "new branch node");
        id
    }

    /// Register a linear run of `length` k-mers as a new node. The run is
    /// identified by the minimum hash among `visited_kmers`.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::EmptySegment` if no k-mers were visited, or
    /// `BuilderError::KmerConflict` if the representative k-mer already names
    /// another node.
    pub fn add_linear_segment(
        &mut self,
        visited_kmers: &[KmerHash],
        length: u64,
    ) -> Result<NodeId, BuilderError> {
        let kmer = *visited_kmers.iter().min().ok_or(BuilderError::EmptySegment)?;
        if let Some(&existing) = self.kmer_nodes.get(&kmer) {
            return Err(BuilderError::KmerConflict { kmer, existing });
        }
        let id = self.allocate(kmer, length);
        debug!(node = id, kmer, length, "new linear segment");
        Ok(id)
    }

    /// Record an undirected edge. Returns `true` if the edge was not yet
    /// known; repeated or reversed insertions and self-loops return `false`.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::UnknownNode` if either end was never allocated.
    pub fn add_adjacency(&mut self, a: NodeId, b: NodeId) -> Result<bool, BuilderError> {
        for node in [a, b] {
            if !self.sizes.contains_key(&node) {
                return Err(BuilderError::UnknownNode(node));
            }
        }
        Ok(self.adjacency.insert(a, b))
    }

    /// Attach `label` to `kmer`. The k-mer need not be registered yet.
    pub fn add_label(&mut self, kmer: KmerHash, label: Label) {
        self.labels.entry(kmer).or_default().insert(label);
    }

    /// Append the sketch of a newly discovered node to the sketch log
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::UnknownNode` for an unallocated id, or
    /// `BuilderError::DuplicateSketch` if the node already has a record.
    pub fn store_sketch(&mut self, node: NodeId, sketch: Sketch) -> Result<(), BuilderError> {
        if !self.sizes.contains_key(&node) {
            return Err(BuilderError::UnknownNode(node));
        }
        if !self.sketched.insert(node) {
            return Err(BuilderError::DuplicateSketch(node));
        }
        self.sketch_log.push(SketchRecord { node, sketch });
        Ok(())
    }

    /// Nodes and their sizes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, u64)> + '_ {
        self.sizes.iter().map(|(&id, &size)| (id, size))
    }

    /// Edges as `(min, max)` pairs in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.adjacency.iter()
    }

    #[must_use]
    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency.contains(a, b)
    }

    #[must_use]
    pub fn sketch_records(&self) -> &[SketchRecord] {
        &self.sketch_log
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.sizes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.len()
    }

    #[must_use]
    pub fn node_size(&self, node: NodeId) -> Option<u64> {
        self.sizes.get(&node).copied()
    }

    #[must_use]
    pub fn node_kmer(&self, node: NodeId) -> Option<KmerHash> {
        self.node_kmers.get(&node).copied()
    }

    #[must_use]
    pub fn node_for_kmer(&self, kmer: KmerHash) -> Option<NodeId> {
        self.kmer_nodes.get(&kmer).copied()
    }

    /// Labels on the node's representative k-mer
    #[must_use]
    pub fn node_labels(&self, node: NodeId) -> LabelSet {
        self.node_kmer(node)
            .and_then(|kmer| self.labels.get(&kmer))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of nodes carrying each label
    #[must_use]
    pub fn label_counts(&self) -> BTreeMap<Label, usize> {
        let mut counts = BTreeMap::new();
        for (node, _) in self.nodes() {
            for label in self.node_labels(node).iter() {
                *counts.entry(label).or_default() += 1;
            }
        }
        counts
    }
}
