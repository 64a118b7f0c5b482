use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::export::LABELS_ATTRIBUTE;
use crate::catalog::hierarchical::{attribute_value, CatlasHierarchy};
use crate::core::types::{LabelSet, NodeId};
use crate::parsing::gxt::{parse_gxt_file, GxtGraph};
use crate::parsing::records::{parse_assignment_file, parse_sketch_file, Assignment, SketchTable};
use crate::parsing::ParseError;
use crate::utils::validation::{catalog_basename, ValidationError};

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Failed to parse catlas file: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid catlas location: {0}")]
    Location(#[from] ValidationError),

    #[error("Invalid catlas hierarchy: {0}")]
    InvalidHierarchy(String),

    #[error("Invalid labels on original node {node}: '{value}'")]
    InvalidLabels { node: NodeId, value: String },

    #[error("Unknown catlas node: {0}")]
    UnknownNode(NodeId),

    #[error("Original node {0} is not covered by any dominating node")]
    Uncovered(NodeId),

    #[error("Catlas node {node} stands for vertex {vertex}, which dominates no original node")]
    UnassignedVertex { node: NodeId, vertex: NodeId },
}

/// Locations of the files that make up a catlas of one radius
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatlasPaths {
    /// The original cDBG (`<prefix>/<name>.gxt`)
    pub original_graph: PathBuf,
    /// The catlas hierarchy (`<prefix>/<name>.catlas.<r>.gxt`)
    pub catlas_gxt: PathBuf,
    /// Sketches of catlas nodes (`<prefix>/<name>.catlas.<r>.mxt`)
    pub catlas_mxt: PathBuf,
    /// Original node -> dominating nodes (`<prefix>/<name>.assignment.<r>.vxt`)
    pub assignment_vxt: PathBuf,
}

impl CatlasPaths {
    /// Derive file locations from a catalog prefix directory and radius
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Location` if the prefix has no usable directory name.
    pub fn new(prefix: &Path, radius: u32) -> Result<Self, IndexError> {
        let name = catalog_basename(prefix)?;
        Ok(Self {
            original_graph: prefix.join(format!("{name}.gxt")),
            catlas_gxt: prefix.join(format!("{name}.catlas.{radius}.gxt")),
            catlas_mxt: prefix.join(format!("{name}.catlas.{radius}.mxt")),
            assignment_vxt: prefix.join(format!("{name}.assignment.{radius}.vxt")),
        })
    }
}

/// A loaded catlas: hierarchy, labels, and sketches for one radius
#[derive(Debug, Clone)]
pub struct CatlasIndex {
    pub radius: u32,

    pub hierarchy: CatlasHierarchy,

    /// Original cDBG node -> labels (only nodes with a `labels` record)
    pub original_labels: HashMap<NodeId, LabelSet>,

    /// Dominating node -> original nodes it covers, in assignment-file order
    pub dominated: BTreeMap<NodeId, Vec<NodeId>>,

    /// Dominating node -> union of its original nodes' labels
    pub dominator_labels: BTreeMap<NodeId, LabelSet>,

    /// Catlas node -> sketch
    pub sketches: SketchTable,
}

impl CatlasIndex {
    /// Load every catlas artifact for `radius` from the prefix directory
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if any file is missing or malformed.
    pub fn load(prefix: &Path, radius: u32) -> Result<Self, IndexError> {
        let paths = CatlasPaths::new(prefix, radius)?;
        Self::load_paths(&paths, radius)
    }

    /// Load from explicit file locations
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if any file is missing or malformed.
    pub fn load_paths(paths: &CatlasPaths, radius: u32) -> Result<Self, IndexError> {
        info!("reading catlas {}", paths.catlas_gxt.display());
        let hierarchy = CatlasHierarchy::load(&paths.catlas_gxt)?;

        info!("reading original graph {}", paths.original_graph.display());
        let original_graph = parse_gxt_file(&paths.original_graph)?;
        let original_labels = load_original_labels(&original_graph)?;

        info!("reading assignments {}", paths.assignment_vxt.display());
        let assignments = parse_assignment_file(&paths.assignment_vxt)?;
        check_coverage(original_graph.vertices.iter().map(|v| v.id), &assignments)?;

        info!("reading sketches {}", paths.catlas_mxt.display());
        let sketches = parse_sketch_file(&paths.catlas_mxt)?;

        let index = Self::from_parts(radius, hierarchy, original_labels, &assignments, sketches);
        index.check_leaves()?;
        info!(
            "loaded {} catlas nodes, {} dominating nodes, {} sketches",
            index.hierarchy.len(),
            index.dominated.len(),
            index.sketches.len()
        );
        Ok(index)
    }

    /// Assemble an index from already-loaded pieces
    #[must_use]
    pub fn from_parts(
        radius: u32,
        hierarchy: CatlasHierarchy,
        original_labels: HashMap<NodeId, LabelSet>,
        assignments: &[Assignment],
        sketches: SketchTable,
    ) -> Self {
        let dominated = invert_assignments(assignments);
        let dominator_labels = propagate_labels(&dominated, &original_labels);
        Self {
            radius,
            hierarchy,
            original_labels,
            dominated,
            dominator_labels,
            sketches,
        }
    }

    /// See [`CatlasHierarchy::find_level0`]
    ///
    /// # Errors
    ///
    /// Returns `IndexError::UnknownNode` if `id` is not in the catlas.
    pub fn find_level0(&self, id: NodeId) -> Result<BTreeSet<NodeId>, IndexError> {
        self.hierarchy.find_level0(id)
    }

    /// Level 0 leaves under every node of `matches`
    ///
    /// # Errors
    ///
    /// Returns `IndexError::UnknownNode` for a match outside the catlas.
    pub fn backtrack(&self, matches: &BTreeSet<NodeId>) -> Result<BTreeSet<NodeId>, IndexError> {
        let mut leaves = BTreeSet::new();
        for &node in matches {
            leaves.extend(self.find_level0(node)?);
        }
        debug!(
            "found {} leaves under {} catlas nodes",
            leaves.len(),
            matches.len()
        );
        Ok(leaves)
    }

    /// Every level 0 catlas node must stand for a dominating node of the
    /// assignment relation
    ///
    /// # Errors
    ///
    /// Returns `IndexError::UnassignedVertex` for the first leaf whose vertex
    /// dominates nothing.
    pub fn check_leaves(&self) -> Result<(), IndexError> {
        for node in self.hierarchy.nodes_at_level(0) {
            if let Some(vertex) = self.hierarchy.get(node).and_then(|n| n.vertex) {
                if !self.dominated.contains_key(&vertex) {
                    return Err(IndexError::UnassignedVertex { node, vertex });
                }
            }
        }
        Ok(())
    }

    /// Every label present on some dominating node
    #[must_use]
    pub fn all_labels(&self) -> LabelSet {
        let mut all = LabelSet::new();
        for labels in self.dominator_labels.values() {
            all.union_with(labels);
        }
        all
    }
}

/// Labels per original node from the `labels` vertex attribute.
/// Vertices with an empty label string are left out.
///
/// # Errors
///
/// Returns `IndexError::InvalidHierarchy` if the graph lacks the attribute, or
/// `IndexError::InvalidLabels` for a non-numeric label.
pub fn load_original_labels(graph: &GxtGraph) -> Result<HashMap<NodeId, LabelSet>, IndexError> {
    let idx = graph.vertex_attribute_index(LABELS_ATTRIBUTE).ok_or_else(|| {
        IndexError::InvalidHierarchy(format!(
            "original graph has no '{LABELS_ATTRIBUTE}' attribute"
        ))
    })?;

    let mut labels = HashMap::new();
    for v in &graph.vertices {
        let value = attribute_value(v, idx)?;
        let parsed =
            LabelSet::parse_space_joined(value).map_err(|_| IndexError::InvalidLabels {
                node: v.id,
                value: value.to_string(),
            })?;
        if !parsed.is_empty() {
            labels.insert(v.id, parsed);
        }
    }
    Ok(labels)
}

/// Every original node must have an assignment record
///
/// # Errors
///
/// Returns `IndexError::Uncovered` for the first original node without one.
pub fn check_coverage(
    original_nodes: impl IntoIterator<Item = NodeId>,
    assignments: &[Assignment],
) -> Result<(), IndexError> {
    let assigned: HashSet<NodeId> = assignments.iter().map(|a| a.original).collect();
    match original_nodes.into_iter().find(|node| !assigned.contains(node)) {
        Some(node) => Err(IndexError::Uncovered(node)),
        None => Ok(()),
    }
}

/// Turn `original -> [dominators]` into `dominator -> [originals]`.
/// An original node covered by several dominators appears under each.
#[must_use]
pub fn invert_assignments(assignments: &[Assignment]) -> BTreeMap<NodeId, Vec<NodeId>> {
    let mut dominated: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    for assignment in assignments {
        for &dominator in &assignment.dominators {
            dominated
                .entry(dominator)
                .or_default()
                .push(assignment.original);
        }
    }
    dominated
}

/// Each dominating node's labels are the union of its original nodes' labels.
/// Every dominating node gets an entry, even if no label reaches it.
#[must_use]
pub fn propagate_labels(
    dominated: &BTreeMap<NodeId, Vec<NodeId>>,
    original_labels: &HashMap<NodeId, LabelSet>,
) -> BTreeMap<NodeId, LabelSet> {
    dominated
        .iter()
        .map(|(&dominator, originals)| {
            let mut labels = LabelSet::new();
            for original in originals {
                if let Some(l) = original_labels.get(original) {
                    labels.union_with(l);
                }
            }
            (dominator, labels)
        })
        .collect()
}
