//! Catlas hierarchy for one radius.
//!
//! The catlas is a DAG of dominating-set levels: level 0 nodes each stand for
//! one vertex of the domination graph, and every node above level 0 covers a
//! set of nodes on lower levels. The structure is read from the catlas GXT
//! file, whose vertices carry `level` and `vertex` attributes and whose edges
//! run parent → child.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::catalog::index::IndexError;
use crate::core::types::NodeId;
use crate::parsing::gxt::{parse_gxt_file, GxtGraph, GxtVertex};

/// Vertex attribute holding the level of a catlas node
pub const LEVEL_ATTRIBUTE: &str = "level";

/// Vertex attribute holding the domination-graph vertex of a level 0 node
pub const VERTEX_ATTRIBUTE: &str = "vertex";

/// A single catlas node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatlasNode {
    pub level: u32,
    pub size: u64,
    /// Domination-graph vertex; present exactly on level 0 nodes
    pub vertex: Option<NodeId>,
}

/// Parent/child structure of a catlas
#[derive(Debug, Clone, Default)]
pub struct CatlasHierarchy {
    nodes: BTreeMap<NodeId, CatlasNode>,
    children: BTreeMap<NodeId, BTreeSet<NodeId>>,
    has_parent: BTreeSet<NodeId>,
}

impl CatlasHierarchy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the hierarchy from a catlas GXT file
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Parse` if the file cannot be read, or
    /// `IndexError::InvalidHierarchy` if its content is inconsistent.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let graph = parse_gxt_file(path)?;
        Self::from_gxt(&graph)
    }

    /// Build the hierarchy from a parsed catlas GXT graph
    ///
    /// # Errors
    ///
    /// Returns `IndexError::InvalidHierarchy` for missing attributes,
    /// unparsable levels, level 0 nodes without a vertex, or edges that do not
    /// descend.
    pub fn from_gxt(graph: &GxtGraph) -> Result<Self, IndexError> {
        let level_idx = graph.vertex_attribute_index(LEVEL_ATTRIBUTE).ok_or_else(|| {
            IndexError::InvalidHierarchy(format!("missing '{LEVEL_ATTRIBUTE}' attribute"))
        })?;
        let vertex_idx = graph.vertex_attribute_index(VERTEX_ATTRIBUTE);

        let mut hierarchy = Self::new();
        for v in &graph.vertices {
            let level_value = attribute_value(v, level_idx)?;
            let level: u32 = level_value.trim().parse().map_err(|_| {
                IndexError::InvalidHierarchy(format!(
                    "node {} has invalid level '{level_value}'",
                    v.id
                ))
            })?;

            let vertex_value = match vertex_idx {
                Some(i) => attribute_value(v, i)?.trim(),
                None => "",
            };
            let vertex = if vertex_value.is_empty() {
                None
            } else {
                Some(vertex_value.parse::<NodeId>().map_err(|_| {
                    IndexError::InvalidHierarchy(format!(
                        "node {} has invalid vertex '{vertex_value}'",
                        v.id
                    ))
                })?)
            };

            hierarchy.add_node(v.id, level, v.size, vertex)?;
        }

        for e in &graph.edges {
            hierarchy.add_child(e.from, e.to)?;
        }

        Ok(hierarchy)
    }

    /// Add a node. Level 0 nodes must name their domination-graph vertex.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::InvalidHierarchy` for a duplicate id or a level 0
    /// node without a vertex.
    pub fn add_node(
        &mut self,
        id: NodeId,
        level: u32,
        size: u64,
        vertex: Option<NodeId>,
    ) -> Result<(), IndexError> {
        if level == 0 && vertex.is_none() {
            return Err(IndexError::InvalidHierarchy(format!(
                "level 0 node {id} has no domination-graph vertex"
            )));
        }
        if self.nodes.contains_key(&id) {
            return Err(IndexError::InvalidHierarchy(format!(
                "duplicate catlas node {id}"
            )));
        }
        // Only leaves keep the vertex
        let vertex = if level == 0 { vertex } else { None };
        self.nodes.insert(
            id,
            CatlasNode {
                level,
                size,
                vertex,
            },
        );
        Ok(())
    }

    /// Link `parent` to `child`. The child must sit on a strictly lower level.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::UnknownNode` if either node is missing, or
    /// `IndexError::InvalidHierarchy` if the edge does not descend.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), IndexError> {
        let parent_level = self.level(parent).ok_or(IndexError::UnknownNode(parent))?;
        let child_level = self.level(child).ok_or(IndexError::UnknownNode(child))?;
        if child_level >= parent_level {
            return Err(IndexError::InvalidHierarchy(format!(
                "edge {parent}->{child} goes from level {parent_level} to level {child_level}"
            )));
        }
        self.children.entry(parent).or_default().insert(child);
        self.has_parent.insert(child);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&CatlasNode> {
        self.nodes.get(&id)
    }

    #[must_use]
    pub fn level(&self, id: NodeId) -> Option<u32> {
        self.nodes.get(&id).map(|n| n.level)
    }

    /// Children of a node in ascending id order
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children.get(&id).into_iter().flatten().copied()
    }

    /// Nodes without a parent, in ascending id order
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes
            .keys()
            .copied()
            .filter(|id| !self.has_parent.contains(id))
            .collect()
    }

    /// All nodes on exactly `level`, in ascending id order
    pub fn nodes_at_level(&self, level: u32) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(move |(_, n)| n.level == level)
            .map(|(&id, _)| id)
    }

    #[must_use]
    pub fn max_level(&self) -> Option<u32> {
        self.nodes.values().map(|n| n.level).max()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Domination-graph vertices of all level 0 nodes beneath `id`
    /// (the vertex of `id` itself if it is on level 0).
    ///
    /// # Errors
    ///
    /// Returns `IndexError::UnknownNode` if `id` is not in the catlas.
    pub fn find_level0(&self, id: NodeId) -> Result<BTreeSet<NodeId>, IndexError> {
        if !self.nodes.contains_key(&id) {
            return Err(IndexError::UnknownNode(id));
        }

        let mut leaves = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut stack = vec![id];

        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            match self.nodes.get(&node) {
                Some(CatlasNode {
                    level: 0,
                    vertex: Some(vertex),
                    ..
                }) => {
                    leaves.insert(*vertex);
                }
                _ => stack.extend(self.children(node)),
            }
        }

        Ok(leaves)
    }
}

/// Attribute `idx` of a vertex, or an error for a record that is too short
pub(crate) fn attribute_value(v: &GxtVertex, idx: usize) -> Result<&str, IndexError> {
    v.values.get(idx).map(String::as_str).ok_or_else(|| {
        IndexError::InvalidHierarchy(format!("node {} is missing attribute {idx}", v.id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::gxt::parse_gxt_reader;

    /// ```text
    ///          100 (L2)
    ///         /       \
    ///    10 (L1)     11 (L1)
    ///    /    \     /    \
    ///  1(v7)  2(v8)       3(v9)
    /// ```
    fn small_catlas() -> CatlasHierarchy {
        let text = "\
6,6
id,size,level,vertex
1,1,0,7
2,1,0,8
3,1,0,9
10,2,1,
11,2,1,
100,3,2,
src,dest
10,1
10,2
11,2
11,3
100,10
100,11
";
        CatlasHierarchy::from_gxt(&parse_gxt_reader(text.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn test_structure() {
        let catlas = small_catlas();
        assert_eq!(catlas.len(), 6);
        assert_eq!(catlas.roots(), vec![100]);
        assert_eq!(catlas.max_level(), Some(2));
        assert_eq!(catlas.children(10).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(catlas.nodes_at_level(1).collect::<Vec<_>>(), vec![10, 11]);
        assert_eq!(catlas.get(1).unwrap().vertex, Some(7));
    }

    #[test]
    fn test_find_level0() {
        let catlas = small_catlas();
        assert_eq!(
            catlas.find_level0(100).unwrap(),
            [7, 8, 9].into_iter().collect()
        );
        assert_eq!(catlas.find_level0(11).unwrap(), [8, 9].into_iter().collect());
        assert_eq!(catlas.find_level0(3).unwrap(), [9].into_iter().collect());
        assert!(matches!(
            catlas.find_level0(55),
            Err(IndexError::UnknownNode(55))
        ));
    }

    #[test]
    fn test_rejects_level0_without_vertex() {
        let mut catlas = CatlasHierarchy::new();
        assert!(catlas.add_node(1, 0, 1, None).is_err());
    }

    #[test]
    fn test_rejects_non_descending_edge() {
        let mut catlas = CatlasHierarchy::new();
        catlas.add_node(1, 1, 1, None).unwrap();
        catlas.add_node(2, 1, 1, None).unwrap();
        assert!(matches!(
            catlas.add_child(1, 2),
            Err(IndexError::InvalidHierarchy(_))
        ));
        assert!(matches!(
            catlas.add_child(1, 3),
            Err(IndexError::UnknownNode(3))
        ));
    }

    #[test]
    fn test_missing_level_attribute() {
        let text = "1,0\nid,size\n1,1\nsrc,dest\n";
        let graph = parse_gxt_reader(text.as_bytes()).unwrap();
        assert!(matches!(
            CatlasHierarchy::from_gxt(&graph),
            Err(IndexError::InvalidHierarchy(_))
        ));
    }

    #[test]
    fn test_short_vertex_record_is_an_error() {
        let graph = GxtGraph {
            vertex_attributes: vec![LEVEL_ATTRIBUTE.to_string(), VERTEX_ATTRIBUTE.to_string()],
            vertices: vec![GxtVertex {
                id: 4,
                size: 1,
                values: vec!["0".to_string()],
            }],
            ..GxtGraph::default()
        };
        assert!(matches!(
            CatlasHierarchy::from_gxt(&graph),
            Err(IndexError::InvalidHierarchy(_))
        ));

        let graph = GxtGraph {
            vertices: vec![GxtVertex {
                id: 4,
                size: 1,
                values: Vec::new(),
            }],
            ..graph
        };
        assert!(matches!(
            CatlasHierarchy::from_gxt(&graph),
            Err(IndexError::InvalidHierarchy(_))
        ));
    }
}
