use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::hierarchical::CatlasHierarchy;
use crate::catalog::index::CatlasIndex;
use crate::core::sketch::Sketch;
use crate::core::types::NodeId;
use crate::matching::scoring::{best_score, maximal_nodes, score_nodes, GatherCandidate};
use crate::parsing::records::SketchTable;

/// How catlas nodes are matched against a query sketch
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// The single most similar node in the whole catlas
    #[default]
    #[value(name = "best_match", alias = "bestnode")]
    BestMatch,
    /// Descend from the roots through the most similar children down to a level
    #[value(name = "search_level", alias = "searchlevel")]
    SearchLevel,
    /// Greedy cover of the query hashes by nodes on a level
    #[value(name = "gather_mins", alias = "gathermins")]
    GatherMins,
    /// Greedy cover weighted against node sketch size
    #[value(name = "gather_mins2", alias = "gathermins2")]
    GatherMins2,
}

impl SearchStrategy {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::BestMatch => "best_match",
            Self::SearchLevel => "search_level",
            Self::GatherMins => "gather_mins",
            Self::GatherMins2 => "gather_mins2",
        }
    }
}

impl std::fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Configuration for a search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub strategy: SearchStrategy,
    /// Target level for `search_level` and the candidate level for the
    /// gather strategies; ignored by `best_match`
    pub search_level: u32,
}

/// Matches query sketches against catlas node sketches
pub struct SearchEngine<'a> {
    hierarchy: &'a CatlasHierarchy,
    sketches: &'a SketchTable,
}

impl<'a> SearchEngine<'a> {
    /// Create an engine over a loaded catlas
    pub fn new(index: &'a CatlasIndex) -> Self {
        Self::with_parts(&index.hierarchy, &index.sketches)
    }

    pub fn with_parts(hierarchy: &'a CatlasHierarchy, sketches: &'a SketchTable) -> Self {
        Self {
            hierarchy,
            sketches,
        }
    }

    /// Run the configured strategy. An empty query or an empty sketch table
    /// always yields no matches.
    pub fn find_matches(&self, query: &Sketch, config: &SearchConfig) -> BTreeSet<NodeId> {
        if query.is_empty() || self.sketches.is_empty() {
            return BTreeSet::new();
        }

        let matches = match config.strategy {
            SearchStrategy::BestMatch => self.best_match(query),
            SearchStrategy::SearchLevel => self.search_level(query, config.search_level),
            SearchStrategy::GatherMins => self.gather_mins(query, config.search_level),
            SearchStrategy::GatherMins2 => self.gather_mins2(query, config.search_level),
        };
        debug!(
            "{} (level {}) matched {} catlas nodes",
            config.strategy,
            config.search_level,
            matches.len()
        );
        matches
    }

    /// The single node most similar to the query across every sketched node;
    /// ties go to the lowest id. Nothing is returned when no node shares a
    /// hash with the query.
    pub fn best_match(&self, query: &Sketch) -> BTreeSet<NodeId> {
        let scores = score_nodes(query, self.sketches, self.sketches.keys().copied());
        best_score(&scores).map(|s| s.node).into_iter().collect()
    }

    /// Top-down descent from the roots. Among each set of siblings only the
    /// children sharing the maximal positive similarity are followed; a
    /// followed node on or below `level` is selected instead of expanded.
    pub fn search_level(&self, query: &Sketch, level: u32) -> BTreeSet<NodeId> {
        let mut selected = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut stack = self.most_similar(query, self.hierarchy.roots());

        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            let Some(node_level) = self.hierarchy.level(node) else {
                continue;
            };
            if node_level <= level {
                selected.insert(node);
                continue;
            }
            stack.extend(self.most_similar(query, self.hierarchy.children(node)));
        }

        selected
    }

    /// Greedy set cover of the query hashes by nodes on `level`, picking the
    /// node that covers the most still-uncovered hashes each round
    pub fn gather_mins(&self, query: &Sketch, level: u32) -> BTreeSet<NodeId> {
        self.gather(query, level, GatherCandidate::cmp_by_coverage)
    }

    /// As [`SearchEngine::gather_mins`], but ranked by coverage weighted
    /// against sketch size (see [`GatherCandidate::cmp_by_weighted_coverage`])
    pub fn gather_mins2(&self, query: &Sketch, level: u32) -> BTreeSet<NodeId> {
        self.gather(query, level, GatherCandidate::cmp_by_weighted_coverage)
    }

    fn most_similar(
        &self,
        query: &Sketch,
        candidates: impl IntoIterator<Item = NodeId>,
    ) -> Vec<NodeId> {
        maximal_nodes(&score_nodes(query, self.sketches, candidates))
    }

    fn gather(
        &self,
        query: &Sketch,
        level: u32,
        rank: fn(&GatherCandidate, &GatherCandidate) -> std::cmp::Ordering,
    ) -> BTreeSet<NodeId> {
        let mut uncovered: BTreeSet<u64> = query.hashes().iter().copied().collect();
        let mut pool: Vec<(NodeId, &Sketch)> = self
            .hierarchy
            .nodes_at_level(level)
            .filter_map(|node| self.sketches.get(&node).map(|s| (node, s)))
            .collect();
        let mut selected = BTreeSet::new();

        while !uncovered.is_empty() {
            let mut best: Option<(usize, GatherCandidate)> = None;
            for (i, (node, sketch)) in pool.iter().enumerate() {
                let covered = sketch
                    .hashes()
                    .iter()
                    .filter(|h| uncovered.contains(*h))
                    .count();
                if covered == 0 {
                    continue;
                }
                let candidate = GatherCandidate {
                    node: *node,
                    covered,
                    sketch_size: sketch.len(),
                };
                let better = match &best {
                    None => true,
                    Some((_, current)) => rank(&candidate, current).is_gt(),
                };
                if better {
                    best = Some((i, candidate));
                }
            }

            let Some((i, candidate)) = best else {
                break;
            };
            let (node, sketch) = pool.remove(i);
            for hash in sketch.hashes() {
                uncovered.remove(hash);
            }
            debug!(
                "gathered node {} covering {} hashes, {} left",
                node,
                candidate.covered,
                uncovered.len()
            );
            selected.insert(node);
        }

        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sketch(hashes: impl IntoIterator<Item = u64>) -> Sketch {
        Sketch::from_hashes(hashes)
    }

    /// Flat catlas: every node on level 0
    fn flat(nodes: &[NodeId]) -> CatlasHierarchy {
        let mut hierarchy = CatlasHierarchy::new();
        for &node in nodes {
            hierarchy.add_node(node, 0, 1, Some(node)).unwrap();
        }
        hierarchy
    }

    fn config(strategy: SearchStrategy, search_level: u32) -> SearchConfig {
        SearchConfig {
            strategy,
            search_level,
        }
    }

    #[test]
    fn test_strategy_names() {
        use clap::ValueEnum;

        for strategy in SearchStrategy::value_variants() {
            let value = strategy.to_possible_value().unwrap();
            assert_eq!(value.get_name(), strategy.name());
            assert_eq!(strategy.to_string(), strategy.name());
            assert_eq!(
                SearchStrategy::from_str(strategy.name(), false),
                Ok(*strategy)
            );
        }
        assert_eq!(
            SearchStrategy::from_str("bestnode", false),
            Ok(SearchStrategy::BestMatch)
        );
        assert_eq!(
            SearchStrategy::from_str("gathermins2", false),
            Ok(SearchStrategy::GatherMins2)
        );
        assert!(SearchStrategy::from_str("closest", false).is_err());
        assert_eq!(SearchStrategy::default(), SearchStrategy::BestMatch);
    }

    #[test]
    fn test_best_match_ties_go_to_lowest_id() {
        // A and C score 0.9, B scores 0.5
        let (a, b, c) = (1, 2, 3);
        let mut table = SketchTable::new();
        table.insert(c, sketch((1..=9).chain([11])));
        table.insert(b, sketch((1..=5).chain(11..=15)));
        table.insert(a, sketch((1..=9).chain([11])));
        let hierarchy = flat(&[a, b, c]);

        let engine = SearchEngine::with_parts(&hierarchy, &table);
        let query = sketch(1..=10);
        let matches = engine.find_matches(&query, &config(SearchStrategy::BestMatch, 0));
        assert_eq!(matches, [a].into_iter().collect());
    }

    #[test]
    fn test_best_match_without_shared_hashes() {
        let mut table = SketchTable::new();
        table.insert(1, sketch([100, 200]));
        let hierarchy = flat(&[1]);
        let engine = SearchEngine::with_parts(&hierarchy, &table);
        assert!(engine.best_match(&sketch([1, 2])).is_empty());
    }

    #[test]
    fn test_gather_mins_covers_query() {
        let (x, y) = (1, 2);
        let mut table = SketchTable::new();
        table.insert(x, sketch([1, 2]));
        table.insert(y, sketch([3, 4]));
        table.insert(3, sketch([50, 60]));
        let hierarchy = flat(&[x, y, 3]);

        let engine = SearchEngine::with_parts(&hierarchy, &table);
        let matches = engine.find_matches(
            &sketch([1, 2, 3, 4]),
            &config(SearchStrategy::GatherMins, 0),
        );
        assert_eq!(matches, [x, y].into_iter().collect());
    }

    #[test]
    fn test_gather_strategies_differ_on_broad_nodes() {
        let (broad, narrow_a, narrow_b) = (1, 2, 3);
        let mut table = SketchTable::new();
        table.insert(broad, sketch([1, 2, 3].into_iter().chain(10..21)));
        table.insert(narrow_a, sketch([1, 2]));
        table.insert(narrow_b, sketch([3, 4]));
        let hierarchy = flat(&[broad, narrow_a, narrow_b]);
        let engine = SearchEngine::with_parts(&hierarchy, &table);
        let query = sketch([1, 2, 3, 4]);

        assert_eq!(
            engine.gather_mins(&query, 0),
            [broad, narrow_b].into_iter().collect()
        );
        assert_eq!(
            engine.gather_mins2(&query, 0),
            [narrow_a, narrow_b].into_iter().collect()
        );
    }

    #[test]
    fn test_gather_mins_stops_when_nothing_covers() {
        let mut table = SketchTable::new();
        table.insert(1, sketch([1]));
        let hierarchy = flat(&[1]);
        let engine = SearchEngine::with_parts(&hierarchy, &table);
        assert_eq!(
            engine.gather_mins(&sketch([1, 99]), 0),
            [1].into_iter().collect()
        );
    }

    #[test]
    fn test_gather_only_uses_requested_level() {
        let mut hierarchy = CatlasHierarchy::new();
        hierarchy.add_node(1, 0, 1, Some(1)).unwrap();
        hierarchy.add_node(2, 1, 1, None).unwrap();
        hierarchy.add_child(2, 1).unwrap();
        let mut table = SketchTable::new();
        table.insert(1, sketch([1]));
        table.insert(2, sketch([1, 2]));

        let engine = SearchEngine::with_parts(&hierarchy, &table);
        let query = sketch([1, 2]);
        assert_eq!(engine.gather_mins(&query, 0), [1].into_iter().collect());
        assert_eq!(engine.gather_mins(&query, 1), [2].into_iter().collect());
        assert!(engine.gather_mins(&query, 5).is_empty());
    }

    #[test]
    fn test_search_level_descends_through_best_children() {
        //        100 (L2)
        //       /    \
        //    10 (L1)  11 (L1)
        //    / \       / \
        //   1   2     3   4     (L0)
        let mut hierarchy = CatlasHierarchy::new();
        for leaf in 1..=4 {
            hierarchy.add_node(leaf, 0, 1, Some(leaf)).unwrap();
        }
        hierarchy.add_node(10, 1, 2, None).unwrap();
        hierarchy.add_node(11, 1, 2, None).unwrap();
        hierarchy.add_node(100, 2, 4, None).unwrap();
        for (parent, child) in [(10, 1), (10, 2), (11, 3), (11, 4), (100, 10), (100, 11)] {
            hierarchy.add_child(parent, child).unwrap();
        }

        let mut table = SketchTable::new();
        table.insert(1, sketch([1, 2]));
        table.insert(2, sketch([5, 6]));
        table.insert(3, sketch([7, 8]));
        table.insert(4, sketch([9, 10]));
        table.insert(10, sketch([1, 2, 5, 6]));
        table.insert(11, sketch([7, 8, 9, 10]));
        table.insert(100, sketch(1..=10));

        let engine = SearchEngine::with_parts(&hierarchy, &table);
        let query = sketch([1, 2, 3]);

        assert_eq!(engine.search_level(&query, 2), [100].into_iter().collect());
        assert_eq!(engine.search_level(&query, 1), [10].into_iter().collect());
        assert_eq!(engine.search_level(&query, 0), [1].into_iter().collect());
    }

    #[test]
    fn test_search_level_follows_tied_children() {
        let mut hierarchy = CatlasHierarchy::new();
        hierarchy.add_node(1, 0, 1, Some(1)).unwrap();
        hierarchy.add_node(2, 0, 1, Some(2)).unwrap();
        hierarchy.add_node(10, 1, 2, None).unwrap();
        hierarchy.add_child(10, 1).unwrap();
        hierarchy.add_child(10, 2).unwrap();

        let mut table = SketchTable::new();
        table.insert(1, sketch([1, 5]));
        table.insert(2, sketch([2, 6]));
        table.insert(10, sketch([1, 2, 5, 6]));

        let engine = SearchEngine::with_parts(&hierarchy, &table);
        assert_eq!(
            engine.search_level(&sketch([1, 2]), 0),
            [1, 2].into_iter().collect()
        );
    }

    #[test]
    fn test_empty_inputs_yield_no_matches() {
        let hierarchy = flat(&[1]);
        let mut table = SketchTable::new();
        table.insert(1, sketch([1]));
        let engine = SearchEngine::with_parts(&hierarchy, &table);

        for strategy in [
            SearchStrategy::BestMatch,
            SearchStrategy::SearchLevel,
            SearchStrategy::GatherMins,
            SearchStrategy::GatherMins2,
        ] {
            assert!(engine
                .find_matches(&Sketch::default(), &config(strategy, 0))
                .is_empty());
        }

        let empty = SketchTable::new();
        let engine = SearchEngine::with_parts(&hierarchy, &empty);
        assert!(engine
            .find_matches(&sketch([1]), &config(SearchStrategy::BestMatch, 0))
            .is_empty());
    }
}
