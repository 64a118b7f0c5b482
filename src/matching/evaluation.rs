//! Accuracy of a search against ground-truth labels.
//!
//! Every dominating node of the catlas is either matched (it lies under one of
//! the matched catlas nodes) or not, and either carries one of the query
//! labels or not. The four combinations form a confusion matrix from which
//! sensitivity and specificity are derived.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;

use crate::core::types::{LabelSet, NodeId};
use crate::matching::engine::SearchStrategy;

/// Helper function to convert usize count to f64 with explicit precision loss allowance
#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("Matched node {0} is not a dominating node of this catlas")]
    OutsideUniverse(NodeId),

    #[error("Confusion matrix covers {counted} nodes but the catlas has {universe}")]
    PartitionMismatch { counted: usize, universe: usize },
}

/// Counts of the four classification outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    /// Matched and labelled with a query label
    pub true_positives: usize,
    /// Matched but without any query label
    pub false_positives: usize,
    /// Unmatched but labelled with a query label
    pub false_negatives: usize,
    /// Unmatched and without any query label
    pub true_negatives: usize,
}

impl ConfusionMatrix {
    #[must_use]
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }

    /// `100·TP/(TP+FN)`, or `None` when no node carries a query label
    #[must_use]
    pub fn sensitivity(&self) -> Option<f64> {
        percentage(
            self.true_positives,
            self.true_positives + self.false_negatives,
        )
    }

    /// `100·TN/(TN+FP)`, or `None` when every node carries a query label
    #[must_use]
    pub fn specificity(&self) -> Option<f64> {
        percentage(
            self.true_negatives,
            self.true_negatives + self.false_positives,
        )
    }
}

fn percentage(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| 100.0 * count_to_f64(part) / count_to_f64(whole))
}

/// Scores backtracked matches against the labelled dominating nodes
pub struct ClassificationEvaluator<'a> {
    /// The universe: every dominating node and its labels
    dominator_labels: &'a BTreeMap<NodeId, LabelSet>,
}

impl<'a> ClassificationEvaluator<'a> {
    pub fn new(dominator_labels: &'a BTreeMap<NodeId, LabelSet>) -> Self {
        Self { dominator_labels }
    }

    /// Number of dominating nodes that take part in the evaluation
    #[must_use]
    pub fn universe_size(&self) -> usize {
        self.dominator_labels.len()
    }

    /// Classify every dominating node given the matched ones
    ///
    /// # Errors
    ///
    /// Returns `EvaluationError::OutsideUniverse` if a matched node is not a
    /// dominating node, or `EvaluationError::PartitionMismatch` if the four
    /// counts do not add up to the universe size.
    pub fn evaluate(
        &self,
        matched: &BTreeSet<NodeId>,
        query_labels: &LabelSet,
    ) -> Result<ConfusionMatrix, EvaluationError> {
        if let Some(&stray) = matched
            .iter()
            .find(|node| !self.dominator_labels.contains_key(*node))
        {
            return Err(EvaluationError::OutsideUniverse(stray));
        }

        let mut matrix = ConfusionMatrix::default();
        for (node, labels) in self.dominator_labels {
            let positive = matched.contains(node);
            let relevant = labels.intersects(query_labels);
            match (positive, relevant) {
                (true, true) => matrix.true_positives += 1,
                (true, false) => matrix.false_positives += 1,
                (false, true) => matrix.false_negatives += 1,
                (false, false) => matrix.true_negatives += 1,
            }
        }

        if matrix.total() != self.universe_size() {
            return Err(EvaluationError::PartitionMismatch {
                counted: matrix.total(),
                universe: self.universe_size(),
            });
        }
        Ok(matrix)
    }
}

/// Everything a search run reports
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub strategy: SearchStrategy,
    pub search_level: u32,
    /// Catlas nodes chosen by the search
    pub matched_nodes: BTreeSet<NodeId>,
    /// Dominating nodes under the matched catlas nodes
    pub leaves: BTreeSet<NodeId>,
    pub query_labels: LabelSet,
    pub all_labels: LabelSet,
    pub matrix: ConfusionMatrix,
    pub sensitivity: Option<f64>,
    pub specificity: Option<f64>,
}

impl EvaluationReport {
    /// One appended CSV row: `sens, spec, tp, fp, fn, tn, strategy, searchlevel`.
    /// Undefined metrics are written as `NA`.
    #[must_use]
    pub fn csv_row(&self) -> String {
        format!(
            "{}, {}, {}, {}, {}, {}, {}, {}",
            format_metric(self.sensitivity),
            format_metric(self.specificity),
            self.matrix.true_positives,
            self.matrix.false_positives,
            self.matrix.false_negatives,
            self.matrix.true_negatives,
            self.strategy,
            self.search_level
        )
    }
}

/// Header line written before the first CSV row of a new file
pub const CSV_HEADER: &str = "sens, spec, tp, fp, fn, tn, strategy, searchlevel";

/// A percentage with one decimal, or `NA` when undefined
#[must_use]
pub fn format_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "NA".to_string(), |v| format!("{v:.1}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[u32]) -> LabelSet {
        values.iter().copied().collect()
    }

    fn universe() -> BTreeMap<NodeId, LabelSet> {
        let mut universe = BTreeMap::new();
        universe.insert(1, labels(&[1]));
        universe.insert(2, labels(&[1, 2]));
        universe.insert(3, labels(&[2]));
        universe.insert(4, labels(&[]));
        universe.insert(5, labels(&[1]));
        universe
    }

    #[test]
    fn test_confusion_matrix() {
        let universe = universe();
        let evaluator = ClassificationEvaluator::new(&universe);
        let matched = [1, 2, 3].into_iter().collect();
        let matrix = evaluator.evaluate(&matched, &labels(&[1])).unwrap();

        assert_eq!(
            matrix,
            ConfusionMatrix {
                true_positives: 2,
                false_positives: 1,
                false_negatives: 1,
                true_negatives: 1,
            }
        );
        assert_eq!(matrix.total(), evaluator.universe_size());
        assert!((matrix.sensitivity().unwrap() - 100.0 * 2.0 / 3.0).abs() < 1e-9);
        assert!((matrix.specificity().unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_partition_is_complete_for_any_query() {
        let universe = universe();
        let evaluator = ClassificationEvaluator::new(&universe);
        for matched in [vec![], vec![4], vec![1, 2, 3, 4, 5]] {
            for query in [labels(&[1]), labels(&[9]), labels(&[1, 2])] {
                let matched = matched.iter().copied().collect();
                let matrix = evaluator.evaluate(&matched, &query).unwrap();
                assert_eq!(matrix.total(), 5);
            }
        }
    }

    #[test]
    fn test_match_outside_universe_is_an_error() {
        let universe = universe();
        let evaluator = ClassificationEvaluator::new(&universe);
        let matched = [1, 42].into_iter().collect();
        assert_eq!(
            evaluator.evaluate(&matched, &labels(&[1])),
            Err(EvaluationError::OutsideUniverse(42))
        );
    }

    #[test]
    fn test_undefined_metrics() {
        let universe = universe();
        let evaluator = ClassificationEvaluator::new(&universe);

        // No node carries label 9: sensitivity has no denominator
        let matrix = evaluator
            .evaluate(&BTreeSet::new(), &labels(&[9]))
            .unwrap();
        assert_eq!(matrix.sensitivity(), None);
        assert_eq!(matrix.specificity(), Some(100.0));

        let empty = BTreeMap::new();
        let matrix = ClassificationEvaluator::new(&empty)
            .evaluate(&BTreeSet::new(), &labels(&[1]))
            .unwrap();
        assert_eq!(matrix.sensitivity(), None);
        assert_eq!(matrix.specificity(), None);
    }

    #[test]
    fn test_csv_row() {
        let report = EvaluationReport {
            strategy: SearchStrategy::GatherMins,
            search_level: 2,
            matched_nodes: BTreeSet::new(),
            leaves: BTreeSet::new(),
            query_labels: labels(&[1]),
            all_labels: labels(&[1, 2]),
            matrix: ConfusionMatrix {
                true_positives: 2,
                false_positives: 1,
                false_negatives: 1,
                true_negatives: 0,
            },
            sensitivity: Some(200.0 / 3.0),
            specificity: None,
        };
        assert_eq!(report.csv_row(), "66.7, NA, 2, 1, 1, 0, gather_mins, 2");
    }
}
