use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Identifier of a cDBG segment, a domination-graph vertex, or a catlas node
pub type NodeId = u64;

/// Hash value of a k-mer, used as the stable identity key of a segment
pub type KmerHash = u64;

/// Identifier of the contig or genome a k-mer came from
pub type Label = u32;

/// Default k-mer size used when building a graph
pub const DEFAULT_KSIZE: u32 = 31;

/// An ordered set of labels
///
/// Ordering is what makes the serialized `labels` attribute reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet(BTreeSet<Label>);

impl LabelSet {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Add a label, returning whether it was newly inserted
    pub fn insert(&mut self, label: Label) -> bool {
        self.0.insert(label)
    }

    /// Merge every label of `other` into this set
    pub fn union_with(&mut self, other: &LabelSet) {
        self.0.extend(other.0.iter().copied());
    }

    /// Does this set share at least one label with `other`?
    #[must_use]
    pub fn intersects(&self, other: &LabelSet) -> bool {
        // Probe the smaller side
        let (small, large) = if self.0.len() <= other.0.len() {
            (&self.0, &other.0)
        } else {
            (&other.0, &self.0)
        };
        small.iter().any(|label| large.contains(label))
    }

    #[must_use]
    pub fn contains(&self, label: Label) -> bool {
        self.0.contains(&label)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Label> + '_ {
        self.0.iter().copied()
    }

    /// Parse the space-joined form written to the `labels` vertex attribute.
    /// An empty or all-whitespace string is an empty set.
    ///
    /// # Errors
    ///
    /// Returns the offending token when a label is not an unsigned integer.
    pub fn parse_space_joined(text: &str) -> Result<Self, String> {
        text.split_whitespace()
            .map(|token| token.parse::<Label>().map_err(|_| token.to_string()))
            .collect()
    }
}

impl FromIterator<Label> for LabelSet {
    fn from_iter<I: IntoIterator<Item = Label>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Label> for LabelSet {
    fn extend<I: IntoIterator<Item = Label>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl std::fmt::Display for LabelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for label in &self.0 {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{label}")?;
            first = false;
        }
        Ok(())
    }
}
