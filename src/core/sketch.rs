//! Bottom-k MinHash sketches.
//!
//! A sketch keeps the smallest hash values of a k-mer set. Computing sketches
//! from sequence is done upstream; this type only holds, compares, and prints
//! already-computed hash lists.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Helper function to convert usize count to f64 with explicit precision loss allowance
#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// A sorted, de-duplicated list of minimum hash values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sketch {
    mins: Vec<u64>,
}

impl Sketch {
    /// Build a sketch from hash values in any order. The capacity of the
    /// sketch is the number of distinct hashes supplied.
    pub fn from_hashes(hashes: impl IntoIterator<Item = u64>) -> Self {
        let mut mins: Vec<u64> = hashes.into_iter().collect();
        mins.sort_unstable();
        mins.dedup();
        Self { mins }
    }

    #[must_use]
    pub fn hashes(&self) -> &[u64] {
        &self.mins
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mins.is_empty()
    }

    #[must_use]
    pub fn contains(&self, hash: u64) -> bool {
        self.mins.binary_search(&hash).is_ok()
    }

    /// Number of hash values present in both sketches
    #[must_use]
    pub fn overlap(&self, other: &Sketch) -> usize {
        let (mut i, mut j, mut shared) = (0, 0, 0);
        while i < self.mins.len() && j < other.mins.len() {
            match self.mins[i].cmp(&other.mins[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    shared += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        shared
    }

    /// Estimated Jaccard similarity.
    ///
    /// With `k = min(|a|, |b|)`, the `k` smallest hashes of the union form an
    /// unbiased sample of the union; the estimate is the fraction of that
    /// sample found in both sketches.
    #[must_use]
    pub fn jaccard(&self, other: &Sketch) -> f64 {
        let k = self.mins.len().min(other.mins.len());
        if k == 0 {
            return 0.0;
        }

        let (mut i, mut j, mut taken, mut shared) = (0, 0, 0, 0);
        while taken < k {
            let a = self.mins.get(i);
            let b = other.mins.get(j);
            match (a, b) {
                (Some(x), Some(y)) => match x.cmp(y) {
                    Ordering::Less => i += 1,
                    Ordering::Greater => j += 1,
                    Ordering::Equal => {
                        shared += 1;
                        i += 1;
                        j += 1;
                    }
                },
                (Some(_), None) => i += 1,
                (None, Some(_)) => j += 1,
                (None, None) => break,
            }
            taken += 1;
        }

        count_to_f64(shared) / count_to_f64(k)
    }
}

impl std::fmt::Display for Sketch {
    /// Space-joined hash values, the form used in sketch files
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for hash in &self.mins {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{hash}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hashes_sorts_and_dedups() {
        let sketch = Sketch::from_hashes([5, 1, 3, 1]);
        assert_eq!(sketch.hashes(), &[1, 3, 5]);
        assert!(sketch.contains(3));
        assert!(!sketch.contains(2));
    }

    #[test]
    fn test_overlap() {
        let a = Sketch::from_hashes([1, 2, 3, 4]);
        let b = Sketch::from_hashes([3, 4, 5]);
        assert_eq!(a.overlap(&b), 2);
        assert_eq!(b.overlap(&a), 2);
    }

    #[test]
    fn test_jaccard_identical() {
        let a = Sketch::from_hashes(1..=10);
        assert!((a.jaccard(&a) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_jaccard_partial() {
        let query = Sketch::from_hashes(1..=10);
        let nine = Sketch::from_hashes((1..=9).chain([11]));
        let five = Sketch::from_hashes((1..=5).chain(11..=15));
        assert!((query.jaccard(&nine) - 0.9).abs() < 1e-9);
        assert!((query.jaccard(&five) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_jaccard_disjoint_and_empty() {
        let a = Sketch::from_hashes([1, 2]);
        let b = Sketch::from_hashes([3, 4]);
        assert_eq!(a.jaccard(&b), 0.0);
        assert_eq!(a.jaccard(&Sketch::default()), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Sketch::from_hashes([20, 10]).to_string(), "10 20");
        assert_eq!(Sketch::default().to_string(), "");
    }
}
