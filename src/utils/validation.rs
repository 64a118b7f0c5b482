//! Validation of user-supplied paths and argument strings.

use std::path::{Component, Path};

use crate::core::types::{Label, LabelSet};

/// Maximum length of a catalog directory basename
pub const MAX_BASENAME_LENGTH: usize = 255;

/// Validation error types
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Catalog path has no usable directory name: {0}")]
    InvalidCatalogPath(String),
    #[error("Catalog directory name too long: exceeds {MAX_BASENAME_LENGTH} characters")]
    BasenameTooLong,
    #[error("Empty label list provided")]
    EmptyLabelList,
    #[error("Invalid label '{0}': labels are unsigned integers")]
    InvalidLabel(String),
}

/// Name shared by every file inside a catalog directory.
///
/// `data/sample/` yields `sample`, so its files are `data/sample/sample.gxt`,
/// `data/sample/sample.catlas.1.gxt` and so on. Trailing separators are
/// ignored.
///
/// # Errors
///
/// Returns `ValidationError::InvalidCatalogPath` if the path does not end in a
/// normal directory name (e.g. `/`, `..`, or an empty string), or
/// `ValidationError::BasenameTooLong` for an over-long name.
pub fn catalog_basename(dir: &Path) -> Result<String, ValidationError> {
    let name = match dir.components().next_back() {
        Some(Component::Normal(name)) => name.to_string_lossy().into_owned(),
        _ => {
            return Err(ValidationError::InvalidCatalogPath(
                dir.display().to_string(),
            ))
        }
    };

    if name.trim().is_empty() {
        return Err(ValidationError::InvalidCatalogPath(
            dir.display().to_string(),
        ));
    }
    if name.len() > MAX_BASENAME_LENGTH {
        return Err(ValidationError::BasenameTooLong);
    }

    Ok(name)
}

/// Parse a comma-separated ground-truth label list such as `"1,4,7"`.
/// Whitespace around entries is ignored.
///
/// # Errors
///
/// Returns `ValidationError::EmptyLabelList` when no labels are given, or
/// `ValidationError::InvalidLabel` for an entry that is not an unsigned integer.
pub fn parse_label_list(text: &str) -> Result<LabelSet, ValidationError> {
    let mut labels = LabelSet::new();
    for entry in text.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let label: Label = entry
            .parse()
            .map_err(|_| ValidationError::InvalidLabel(entry.to_string()))?;
        labels.insert(label);
    }

    if labels.is_empty() {
        return Err(ValidationError::EmptyLabelList);
    }
    Ok(labels)
}
