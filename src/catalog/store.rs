use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::catalog::builder::SegmentGraphBuilder;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode snapshot: {0}")]
    Decode(#[from] bincode::Error),
}

/// Snapshot version for compatibility checking
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// File suffix appended to the graph file name for a builder snapshot
pub const SNAPSHOT_SUFFIX: &str = ".snapshot";

/// Serialized builder state, written at the end of the build pass and read
/// back by the dump pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub version: String,
    pub created_at: String,
    pub builder: SegmentGraphBuilder,
}

impl GraphSnapshot {
    #[must_use]
    pub fn new(builder: SegmentGraphBuilder) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            builder,
        }
    }

    /// Write the snapshot with bincode
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the file cannot be created or written.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let mut out = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut out, self)?;
        out.flush()?;
        Ok(())
    }

    /// Read a snapshot written by [`GraphSnapshot::save`]
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the file cannot be read or decoded.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: Self = bincode::deserialize_from(reader)?;

        // Version check (warn but don't fail)
        if snapshot.version != SNAPSHOT_VERSION {
            warn!(
                "Snapshot version mismatch (expected {}, found {})",
                SNAPSHOT_VERSION, snapshot.version
            );
        }

        Ok(snapshot)
    }
}
