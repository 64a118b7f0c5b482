//! Serialize builder state to the GXT graph plus the sketch side-file.
//!
//! Vertices are written in ascending id order (which is allocation order) and
//! edges in first-insertion order, so identical build inputs always produce
//! byte-identical files.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::catalog::builder::SegmentGraphBuilder;
use crate::core::types::Label;
use crate::parsing::gxt::GxtWriter;
use crate::parsing::ParseError;
use crate::utils::validation::{catalog_basename, ValidationError};

/// Vertex attribute carrying the space-joined labels of a segment
pub const LABELS_ATTRIBUTE: &str = "labels";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Graph format error: {0}")]
    Format(#[from] ParseError),

    #[error("Invalid output directory: {0}")]
    Output(#[from] ValidationError),
}

/// What an export wrote
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub graph_path: PathBuf,
    pub sketch_path: PathBuf,
    pub nodes: usize,
    pub edges: usize,
    pub sketches: usize,
    /// Number of nodes carrying each label
    pub label_counts: BTreeMap<Label, usize>,
}

/// Writes a builder's graph and sketches
pub struct GraphExporter<'a> {
    builder: &'a SegmentGraphBuilder,
}

impl<'a> GraphExporter<'a> {
    pub fn new(builder: &'a SegmentGraphBuilder) -> Self {
        Self { builder }
    }

    /// Write one vertex per node (`id,size,labels`) and one edge per adjacency
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if writing fails.
    pub fn write_graph<W: Write>(&self, out: W) -> Result<W, ExportError> {
        let mut writer = GxtWriter::new(
            out,
            self.builder.node_count(),
            self.builder.edge_count(),
            &[LABELS_ATTRIBUTE],
            &[],
        )?;

        for (node, size) in self.builder.nodes() {
            let labels = self.builder.node_labels(node).to_string();
            writer.add_vertex(node, size, &[labels])?;
        }
        for (from, to) in self.builder.edges() {
            writer.add_edge::<&str>(from, to, &[])?;
        }

        Ok(writer.finish()?)
    }

    /// Write the sketch log, one `<node_id>,<hashes>` line per record
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Io` if writing fails.
    pub fn write_sketches<W: Write>(&self, mut out: W) -> Result<W, ExportError> {
        for record in self.builder.sketch_records() {
            writeln!(out, "{record}")?;
        }
        out.flush()?;
        Ok(out)
    }

    /// Write `<dir>/<basename>.gxt` and `<dir>/<basename>.mxt`
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if the directory name is unusable or a file
    /// cannot be written.
    pub fn export_to_dir(&self, dir: &Path) -> Result<ExportSummary, ExportError> {
        let basename = catalog_basename(dir)?;
        let graph_path = dir.join(format!("{basename}.gxt"));
        let sketch_path = dir.join(format!("{basename}.mxt"));

        info!("saving graph to {}", graph_path.display());
        self.write_graph(BufWriter::new(File::create(&graph_path)?))?;

        info!("saving sketches to {}", sketch_path.display());
        self.write_sketches(BufWriter::new(File::create(&sketch_path)?))?;

        Ok(ExportSummary {
            graph_path,
            sketch_path,
            nodes: self.builder.node_count(),
            edges: self.builder.edge_count(),
            sketches: self.builder.sketch_records().len(),
            label_counts: self.builder.label_counts(),
        })
    }
}
