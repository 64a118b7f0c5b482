use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::catalog::export::{ExportSummary, GraphExporter};
use crate::catalog::store::{GraphSnapshot, SNAPSHOT_SUFFIX};
use crate::cli::OutputFormat;
use crate::utils::validation::catalog_basename;

#[derive(Args)]
pub struct DumpArgs {
    /// Output directory; its name is the basename of every file in it
    #[arg(required = true)]
    pub output: PathBuf,

    /// Builder snapshot to load [default: <output>/<name>.gxt.snapshot]
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

/// Execute the dump command
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or the output files
/// cannot be written.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: DumpArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let snapshot_path = match &args.snapshot {
        Some(path) => path.clone(),
        None => {
            let name = catalog_basename(&args.output)?;
            args.output.join(format!("{name}.gxt{SNAPSHOT_SUFFIX}"))
        }
    };

    info!("loading snapshot {}", snapshot_path.display());
    let snapshot = GraphSnapshot::load(&snapshot_path).map_err(|e| {
        anyhow::anyhow!("Failed to load snapshot {}: {e}", snapshot_path.display())
    })?;

    if verbose {
        eprintln!(
            "Snapshot: {} nodes, {} edges, k={} (created {})",
            snapshot.builder.node_count(),
            snapshot.builder.edge_count(),
            snapshot.builder.ksize,
            snapshot.created_at
        );
    }

    let summary = GraphExporter::new(&snapshot.builder).export_to_dir(&args.output)?;

    match format {
        OutputFormat::Text => print_text_summary(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Tsv => print_tsv_summary(&summary),
    }

    Ok(())
}

fn print_text_summary(summary: &ExportSummary) {
    println!("Graph: {}", summary.graph_path.display());
    println!("Sketches: {}", summary.sketch_path.display());
    println!("  Nodes: {}", summary.nodes);
    println!("  Edges: {}", summary.edges);
    println!("  Sketch records: {}", summary.sketches);
    println!("  Distinct labels: {}", summary.label_counts.len());
    for (label, count) in &summary.label_counts {
        println!("    {label}: {count} nodes");
    }
}

fn print_tsv_summary(summary: &ExportSummary) {
    println!("nodes\tedges\tsketches\tlabels");
    println!(
        "{}\t{}\t{}\t{}",
        summary.nodes,
        summary.edges,
        summary.sketches,
        summary.label_counts.len()
    );
}
