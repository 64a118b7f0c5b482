use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::{info, warn};

use crate::catalog::index::CatlasIndex;
use crate::cli::OutputFormat;
use crate::matching::engine::{SearchConfig, SearchEngine, SearchStrategy};
use crate::matching::evaluation::{
    format_metric, ClassificationEvaluator, EvaluationReport, CSV_HEADER,
};
use crate::parsing::records::parse_query_sketch_file;
use crate::utils::validation::parse_label_list;

#[derive(Args)]
pub struct SearchArgs {
    /// Catlas prefix directory
    pub catlas_prefix: PathBuf,

    /// Catlas radius
    pub catlas_r: u32,

    /// Query sketch (space-separated hashes)
    pub mh_file: PathBuf,

    /// Comma-separated labels the query is expected to match, e.g. "2,5"
    pub label_list: String,

    /// Search strategy
    #[arg(long, value_enum, default_value = "best_match")]
    pub strategy: SearchStrategy,

    /// Level used by the search_level and gather strategies
    #[arg(long = "searchlevel", default_value = "0")]
    pub search_level: u32,

    /// Only print the sensitivity and specificity
    #[arg(short, long)]
    pub quiet: bool,

    /// Append one result row to this CSV file
    #[arg(long)]
    pub append_csv: Option<PathBuf>,
}

/// Execute the search command
///
/// # Errors
///
/// Returns an error if the catlas or query cannot be loaded, the label list
/// is invalid, or the results cannot be written.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: SearchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let query_labels = parse_label_list(&args.label_list)?;

    let index = CatlasIndex::load(&args.catlas_prefix, args.catlas_r)
        .map_err(|e| anyhow::anyhow!("Failed to load catlas: {e}"))?;

    let query = parse_query_sketch_file(&args.mh_file)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", args.mh_file.display()))?;
    if query.is_empty() {
        warn!("query sketch {} is empty", args.mh_file.display());
    }
    if verbose {
        eprintln!(
            "Loaded catlas with {} nodes (max level {}), query has {} hashes",
            index.hierarchy.len(),
            index.hierarchy.max_level().unwrap_or(0),
            query.len()
        );
    }

    let config = SearchConfig {
        strategy: args.strategy,
        search_level: args.search_level,
    };
    info!("search strategy: {} {}", config.strategy, config.search_level);

    let matched_nodes = SearchEngine::new(&index).find_matches(&query, &config);
    let leaves = index.backtrack(&matched_nodes)?;
    let matrix =
        ClassificationEvaluator::new(&index.dominator_labels).evaluate(&leaves, &query_labels)?;

    let report = EvaluationReport {
        strategy: config.strategy,
        search_level: config.search_level,
        matched_nodes,
        leaves,
        query_labels,
        all_labels: index.all_labels(),
        matrix,
        sensitivity: matrix.sensitivity(),
        specificity: matrix.specificity(),
    };

    match format {
        OutputFormat::Text => print_text_report(&report, args.quiet),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Tsv => print_tsv_report(&report),
    }

    if let Some(path) = &args.append_csv {
        append_csv(path, &report)?;
    }

    Ok(())
}

fn print_text_report(report: &EvaluationReport, quiet: bool) {
    if !quiet {
        println!("search strategy: {} {}", report.strategy, report.search_level);
        println!(
            "found {} leaves under {} catlas nodes",
            report.leaves.len(),
            report.matched_nodes.len()
        );
        println!("labels we're looking for: {}", report.query_labels);
        println!("all labels: {}", report.all_labels);
        let m = &report.matrix;
        println!(
            "tp {}  fp {}  fn {}  tn {}  (total {})",
            m.true_positives,
            m.false_positives,
            m.false_negatives,
            m.true_negatives,
            m.total()
        );
    }
    println!("sensitivity: {}", format_metric(report.sensitivity));
    println!("specificity: {}", format_metric(report.specificity));
}

fn print_tsv_report(report: &EvaluationReport) {
    println!("strategy\tsearchlevel\tmatched\tleaves\ttp\tfp\tfn\ttn\tsens\tspec");
    let m = &report.matrix;
    println!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        report.strategy,
        report.search_level,
        report.matched_nodes.len(),
        report.leaves.len(),
        m.true_positives,
        m.false_positives,
        m.false_negatives,
        m.true_negatives,
        format_metric(report.sensitivity),
        format_metric(report.specificity)
    );
}

/// Append one row, writing the header first when the file is new or empty
fn append_csv(path: &Path, report: &EvaluationReport) -> anyhow::Result<()> {
    let needs_header = std::fs::metadata(path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {e}", path.display()))?;

    if needs_header {
        writeln!(file, "{CSV_HEADER}")?;
    }
    writeln!(file, "{}", report.csv_row())?;
    info!("appended results to {}", path.display());
    Ok(())
}
