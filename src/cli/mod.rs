//! Command-line interface for catlas-search.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **dump**: Write the graph and sketch files from a saved builder snapshot
//! - **search**: Match a query sketch against a catlas and score it against known labels
//!
//! ## Usage
//!
//! ```text
//! # Write data/sample/sample.gxt and data/sample/sample.mxt
//! catlas-search dump data/sample
//!
//! # Classify a query at radius 1, expecting labels 2 and 5
//! catlas-search search data/sample 1 query.dump 2,5 --strategy gather_mins
//!
//! # Collect results from many runs
//! catlas-search search data/sample 1 query.dump 2,5 -q --append-csv results.csv
//! ```

use clap::{Parser, Subcommand};

pub mod dump;
pub mod search;

#[derive(Parser)]
#[command(name = "catlas-search")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Build and search catlas indexes of compact de Bruijn graphs")]
#[command(
    long_about = "catlas-search writes compact de Bruijn graphs and classifies query sketches against the catlas built over them.\n\nA search reports which dominating nodes of the graph match the query and how well those nodes agree with a set of ground-truth labels:\n- Sensitivity: share of labelled nodes that were found\n- Specificity: share of unlabelled nodes that were left out"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the graph and sketch files from a builder snapshot
    Dump(dump::DumpArgs),

    /// Search a catlas with a query sketch and evaluate the matches
    Search(search::SearchArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
