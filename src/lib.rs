//! # catlas-search
//!
//! A library for building compact de Bruijn graphs and classifying query
//! sketches against a catlas built over them.
//!
//! A catlas is a hierarchy of node groupings over a graph's dominating set.
//! Every catlas node carries a bottom-k MinHash sketch of the k-mers beneath it,
//! so a query sketch can be placed in the graph by comparing sketches instead
//! of sequences. When the graph nodes carry ground-truth labels, the placement
//! can be scored.
//!
//! ## Features
//!
//! - **Graph building**: Incremental cDBG construction with per-k-mer labels
//! - **Export**: Graph and sketch files in a plain text format
//! - **Search strategies**: Best match, level descent, and greedy hash covering
//! - **Evaluation**: Confusion matrix, sensitivity, and specificity per query
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use catlas_search::{CatlasIndex, ClassificationEvaluator, SearchConfig, SearchEngine};
//! use catlas_search::parsing::records::parse_query_sketch_text;
//!
//! // Load the radius-1 catlas stored under data/sample
//! let index = CatlasIndex::load(Path::new("data/sample"), 1).unwrap();
//!
//! // Match a query sketch
//! let query = parse_query_sketch_text("11 42 97 310").unwrap();
//! let engine = SearchEngine::new(&index);
//! let matches = engine.find_matches(&query, &SearchConfig::default());
//!
//! // Score the dominating nodes under the matches against label 2
//! let leaves = index.backtrack(&matches).unwrap();
//! let labels = [2].into_iter().collect();
//! let matrix = ClassificationEvaluator::new(&index.dominator_labels)
//!     .evaluate(&leaves, &labels)
//!     .unwrap();
//! println!("sensitivity: {:?}", matrix.sensitivity());
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Graph building, export, snapshots, and the catlas index
//! - [`core`]: Core data types for labels and sketches
//! - [`matching`]: Search strategies and classification evaluation
//! - [`parsing`]: Readers and writers for the graph and record files
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod matching;
pub mod parsing;
pub mod utils;

pub use catalog::builder::SegmentGraphBuilder;
pub use catalog::export::GraphExporter;
pub use catalog::index::CatlasIndex;
pub use core::sketch::Sketch;
pub use core::types::LabelSet;
pub use matching::engine::{SearchConfig, SearchEngine, SearchStrategy};
pub use matching::evaluation::ClassificationEvaluator;
