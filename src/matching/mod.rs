//! Similarity search over catlas sketches and accuracy evaluation.
//!
//! - [`SearchEngine`]: matches a query sketch against catlas node sketches
//! - [`SearchStrategy`]: `best_match`, `search_level`, `gather_mins`, `gather_mins2`
//! - [`ClassificationEvaluator`]: confusion matrix against ground-truth labels
//!
//! ## Strategies
//!
//! 1. **best_match**: the single node with the highest estimated Jaccard similarity
//! 2. **search_level**: descend from the roots through the most similar children
//! 3. **gather_mins**: greedy cover of the query hashes by nodes on one level
//! 4. **gather_mins2**: the same cover, ranked against node sketch size
//!
//! Every tie is broken by the lowest node id, so repeated runs return the
//! same matches.
//!
//! ## Example
//!
//! ```rust,no_run
//! use catlas_search::catalog::index::CatlasIndex;
//! use catlas_search::matching::engine::{SearchConfig, SearchEngine, SearchStrategy};
//! use catlas_search::matching::evaluation::ClassificationEvaluator;
//! use catlas_search::parsing::records::parse_query_sketch_file;
//! use catlas_search::utils::validation::parse_label_list;
//! use std::path::Path;
//!
//! let index = CatlasIndex::load(Path::new("data/sample"), 1).unwrap();
//! let query = parse_query_sketch_file(Path::new("query.dump")).unwrap();
//!
//! let config = SearchConfig { strategy: SearchStrategy::GatherMins, search_level: 0 };
//! let matches = SearchEngine::new(&index).find_matches(&query, &config);
//! let leaves = index.backtrack(&matches).unwrap();
//!
//! let evaluator = ClassificationEvaluator::new(&index.dominator_labels);
//! let matrix = evaluator.evaluate(&leaves, &parse_label_list("1,2").unwrap()).unwrap();
//! println!("sensitivity: {:?}", matrix.sensitivity());
//! ```
//!
//! [`SearchEngine`]: engine::SearchEngine
//! [`SearchStrategy`]: engine::SearchStrategy
//! [`ClassificationEvaluator`]: evaluation::ClassificationEvaluator

pub mod engine;
pub mod evaluation;
pub mod scoring;
