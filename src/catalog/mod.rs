//! Building, persisting, and loading the catlas.
//!
//! The build side assigns ids to cDBG segments and writes the graph:
//!
//! - [`builder`]: [`SegmentGraphBuilder`] tracks segments, adjacency, labels, and sketches
//! - [`store`]: versioned bincode snapshot of a builder between passes
//! - [`export`]: [`GraphExporter`] writes the GXT graph and the sketch side-file
//!
//! The search side reads a catlas of one radius back:
//!
//! - [`hierarchical`]: [`CatlasHierarchy`], the multi-level dominating-set DAG
//! - [`index`]: [`CatlasIndex`], hierarchy plus label maps and node sketches
//!
//! ## Example
//!
//! ```rust,no_run
//! use catlas_search::catalog::index::CatlasIndex;
//! use std::path::Path;
//!
//! let index = CatlasIndex::load(Path::new("data/sample"), 1).unwrap();
//! for leaf in index.find_level0(42).unwrap() {
//!     println!("{leaf}: {}", index.dominator_labels[&leaf]);
//! }
//! ```
//!
//! [`SegmentGraphBuilder`]: builder::SegmentGraphBuilder
//! [`GraphExporter`]: export::GraphExporter
//! [`CatlasHierarchy`]: hierarchical::CatlasHierarchy
//! [`CatlasIndex`]: index::CatlasIndex

pub mod builder;
pub mod export;
pub mod hierarchical;
pub mod index;
pub mod store;
