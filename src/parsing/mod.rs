//! Readers and writers for the flat files that make up a catlas.
//!
//! This module provides:
//!
//! - **GXT graphs** ([`gxt`]): vertex/edge text format for the original cDBG and
//!   for the catlas hierarchy of each radius
//! - **Sketch files** (`.mxt`): `<node_id>,<space-joined hashes>` per line
//! - **Assignment files** (`.vxt`): `<original_node_id>,<space-joined dominating ids>`
//! - **Query sketches**: whitespace-joined hash values
//!
//! Any input path ending in `.gz` is transparently decompressed.
//!
//! ## Example
//!
//! ```rust,no_run
//! use catlas_search::parsing::records::{parse_query_sketch_file, parse_sketch_file};
//! use std::path::Path;
//!
//! let query = parse_query_sketch_file(Path::new("query.sig.dump")).unwrap();
//! let table = parse_sketch_file(Path::new("sample/sample.catlas.1.mxt")).unwrap();
//! println!("{} query hashes, {} catlas sketches", query.len(), table.len());
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use thiserror::Error;

pub mod gxt;
pub mod records;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number on line {line}: '{value}'")]
    InvalidNumber { line: usize, value: String },

    #[error("Duplicate record for node {0}")]
    DuplicateRecord(u64),
}

/// Open a text file for buffered line reading, decompressing `.gz` files
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead>, ParseError> {
    let file = File::open(path)?;
    let is_gzip = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

    if is_gzip {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Parse an unsigned integer field, reporting the 1-based line number on failure
pub(crate) fn parse_u64(value: &str, line: usize) -> Result<u64, ParseError> {
    value.trim().parse().map_err(|_| ParseError::InvalidNumber {
        line,
        value: value.to_string(),
    })
}
