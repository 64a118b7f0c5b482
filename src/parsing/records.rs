use std::collections::BTreeMap;
use std::io::{BufRead, Read};
use std::path::Path;

use crate::core::sketch::Sketch;
use crate::core::types::NodeId;
use crate::parsing::{open_reader, parse_u64, ParseError};

/// Sketches keyed by node id, iterated in ascending id order
pub type SketchTable = BTreeMap<NodeId, Sketch>;

/// One line of an assignment file: an original node and the dominating
/// nodes that cover it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub original: NodeId,
    pub dominators: Vec<NodeId>,
}

/// Parse a sketch file (`<node_id>,<space-joined hashes>` per line)
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_sketch_file(path: &Path) -> Result<SketchTable, ParseError> {
    parse_sketch_reader(open_reader(path)?)
}

/// Parse sketch records. A node may appear only once; the hash list may be empty.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for lines without a comma,
/// `ParseError::InvalidNumber` for non-numeric fields, or
/// `ParseError::DuplicateRecord` if a node has two records.
pub fn parse_sketch_reader<R: BufRead>(reader: R) -> Result<SketchTable, ParseError> {
    let mut table = SketchTable::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_num = i + 1;
        if line.trim().is_empty() {
            continue;
        }

        let (node, hashes) = split_keyed_line(&line, line_num)?;
        let node = parse_u64(node, line_num)?;
        let hashes = parse_u64_list(hashes, line_num)?;

        if table.insert(node, Sketch::from_hashes(hashes)).is_some() {
            return Err(ParseError::DuplicateRecord(node));
        }
    }

    Ok(table)
}

/// Parse an assignment file (`<original_node_id>,<space-joined dominating ids>`)
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_assignment_file(path: &Path) -> Result<Vec<Assignment>, ParseError> {
    parse_assignment_reader(open_reader(path)?)
}

/// Parse assignment records. Every original node must list at least one
/// dominating node.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for lines without a comma or with an
/// empty dominator list, and `ParseError::InvalidNumber` for non-numeric fields.
pub fn parse_assignment_reader<R: BufRead>(reader: R) -> Result<Vec<Assignment>, ParseError> {
    let mut assignments = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_num = i + 1;
        if line.trim().is_empty() {
            continue;
        }

        let (original, dominators) = split_keyed_line(&line, line_num)?;
        let original = parse_u64(original, line_num)?;
        let dominators = parse_u64_list(dominators, line_num)?;
        if dominators.is_empty() {
            return Err(ParseError::InvalidFormat(format!(
                "line {line_num}: original node {original} has no dominating node"
            )));
        }

        assignments.push(Assignment {
            original,
            dominators,
        });
    }

    Ok(assignments)
}

/// Parse a query sketch file of whitespace-joined hash values
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidNumber` for a non-numeric hash.
pub fn parse_query_sketch_file(path: &Path) -> Result<Sketch, ParseError> {
    let mut text = String::new();
    open_reader(path)?.read_to_string(&mut text)?;
    parse_query_sketch_text(&text)
}

/// Parse whitespace-joined hash values. Empty text is an empty sketch.
///
/// # Errors
///
/// Returns `ParseError::InvalidNumber` for a non-numeric hash.
pub fn parse_query_sketch_text(text: &str) -> Result<Sketch, ParseError> {
    let mut hashes = Vec::new();
    for (i, line) in text.lines().enumerate() {
        hashes.extend(parse_u64_list(line, i + 1)?);
    }
    Ok(Sketch::from_hashes(hashes))
}

fn split_keyed_line(line: &str, line_num: usize) -> Result<(&str, &str), ParseError> {
    line.trim().split_once(',').ok_or_else(|| {
        ParseError::InvalidFormat(format!("line {line_num}: expected '<id>,<values>'"))
    })
}

fn parse_u64_list(text: &str, line_num: usize) -> Result<Vec<u64>, ParseError> {
    text.split_whitespace()
        .map(|value| parse_u64(value, line_num))
        .collect()
}
