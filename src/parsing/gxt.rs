//! GXT vertex/edge graph format.
//!
//! ```text
//! <num_vertices>,<num_edges>
//! id,size[,<vertex attribute names>]
//! <id>,<size>[,<values>]          num_vertices lines
//! src,dest[,<edge attribute names>]
//! <src>,<dest>[,<values>]         num_edges lines
//! ```
//!
//! Attribute values may be empty but must not contain commas or newlines.

use std::io::{BufRead, Write};
use std::path::Path;

use crate::core::types::NodeId;
use crate::parsing::{open_reader, parse_u64, ParseError};

/// A vertex record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GxtVertex {
    pub id: NodeId,
    pub size: u64,
    pub values: Vec<String>,
}

/// An edge record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GxtEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub values: Vec<String>,
}

/// A fully parsed GXT file
#[derive(Debug, Clone, Default)]
pub struct GxtGraph {
    pub vertex_attributes: Vec<String>,
    pub edge_attributes: Vec<String>,
    pub vertices: Vec<GxtVertex>,
    pub edges: Vec<GxtEdge>,
}

impl GxtGraph {
    /// Position of a named vertex attribute within `GxtVertex::values`
    #[must_use]
    pub fn vertex_attribute_index(&self, name: &str) -> Option<usize> {
        self.vertex_attributes.iter().position(|a| a == name)
    }
}

/// Streaming GXT writer. Vertices must all be written before any edge.
pub struct GxtWriter<W: Write> {
    out: W,
    num_vertices: usize,
    num_edges: usize,
    vertex_attribute_count: usize,
    edge_attributes: Vec<String>,
    vertices_written: usize,
    edges_written: usize,
    edge_header_written: bool,
}

impl<W: Write> GxtWriter<W> {
    /// Start a graph, writing the count line and the vertex header
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` on write failure or `ParseError::InvalidFormat`
    /// for attribute names that cannot be represented.
    pub fn new(
        mut out: W,
        num_vertices: usize,
        num_edges: usize,
        vertex_attributes: &[&str],
        edge_attributes: &[&str],
    ) -> Result<Self, ParseError> {
        for name in vertex_attributes.iter().chain(edge_attributes) {
            check_value(name)?;
        }

        writeln!(out, "{num_vertices},{num_edges}")?;
        write_record(&mut out, "id", "size", vertex_attributes)?;

        Ok(Self {
            out,
            num_vertices,
            num_edges,
            vertex_attribute_count: vertex_attributes.len(),
            edge_attributes: edge_attributes.iter().map(ToString::to_string).collect(),
            vertices_written: 0,
            edges_written: 0,
            edge_header_written: false,
        })
    }

    /// Write one vertex record
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidFormat` when called after edges were written,
    /// when more vertices than declared are written, or when `values` does not
    /// match the declared attributes.
    pub fn add_vertex<S: AsRef<str>>(
        &mut self,
        id: NodeId,
        size: u64,
        values: &[S],
    ) -> Result<(), ParseError> {
        if self.edge_header_written {
            return Err(ParseError::InvalidFormat(format!(
                "vertex {id} written after edges"
            )));
        }
        if self.vertices_written == self.num_vertices {
            return Err(ParseError::InvalidFormat(format!(
                "more than {} vertices written",
                self.num_vertices
            )));
        }
        if values.len() != self.vertex_attribute_count {
            return Err(ParseError::InvalidFormat(format!(
                "vertex {id} has {} attribute values, expected {}",
                values.len(),
                self.vertex_attribute_count
            )));
        }
        for value in values {
            check_value(value.as_ref())?;
        }

        write_record(&mut self.out, &id.to_string(), &size.to_string(), values)?;
        self.vertices_written += 1;
        Ok(())
    }

    /// Write one edge record
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidFormat` when vertices are still outstanding,
    /// when more edges than declared are written, or when `values` does not
    /// match the declared attributes.
    pub fn add_edge<S: AsRef<str>>(
        &mut self,
        from: NodeId,
        to: NodeId,
        values: &[S],
    ) -> Result<(), ParseError> {
        self.write_edge_header()?;
        if self.edges_written == self.num_edges {
            return Err(ParseError::InvalidFormat(format!(
                "more than {} edges written",
                self.num_edges
            )));
        }
        if values.len() != self.edge_attributes.len() {
            return Err(ParseError::InvalidFormat(format!(
                "edge {from}->{to} has {} attribute values, expected {}",
                values.len(),
                self.edge_attributes.len()
            )));
        }
        for value in values {
            check_value(value.as_ref())?;
        }

        write_record(&mut self.out, &from.to_string(), &to.to_string(), values)?;
        self.edges_written += 1;
        Ok(())
    }

    /// Check declared counts, flush, and return the underlying writer
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidFormat` if fewer records than declared were written.
    pub fn finish(mut self) -> Result<W, ParseError> {
        self.write_edge_header()?;
        if self.edges_written != self.num_edges {
            return Err(ParseError::InvalidFormat(format!(
                "declared {} edges but wrote {}",
                self.num_edges, self.edges_written
            )));
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_edge_header(&mut self) -> Result<(), ParseError> {
        if self.edge_header_written {
            return Ok(());
        }
        if self.vertices_written != self.num_vertices {
            return Err(ParseError::InvalidFormat(format!(
                "declared {} vertices but wrote {}",
                self.num_vertices, self.vertices_written
            )));
        }
        write_record(&mut self.out, "src", "dest", &self.edge_attributes)?;
        self.edge_header_written = true;
        Ok(())
    }
}

fn check_value(value: &str) -> Result<(), ParseError> {
    if value.contains([',', '\n', '\r']) {
        return Err(ParseError::InvalidFormat(format!(
            "attribute value '{value}' contains a separator"
        )));
    }
    Ok(())
}

fn write_record<W: Write, S: AsRef<str>>(
    out: &mut W,
    first: &str,
    second: &str,
    rest: &[S],
) -> std::io::Result<()> {
    write!(out, "{first},{second}")?;
    for value in rest {
        write!(out, ",{}", value.as_ref())?;
    }
    writeln!(out)
}

/// Parse a GXT file from disk
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_gxt_file(path: &Path) -> Result<GxtGraph, ParseError> {
    parse_gxt_reader(open_reader(path)?)
}

/// Parse GXT text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for missing headers, wrong field
/// counts, or record counts that disagree with the count line, and
/// `ParseError::InvalidNumber` for non-numeric ids or sizes.
pub fn parse_gxt_reader<R: BufRead>(reader: R) -> Result<GxtGraph, ParseError> {
    let mut lines = reader.lines().enumerate().map(|(i, line)| (i + 1, line));
    let mut next_line = |what: &str| -> Result<(usize, String), ParseError> {
        match lines.next() {
            Some((n, Ok(line))) => Ok((n, line)),
            Some((_, Err(e))) => Err(ParseError::Io(e)),
            None => Err(ParseError::InvalidFormat(format!(
                "unexpected end of file, expected {what}"
            ))),
        }
    };

    let (n, counts) = next_line("vertex and edge counts")?;
    let (num_vertices, num_edges) = counts.trim().split_once(',').ok_or_else(|| {
        ParseError::InvalidFormat(format!("line {n}: expected '<vertices>,<edges>'"))
    })?;
    let num_vertices = parse_u64(num_vertices, n)?;
    let num_edges = parse_u64(num_edges, n)?;

    let (n, header) = next_line("vertex header")?;
    let vertex_attributes = parse_header(&header, "id", "size", n)?;

    let mut graph = GxtGraph {
        vertex_attributes,
        ..GxtGraph::default()
    };

    for _ in 0..num_vertices {
        let (n, line) = next_line("vertex record")?;
        let (id, size, values) = split_record(&line, graph.vertex_attributes.len(), n)?;
        graph.vertices.push(GxtVertex {
            id: parse_u64(id, n)?,
            size: parse_u64(size, n)?,
            values,
        });
    }

    let (n, header) = next_line("edge header")?;
    graph.edge_attributes = parse_header(&header, "src", "dest", n)?;

    for _ in 0..num_edges {
        let (n, line) = next_line("edge record")?;
        let (from, to, values) = split_record(&line, graph.edge_attributes.len(), n)?;
        graph.edges.push(GxtEdge {
            from: parse_u64(from, n)?,
            to: parse_u64(to, n)?,
            values,
        });
    }

    // Anything after the declared edges other than blank lines is an error
    loop {
        match lines.next() {
            None => break,
            Some((_, Err(e))) => return Err(ParseError::Io(e)),
            Some((_, Ok(line))) if line.trim().is_empty() => {}
            Some((n, Ok(_))) => {
                return Err(ParseError::InvalidFormat(format!(
                    "line {n}: more than {num_edges} edges"
                )))
            }
        }
    }

    Ok(graph)
}

fn parse_header(
    line: &str,
    first: &str,
    second: &str,
    line_num: usize,
) -> Result<Vec<String>, ParseError> {
    let fields: Vec<&str> = line.trim_end().split(',').collect();
    if fields.len() < 2 || fields[0] != first || fields[1] != second {
        return Err(ParseError::InvalidFormat(format!(
            "line {line_num}: expected header starting with '{first},{second}'"
        )));
    }
    Ok(fields[2..].iter().map(ToString::to_string).collect())
}

fn split_record(
    line: &str,
    attribute_count: usize,
    line_num: usize,
) -> Result<(&str, &str, Vec<String>), ParseError> {
    let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split(',').collect();
    if fields.len() != attribute_count + 2 {
        return Err(ParseError::InvalidFormat(format!(
            "line {line_num}: expected {} fields, found {}",
            attribute_count + 2,
            fields.len()
        )));
    }
    let values = fields[2..].iter().map(ToString::to_string).collect();
    Ok((fields[0], fields[1], values))
}
