//! Graph File Loader
//!
//! Step 1.1: Reading the adjacency list
//!
//! Format:
//! ```text
//! num_vertices num_edges
//! tail head cost
//! tail head cost
//! ...
//! ```
//! Vertices are 1-indexed, costs may be negative, `#` starts a comment line.

use eyre::{Result, WrapErr};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

use super::{Cost, Edge};
use crate::error::ApspError;

// ============================================
// TYPES
// ============================================

/// Raw graph as read from disk, before any validation against its header
#[derive(Debug, Clone, Default)]
pub struct EdgeList {
    /// Declared number of vertices
    pub vertex_count: usize,

    /// Declared number of edges
    pub edge_count: usize,

    pub edges: Vec<Edge>,
}

impl EdgeList {
    /// Edge list whose declared edge count matches what is supplied.
    pub fn new(vertex_count: usize, edges: Vec<Edge>) -> Self {
        Self {
            vertex_count,
            edge_count: edges.len(),
            edges,
        }
    }
}

// ============================================
// PARSING
// ============================================

/// Parse the textual adjacency-list format.
pub fn parse_edge_list(text: &str) -> Result<EdgeList, ApspError> {
    let line_count = text.lines().count();
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

    let Some((line_no, header)) = lines.next() else {
        return Err(ApspError::malformed("empty graph file, missing header"));
    };
    let [vertex_count, edge_count] = fields::<usize, 2>(header, line_no)?;

    // the header is untrusted; never reserve more than the file can hold
    let mut edges = Vec::with_capacity(edge_count.min(line_count));
    for (line_no, line) in lines {
        let [tail, head] = fields::<u32, 2>(strip_last(line), line_no)?;
        let cost = last_field::<Cost>(line, line_no)?;
        edges.push(Edge::new(tail, head, cost));
    }

    Ok(EdgeList {
        vertex_count,
        edge_count,
        edges,
    })
}

/// Read and parse a graph file.
pub fn load_edge_list<P: AsRef<Path>>(path: P) -> Result<EdgeList> {
    let path = path.as_ref();
    let start = Instant::now();

    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read graph file {}", path.display()))?;
    let list = parse_edge_list(&text)
        .wrap_err_with(|| format!("Failed to parse graph file {}", path.display()))?;

    debug!(
        "Loaded {} ({} vertices, {} edges) in {:?}",
        path.display(),
        list.vertex_count,
        list.edges.len(),
        start.elapsed()
    );
    Ok(list)
}

/// Exactly `N` whitespace-separated values.
fn fields<T: FromStr, const N: usize>(line: &str, line_no: usize) -> Result<[T; N], ApspError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != N {
        return Err(ApspError::malformed(format!(
            "line {}: expected {} fields, found {}",
            line_no,
            N,
            tokens.len()
        )));
    }

    let mut values = Vec::with_capacity(N);
    for token in tokens {
        values.push(parse_token(token, line_no)?);
    }
    values
        .try_into()
        .map_err(|_| ApspError::malformed(format!("line {}: field count changed", line_no)))
}

fn strip_last(line: &str) -> &str {
    match line.trim_end().rfind(char::is_whitespace) {
        Some(pos) => &line[..pos],
        None => "",
    }
}

fn last_field<T: FromStr>(line: &str, line_no: usize) -> Result<T, ApspError> {
    let token = line.split_whitespace().last().unwrap_or_default();
    parse_token(token, line_no)
}

fn parse_token<T: FromStr>(token: &str, line_no: usize) -> Result<T, ApspError> {
    token
        .parse()
        .map_err(|_| ApspError::malformed(format!("line {}: invalid number {:?}", line_no, token)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartographer::Vertex;
    use std::io::Write;

    #[test]
    fn test_parse_with_negative_costs_and_comments() {
        let text = "# tiny graph\n4 3\n1 2 1\n\n2 3 2\n2 4 -3\n";
        let list = parse_edge_list(text).unwrap();

        assert_eq!(list.vertex_count, 4);
        assert_eq!(list.edge_count, 3);
        assert_eq!(list.edges.len(), 3);
        assert_eq!(list.edges[2].tail, Vertex(2));
        assert_eq!(list.edges[2].head, Vertex(4));
        assert_eq!(list.edges[2].cost, -3);
    }

    #[test]
    fn test_parse_keeps_declared_counts_for_later_validation() {
        let list = parse_edge_list("3 5\n1 2 1\n").unwrap();
        assert_eq!(list.edge_count, 5);
        assert_eq!(list.edges.len(), 1);
    }

    #[test]
    fn test_parse_reports_line_numbers() {
        let err = parse_edge_list("3 2\n1 2 1\n2 x 4\n").unwrap_err();
        assert!(matches!(err, ApspError::MalformedInput(_)));
        assert!(err.to_string().contains("line 3"), "{}", err);

        let err = parse_edge_list("3 1\n1 2\n").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);

        let err = parse_edge_list("3 1\n1 2 3 4\n").unwrap_err();
        assert!(err.to_string().contains("expected 2 fields"), "{}", err);
    }

    #[test]
    fn test_parse_survives_absurd_declared_edge_count() {
        let list = parse_edge_list("2 18446744073709551615\n1 2 1\n").unwrap();
        assert_eq!(list.edge_count, usize::MAX);
        assert_eq!(list.edges.len(), 1);
    }

    #[test]
    fn test_parse_rejects_empty_input() {
        assert!(parse_edge_list("").is_err());
        assert!(parse_edge_list("# only a comment\n").is_err());
        assert!(parse_edge_list("4\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "2 1").unwrap();
        writeln!(file, "1 2 -5").unwrap();

        let list = load_edge_list(file.path()).unwrap();
        assert_eq!(list.vertex_count, 2);
        assert_eq!(list.edges[0].cost, -5);
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = load_edge_list("/definitely/not/here.txt").unwrap_err();
        assert!(format!("{:?}", err).contains("/definitely/not/here.txt"));
    }
}
