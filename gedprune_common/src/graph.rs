//! Graph model and the per-graph text format.
//!
//! A graph file holds one graph as a sequence of records:
//!
//! ```text
//! t # <graph label>
//! v <local vertex id> <vertex label>
//! e <vertex id 1> <vertex id 2> [<edge label>]
//! ```
//!
//! Vertex ids must run contiguously from zero. Edges are undirected; self
//! loops and repeated edges are dropped while loading.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::CommonError;

/// Numeric identifier of a graph, extracted from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphId(pub u64);

impl GraphId {
    /// Returns the raw numeric id.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for GraphId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// An undirected graph with optional node labels.
///
/// Immutable once constructed. Edges are stored normalized as `(low, high)`
/// node indices, sorted and without duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    id: GraphId,
    node_count: usize,
    edges: Vec<(u32, u32)>,
    labels: Option<Vec<String>>,
}

/// Size and density summary of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Number of nodes.
    pub node_count: usize,
    /// Number of undirected edges.
    pub edge_count: usize,
    /// `2m / (n (n - 1))`, zero for graphs with fewer than two nodes.
    pub density: f64,
}

impl Graph {
    /// Builds a graph from an explicit node count and edge list.
    ///
    /// # Errors
    ///
    /// Returns [`CommonError::Parse`] if an edge references a node outside
    /// `0..node_count` or if the label count does not match the node count.
    pub fn new(
        id: GraphId,
        node_count: usize,
        edges: impl IntoIterator<Item = (u32, u32)>,
        labels: Option<Vec<String>>,
    ) -> Result<Self, CommonError> {
        let origin = format!("graph {id}");
        if let Some(labels) = &labels {
            if labels.len() != node_count {
                return Err(CommonError::Parse {
                    origin,
                    line: 0,
                    message: format!(
                        "{} labels given for {} nodes",
                        labels.len(),
                        node_count
                    ),
                });
            }
        }

        let mut normalized = Vec::new();
        for (u, v) in edges {
            if u as usize >= node_count || v as usize >= node_count {
                return Err(CommonError::Parse {
                    origin,
                    line: 0,
                    message: format!("edge ({u}, {v}) outside of {node_count} nodes"),
                });
            }
            if u == v {
                tracing::debug!("graph {}: dropping self loop on node {}", id, u);
                continue;
            }
            normalized.push((u.min(v), u.max(v)));
        }
        normalized.sort_unstable();
        normalized.dedup();

        Ok(Self {
            id,
            node_count,
            edges: normalized,
            labels,
        })
    }

    /// Builds an unlabeled graph whose node count is implied by the largest
    /// endpoint.
    #[must_use]
    pub fn from_edges(id: GraphId, edges: &[(u32, u32)]) -> Self {
        let node_count = edges
            .iter()
            .map(|&(u, v)| u.max(v) as usize + 1)
            .max()
            .unwrap_or(0);
        Self::new(id, node_count, edges.iter().copied(), None)
            .unwrap_or_else(|_| unreachable!("node count covers every endpoint"))
    }

    /// Parses a graph from the text format described in the module docs.
    ///
    /// `origin` names the source in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`CommonError::Parse`] on malformed records, non-contiguous
    /// vertex ids or edges referencing undeclared vertices.
    pub fn parse(id: GraphId, text: &str, origin: &str) -> Result<Self, CommonError> {
        let parse_err = |line: usize, message: String| CommonError::Parse {
            origin: origin.to_string(),
            line,
            message,
        };

        let mut vertices: BTreeMap<usize, Option<String>> = BTreeMap::new();
        let mut edges: Vec<(usize, usize, usize)> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('%') {
                continue;
            }
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("t") => {}
                Some("v") => {
                    let vid = parse_index(tokens.next(), line_no, "vertex id", &parse_err)?;
                    let label = tokens.next().map(str::to_string);
                    if vertices.insert(vid, label).is_some() {
                        return Err(parse_err(line_no, format!("vertex {vid} declared twice")));
                    }
                }
                Some("e") => {
                    let u = parse_index(tokens.next(), line_no, "edge endpoint", &parse_err)?;
                    let v = parse_index(tokens.next(), line_no, "edge endpoint", &parse_err)?;
                    edges.push((line_no, u, v));
                }
                Some(other) => {
                    return Err(parse_err(line_no, format!("unknown record type '{other}'")));
                }
                None => {}
            }
        }

        let node_count = if vertices.is_empty() {
            edges
                .iter()
                .map(|&(_, u, v)| u.max(v) + 1)
                .max()
                .unwrap_or(0)
        } else {
            if let Some((expected, (&found, _))) = vertices
                .iter()
                .enumerate()
                .find(|(expected, (vid, _))| *expected != **vid)
            {
                return Err(parse_err(
                    0,
                    format!("vertex ids must be contiguous from 0: expected {expected}, found {found}"),
                ));
            }
            vertices.len()
        };

        for &(line_no, u, v) in &edges {
            if u >= node_count || v >= node_count {
                return Err(parse_err(
                    line_no,
                    format!("edge ({u}, {v}) references an undeclared vertex"),
                ));
            }
        }

        let labels = if !vertices.is_empty() && vertices.values().all(Option::is_some) {
            Some(vertices.into_values().flatten().collect())
        } else {
            None
        };

        let mut endpoints = Vec::with_capacity(edges.len());
        for (line_no, u, v) in edges {
            match (u32::try_from(u), u32::try_from(v)) {
                (Ok(u), Ok(v)) => endpoints.push((u, v)),
                _ => return Err(parse_err(line_no, format!("edge ({u}, {v}) is out of range"))),
            }
        }
        Self::new(id, node_count, endpoints, labels)
    }

    /// Reads and parses a graph file.
    ///
    /// # Errors
    ///
    /// Returns [`CommonError::Io`] if the file cannot be read, or a parse
    /// error as for [`Graph::parse`].
    pub fn load(id: GraphId, path: &Path) -> Result<Self, CommonError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(id, &text, &path.display().to_string())
    }

    /// Returns the graph id.
    #[must_use]
    pub const fn id(&self) -> GraphId {
        self.id
    }

    /// Returns the number of nodes.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.node_count
    }

    /// Returns the number of undirected edges.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the normalized edge list.
    #[must_use]
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Returns the node labels, if the graph is labeled.
    #[must_use]
    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// Returns the degree of every node, indexed by node.
    #[must_use]
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.node_count];
        for &(u, v) in &self.edges {
            degrees[u as usize] += 1;
            degrees[v as usize] += 1;
        }
        degrees
    }

    /// Returns how many nodes have each observed degree.
    #[must_use]
    pub fn degree_histogram(&self) -> BTreeMap<usize, usize> {
        let mut histogram = BTreeMap::new();
        for degree in self.degrees() {
            *histogram.entry(degree).or_insert(0) += 1;
        }
        histogram
    }

    /// Returns the edges as a set of unordered node pairs.
    #[must_use]
    pub fn edge_set(&self) -> HashSet<(u32, u32)> {
        self.edges.iter().copied().collect()
    }

    /// Returns how often each label occurs, if the graph is labeled.
    #[must_use]
    pub fn label_frequencies(&self) -> Option<BTreeMap<&str, usize>> {
        self.labels.as_ref().map(|labels| {
            let mut freq = BTreeMap::new();
            for label in labels {
                *freq.entry(label.as_str()).or_insert(0) += 1;
            }
            freq
        })
    }

    /// Returns `2m / (n (n - 1))`, or zero for fewer than two nodes.
    #[must_use]
    pub fn density(&self) -> f64 {
        if self.node_count < 2 {
            return 0.0;
        }
        let n = self.node_count as f64;
        (2.0 * self.edges.len() as f64) / (n * (n - 1.0))
    }

    /// Returns the size and density summary.
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.node_count,
            edge_count: self.edges.len(),
            density: self.density(),
        }
    }
}

fn parse_index<F>(token: Option<&str>, line: usize, what: &str, err: &F) -> Result<usize, CommonError>
where
    F: Fn(usize, String) -> CommonError,
{
    let token = token.ok_or_else(|| err(line, format!("missing {what}")))?;
    let index = token
        .parse::<u64>()
        .map_err(|_| err(line, format!("invalid {what} '{token}'")))?;
    u32::try_from(index)
        .map(|index| index as usize)
        .map_err(|_| err(line, format!("{what} {index} exceeds {}", u32::MAX)))
}
