//! Lower-bound heuristics over a pair of graphs.
//!
//! Costs are unit costs: inserting or deleting a node or an edge costs one,
//! and so does substituting a node label.
//!
//! - `node_count_diff`, `edge_count_diff` and `combined_basic` count edits
//!   that no node correspondence can avoid.
//! - `degree_dist_diff` divides the L1 distance of the degree histograms by
//!   four: one edge edit moves two nodes between degree buckets.
//! - `label_mismatch` divides the L1 distance of the label histograms by two:
//!   one substitution moves one node between label buckets.
//! - `edge_overlap_diff` compares edges under the identity correspondence.
//!   It depends on node numbering and can exceed the true distance, so it is
//!   not admissible.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use gedprune_common::Graph;

use crate::HeuristicError;

/// A cheap estimate of the graph edit distance between two graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Heuristic {
    /// `|n1 - n2|`.
    NodeCountDiff,
    /// `|m1 - m2|`.
    EdgeCountDiff,
    /// `(1/4) * sum_d |count1(d) - count2(d)|`.
    DegreeDistDiff,
    /// `m1 + m2 - 2 |E1 ∩ E2|` over literal node indices.
    EdgeOverlapDiff,
    /// `NodeCountDiff + EdgeCountDiff`.
    CombinedBasic,
    /// `(1/2) * sum_l |freq1(l) - freq2(l)|`, labeled graphs only.
    LabelMismatch,
}

impl Heuristic {
    /// Every heuristic, in table order.
    pub const ALL: [Self; 6] = [
        Self::NodeCountDiff,
        Self::EdgeCountDiff,
        Self::DegreeDistDiff,
        Self::EdgeOverlapDiff,
        Self::CombinedBasic,
        Self::LabelMismatch,
    ];

    /// The default pruning signal.
    pub const DEFAULT: Self = Self::CombinedBasic;

    /// Returns the name used in heuristic tables and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NodeCountDiff => "node_count_diff",
            Self::EdgeCountDiff => "edge_count_diff",
            Self::DegreeDistDiff => "degree_dist_diff",
            Self::EdgeOverlapDiff => "edge_overlap_diff",
            Self::CombinedBasic => "combined_basic",
            Self::LabelMismatch => "label_mismatch",
        }
    }

    /// Returns the long, human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::NodeCountDiff => "Node Count Difference",
            Self::EdgeCountDiff => "Edge Count Difference",
            Self::DegreeDistDiff => "Degree Distribution Difference",
            Self::EdgeOverlapDiff => "Edge Overlap Difference",
            Self::CombinedBasic => "Combined Basic (Node+Edge Count Difference)",
            Self::LabelMismatch => "Node Label Mismatch",
        }
    }

    /// Returns true if the value never exceeds the true GED.
    #[must_use]
    pub const fn is_admissible(self) -> bool {
        !matches!(self, Self::EdgeOverlapDiff)
    }

    /// Evaluates the heuristic.
    ///
    /// Returns `None` only for [`Heuristic::LabelMismatch`] when either graph
    /// is unlabeled.
    #[must_use]
    pub fn evaluate(self, a: &Graph, b: &Graph) -> Option<f64> {
        match self {
            Self::NodeCountDiff => Some(node_count_diff(a, b)),
            Self::EdgeCountDiff => Some(edge_count_diff(a, b)),
            Self::DegreeDistDiff => Some(degree_dist_diff(a, b)),
            Self::EdgeOverlapDiff => Some(edge_overlap_diff(a, b)),
            Self::CombinedBasic => Some(combined_basic(a, b)),
            Self::LabelMismatch => label_mismatch(a, b),
        }
    }

    /// Canonicalizes a heuristic name read from a table or the command line.
    ///
    /// Known heuristics map to their table name; anything else (for example
    /// a solver-side bound such as `BMao`) is kept as given, trimmed.
    #[must_use]
    pub fn canonical_name(name: &str) -> String {
        name.parse::<Self>()
            .map_or_else(|_| name.trim().to_string(), |h| h.name().to_string())
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Heuristic {
    type Err = HeuristicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|h| {
                h.name().eq_ignore_ascii_case(wanted) || h.display_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| HeuristicError::UnknownHeuristic(s.to_string()))
    }
}

/// `|n1 - n2|`.
#[must_use]
pub fn node_count_diff(a: &Graph, b: &Graph) -> f64 {
    a.node_count().abs_diff(b.node_count()) as f64
}

/// `|m1 - m2|`.
#[must_use]
pub fn edge_count_diff(a: &Graph, b: &Graph) -> f64 {
    a.edge_count().abs_diff(b.edge_count()) as f64
}

/// Quarter of the L1 distance between the degree histograms.
#[must_use]
pub fn degree_dist_diff(a: &Graph, b: &Graph) -> f64 {
    histogram_l1(&a.degree_histogram(), &b.degree_histogram()) as f64 / 4.0
}

/// `m1 + m2 - 2 |E1 ∩ E2|`, edges compared as unordered index pairs.
#[must_use]
pub fn edge_overlap_diff(a: &Graph, b: &Graph) -> f64 {
    let (small, large) = if a.edge_count() <= b.edge_count() {
        (a, b)
    } else {
        (b, a)
    };
    let large_edges = large.edge_set();
    let shared = small
        .edges()
        .iter()
        .filter(|e| large_edges.contains(e))
        .count();
    (a.edge_count() + b.edge_count() - 2 * shared) as f64
}

/// `node_count_diff + edge_count_diff`.
#[must_use]
pub fn combined_basic(a: &Graph, b: &Graph) -> f64 {
    node_count_diff(a, b) + edge_count_diff(a, b)
}

/// Half the L1 distance between the label histograms, if both graphs are
/// labeled.
#[must_use]
pub fn label_mismatch(a: &Graph, b: &Graph) -> Option<f64> {
    let fa = a.label_frequencies()?;
    let fb = b.label_frequencies()?;
    Some(histogram_l1(&fa, &fb) as f64 / 2.0)
}

fn histogram_l1<K: Ord>(a: &BTreeMap<K, usize>, b: &BTreeMap<K, usize>) -> usize {
    let mut diff: usize = a
        .iter()
        .map(|(k, &ca)| ca.abs_diff(b.get(k).copied().unwrap_or(0)))
        .sum();
    diff += b
        .iter()
        .filter(|(k, _)| !a.contains_key(*k))
        .map(|(_, &cb)| cb)
        .sum::<usize>();
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use gedprune_common::GraphId;

    #[test]
    fn names_parse_back() {
        for h in Heuristic::ALL {
            assert_eq!(h.name().parse::<Heuristic>().unwrap(), h);
            assert_eq!(h.display_name().parse::<Heuristic>().unwrap(), h);
        }
        assert_eq!("COMBINED_BASIC".parse::<Heuristic>().unwrap(), Heuristic::CombinedBasic);
        assert!("BMao".parse::<Heuristic>().is_err());
        assert_eq!(Heuristic::canonical_name(" BMao "), "BMao");
        assert_eq!(
            Heuristic::canonical_name("Combined Basic (Node+Edge Count Difference)"),
            "combined_basic"
        );
    }

    #[test]
    fn path_versus_triangle() {
        let path = Graph::from_edges(GraphId(1), &[(0, 1), (1, 2)]);
        let triangle = Graph::from_edges(GraphId(2), &[(0, 1), (1, 2), (0, 2)]);
        assert_eq!(node_count_diff(&path, &triangle), 0.0);
        assert_eq!(edge_count_diff(&path, &triangle), 1.0);
        assert_eq!(degree_dist_diff(&path, &triangle), 1.0);
        assert_eq!(edge_overlap_diff(&path, &triangle), 1.0);
        assert_eq!(combined_basic(&path, &triangle), 1.0);
    }

    #[test]
    fn edge_overlap_depends_on_numbering() {
        let a = Graph::new(GraphId(1), 3, [(0, 1)], None).unwrap();
        let b = Graph::new(GraphId(2), 3, [(1, 2)], None).unwrap();
        assert_eq!(edge_overlap_diff(&a, &b), 2.0);
        assert!(!Heuristic::EdgeOverlapDiff.is_admissible());
    }

    #[test]
    fn label_mismatch_needs_both_labels() {
        let labeled = Graph::new(GraphId(1), 2, [(0, 1)], Some(vec!["C".into(), "N".into()])).unwrap();
        let relabeled = Graph::new(GraphId(2), 2, [(0, 1)], Some(vec!["C".into(), "O".into()])).unwrap();
        let plain = Graph::from_edges(GraphId(3), &[(0, 1)]);
        assert_eq!(label_mismatch(&labeled, &relabeled), Some(1.0));
        assert_eq!(label_mismatch(&labeled, &plain), None);
    }
}
