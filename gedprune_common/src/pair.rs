//! Unordered graph pairs.

use std::fmt;

use contracts::*;
use serde::{Deserialize, Serialize};

use crate::{Graph, GraphId, GraphStats};

/// Unordered pair of graph ids, stored with `graph_id_1 < graph_id_2`.
///
/// Used to index results and heuristic estimates; `PairKey::new(a, b)` and
/// `PairKey::new(b, a)` are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    /// The smaller graph id.
    pub graph_id_1: GraphId,
    /// The larger graph id.
    pub graph_id_2: GraphId,
}

impl PairKey {
    /// Creates a key, ordering the two ids.
    #[must_use]
    #[ensures(ret.graph_id_1 <= ret.graph_id_2)]
    pub fn new(a: GraphId, b: GraphId) -> Self {
        if a <= b {
            Self {
                graph_id_1: a,
                graph_id_2: b,
            }
        } else {
            Self {
                graph_id_1: b,
                graph_id_2: a,
            }
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.graph_id_1, self.graph_id_2)
    }
}

/// A candidate pair of distinct graphs with their derived attributes.
///
/// `first` always describes `key.graph_id_1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphPair {
    key: PairKey,
    first: GraphStats,
    second: GraphStats,
}

impl GraphPair {
    /// Creates a pair from two loaded graphs, in either order.
    #[must_use]
    #[requires(a.id() != b.id())]
    pub fn new(a: &Graph, b: &Graph) -> Self {
        let (lo, hi) = if a.id() < b.id() { (a, b) } else { (b, a) };
        Self {
            key: PairKey::new(lo.id(), hi.id()),
            first: lo.stats(),
            second: hi.stats(),
        }
    }

    /// Returns the pair key.
    #[must_use]
    pub const fn key(&self) -> PairKey {
        self.key
    }

    /// Returns the stats of the graph with the smaller id.
    #[must_use]
    pub const fn first(&self) -> &GraphStats {
        &self.first
    }

    /// Returns the stats of the graph with the larger id.
    #[must_use]
    pub const fn second(&self) -> &GraphStats {
        &self.second
    }
}
