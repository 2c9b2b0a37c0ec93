//! Heuristic estimates and where they come from.

use std::collections::HashMap;

use gedprune_common::{Graph, GraphId, PairKey};
use rayon::prelude::*;

use crate::Heuristic;

/// One heuristic's lower bound for one pair.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicEstimate {
    /// The pair.
    pub key: PairKey,
    /// Canonical heuristic name.
    pub heuristic: String,
    /// The estimated lower bound.
    pub lower_bound: f64,
}

/// Evaluates `heuristics` on one pair.
///
/// Heuristics that do not apply to the pair (label mismatch on unlabeled
/// graphs) produce no estimate.
#[must_use]
pub fn estimate_pair(a: &Graph, b: &Graph, heuristics: &[Heuristic]) -> Vec<HeuristicEstimate> {
    let key = PairKey::new(a.id(), b.id());
    heuristics
        .iter()
        .filter_map(|h| {
            h.evaluate(a, b).map(|lower_bound| HeuristicEstimate {
                key,
                heuristic: h.name().to_string(),
                lower_bound,
            })
        })
        .collect()
}

/// Evaluates `heuristics` on every listed pair in parallel.
///
/// `pairs` index into `graphs`. The result keeps pair order.
#[must_use]
pub fn estimate_corpus<I>(graphs: &[Graph], pairs: I, heuristics: &[Heuristic]) -> Vec<HeuristicEstimate>
where
    I: IntoIterator<Item = (usize, usize)>,
{
    let pairs: Vec<(usize, usize)> = pairs.into_iter().collect();
    tracing::info!(
        "Estimating {} heuristics over {} pairs",
        heuristics.len(),
        pairs.len()
    );
    pairs
        .par_iter()
        .flat_map_iter(|&(i, j)| estimate_pair(&graphs[i], &graphs[j], heuristics))
        .collect()
}

/// A provider of lower-bound estimates per pair.
pub trait EstimateSource {
    /// Returns the value of `heuristic` for `key`, if known.
    fn lower_bound(&self, key: PairKey, heuristic: &str) -> Option<f64>;

    /// Returns the canonical names of the heuristics this source can answer.
    fn available(&self) -> Vec<String>;

    /// Returns the estimates for every heuristic in `heuristics` that the
    /// source knows for `key`.
    fn estimates(&self, key: PairKey, heuristics: &[String]) -> Vec<HeuristicEstimate> {
        heuristics
            .iter()
            .filter_map(|name| {
                self.lower_bound(key, name).map(|lower_bound| HeuristicEstimate {
                    key,
                    heuristic: name.clone(),
                    lower_bound,
                })
            })
            .collect()
    }
}

/// Computes estimates on demand from loaded graphs.
#[derive(Debug)]
pub struct LiveEstimator<'a> {
    graphs: &'a [Graph],
    index: HashMap<GraphId, usize>,
}

impl<'a> LiveEstimator<'a> {
    /// Wraps a set of loaded graphs.
    #[must_use]
    pub fn new(graphs: &'a [Graph]) -> Self {
        let index = graphs
            .iter()
            .enumerate()
            .map(|(idx, g)| (g.id(), idx))
            .collect();
        Self { graphs, index }
    }

    fn graph(&self, id: GraphId) -> Option<&Graph> {
        self.index.get(&id).map(|&idx| &self.graphs[idx])
    }
}

impl EstimateSource for LiveEstimator<'_> {
    fn lower_bound(&self, key: PairKey, heuristic: &str) -> Option<f64> {
        let heuristic = heuristic.parse::<Heuristic>().ok()?;
        let a = self.graph(key.graph_id_1)?;
        let b = self.graph(key.graph_id_2)?;
        heuristic.evaluate(a, b)
    }

    fn available(&self) -> Vec<String> {
        Heuristic::ALL.iter().map(|h| h.name().to_string()).collect()
    }
}
