//! Keep/skip decisions from lower bounds.

use contracts::*;
use gedprune_common::{PairKey, SkipReason};

use crate::{EstimateSource, Heuristic, HeuristicEstimate};

/// Outcome of the pruning policy for one pair.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Hand the pair to the solver.
    Keep,
    /// Record the pair as skipped.
    Skip(SkipReason),
}

impl Decision {
    /// Returns true for [`Decision::Skip`].
    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::Skip(_))
    }
}

/// Skips a pair iff any consulted lower bound is strictly greater than the
/// threshold.
///
/// Heuristics are consulted in list order and the first one over the
/// threshold is named in the skip reason. A heuristic with no estimate for
/// the pair does not contribute, so a pair with no estimates is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct PruningPolicy {
    threshold: f64,
    heuristics: Vec<String>,
}

impl PruningPolicy {
    /// Creates a policy consulting `heuristics` (canonicalized).
    ///
    /// An empty list falls back to `combined_basic`.
    #[requires(!threshold.is_nan())]
    pub fn new<I, S>(threshold: f64, heuristics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = Vec::new();
        for h in heuristics {
            let name = Heuristic::canonical_name(h.as_ref());
            if !names.contains(&name) {
                names.push(name);
            }
        }
        if names.is_empty() {
            names.push(Heuristic::DEFAULT.name().to_string());
        }
        for h in names.iter().filter_map(|n| n.parse::<Heuristic>().ok()) {
            if !h.is_admissible() {
                tracing::warn!(
                    "Heuristic '{}' is not a lower bound on the GED; pruning with it may skip pairs that are within the threshold",
                    h
                );
            }
        }
        Self {
            threshold,
            heuristics: names,
        }
    }

    /// A policy consulting only `combined_basic`.
    #[must_use]
    pub fn with_default_heuristic(threshold: f64) -> Self {
        Self::new(threshold, [Heuristic::DEFAULT.name()])
    }

    /// Returns the threshold.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns the consulted heuristic names, in order.
    #[must_use]
    pub fn heuristics(&self) -> &[String] {
        &self.heuristics
    }

    /// Decides from estimates already computed for one pair.
    #[must_use]
    pub fn decide(&self, estimates: &[HeuristicEstimate]) -> Decision {
        for name in &self.heuristics {
            let exceeded = estimates
                .iter()
                .find(|e| &e.heuristic == name && e.lower_bound > self.threshold);
            if let Some(e) = exceeded {
                return Decision::Skip(SkipReason::LowerBoundExceeded {
                    heuristic: name.clone(),
                    lower_bound: e.lower_bound,
                    threshold: self.threshold,
                });
            }
        }
        Decision::Keep
    }

    /// Fetches the consulted estimates for `key` from `source` and decides.
    pub fn evaluate(&self, source: &dyn EstimateSource, key: PairKey) -> Decision {
        self.decide(&source.estimates(key, &self.heuristics))
    }
}
