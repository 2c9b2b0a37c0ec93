//! Typed outcomes of a run.
//!
//! Every enumerated pair ends in at most one [`ResultRecord`]. Absent values
//! are `None`; there is no textual "not available" sentinel.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PairKey;

/// Fields extracted from a successful solver run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedGed {
    /// Lower end of the GED interval reported by the solver.
    pub min_ged: f64,
    /// Upper end of the GED interval; equals `min_ged` for exact results.
    pub max_ged: f64,
    /// Solver runtime in seconds.
    pub runtime_secs: f64,
    /// Number of search candidates, when reported.
    pub candidates: Option<u64>,
    /// Number of matches, when reported.
    pub matches: Option<u64>,
    /// Peak resident memory of the solver process in MiB, when sampled.
    pub memory_mb: Option<f64>,
    /// Solver method name for property-driven output.
    pub method: Option<String>,
}

/// Why a pair was never handed to the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkipReason {
    /// A consulted heuristic's lower bound exceeded the threshold.
    LowerBoundExceeded {
        /// Table name of the heuristic that triggered the skip.
        heuristic: String,
        /// The lower bound it produced.
        lower_bound: f64,
        /// The threshold in force.
        threshold: f64,
    },
}

impl SkipReason {
    /// Returns the stable reason tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LowerBoundExceeded { .. } => "lower_bound_exceeded",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowerBoundExceeded {
                heuristic,
                lower_bound,
                threshold,
            } => write!(f, "{}: {heuristic}={lower_bound} > {threshold}", self.as_str()),
        }
    }
}

/// Terminal outcome of one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Computed(ComputedGed),
    TimedOut { timeout_secs: f64 },
    SolverFailed { reason: String },
    Skipped(SkipReason),
}

/// Discriminant of [`Outcome`], used for counting and for the status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutcomeKind {
    Computed,
    TimedOut,
    SolverFailed,
    Skipped,
}

impl OutcomeKind {
    /// All kinds, in reporting order.
    pub const ALL: [Self; 4] = [
        Self::Computed,
        Self::TimedOut,
        Self::SolverFailed,
        Self::Skipped,
    ];

    /// Returns the status tag written to result tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Computed => "computed",
            Self::TimedOut => "timed_out",
            Self::SolverFailed => "solver_failed",
            Self::Skipped => "skipped",
        }
    }

    /// Parses a status tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Outcome {
    /// Returns the outcome's discriminant.
    #[must_use]
    pub const fn kind(&self) -> OutcomeKind {
        match self {
            Self::Computed(_) => OutcomeKind::Computed,
            Self::TimedOut { .. } => OutcomeKind::TimedOut,
            Self::SolverFailed { .. } => OutcomeKind::SolverFailed,
            Self::Skipped(_) => OutcomeKind::Skipped,
        }
    }
}

/// The recorded outcome for one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// The pair this record belongs to.
    pub key: PairKey,
    /// What happened to it.
    pub outcome: Outcome,
}

impl ResultRecord {
    /// Creates a record.
    #[must_use]
    pub const fn new(key: PairKey, outcome: Outcome) -> Self {
        Self { key, outcome }
    }

    /// Shorthand for a lower-bound skip.
    #[must_use]
    pub fn skipped(key: PairKey, heuristic: &str, lower_bound: f64, threshold: f64) -> Self {
        Self::new(
            key,
            Outcome::Skipped(SkipReason::LowerBoundExceeded {
                heuristic: heuristic.to_string(),
                lower_bound,
                threshold,
            }),
        )
    }
}
