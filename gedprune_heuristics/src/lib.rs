//! Cheap GED lower bounds and the pruning policy built on them.
//!
//! The [`Heuristic`] functions are pure and symmetric in their two graphs.
//! Estimates come either from the loaded graphs ([`LiveEstimator`]) or from
//! precomputed tables ([`HeuristicTable`]); a [`PruningPolicy`] turns them
//! into a keep/skip decision per pair.

mod error;
mod estimate;
mod heuristic;
mod policy;
mod report;
mod table;

pub use crate::error::HeuristicError;
pub use crate::estimate::{EstimateSource, HeuristicEstimate, LiveEstimator, estimate_corpus, estimate_pair};
pub use crate::heuristic::*;
pub use crate::policy::{Decision, PruningPolicy};
pub use crate::report::{PruneReport, PruneReportRow, dry_run};
pub use crate::table::{HeuristicTable, TableRow, write_table};
