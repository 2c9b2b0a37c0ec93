//! Orchestration of a pruned GED run.
//!
//! [`run_pipeline`] wires the pieces together: enumerate pairs, prune them
//! with the configured heuristics, hand the survivors to a pool of solver
//! workers, and record every outcome through a single [`Orchestrator`].

mod config;
mod error;
mod estimate;
mod orchestrator;
mod pipeline;
mod summary;
mod termination;

pub use crate::config::{
    DEFAULT_PROGRESS_EVERY, DEFAULT_THRESHOLD, EstimateConfig, PruningConfig, RunConfig,
    RunConfigBuilder, SourceKind,
};
pub use crate::error::CliError;
pub use crate::estimate::run_estimate;
pub use crate::orchestrator::Orchestrator;
pub use crate::pipeline::{RunReport, run_pipeline};
pub use crate::summary::RunSummary;
pub use crate::termination::TerminationListener;

/// Exit code after a termination signal.
pub const EXIT_INTERRUPTED: u8 = 130;
