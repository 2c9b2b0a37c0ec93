use std::path::PathBuf;

use thiserror::Error;

/// Errors that prevent the solver or the worker pool from starting.
///
/// Per-task failures are never errors; they become outcomes.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Failed to find solver '{name}': {source}")]
    SolverNotFound {
        name: String,
        #[source]
        source: which::Error,
    },
    #[error("Solver is not a file: {}", .0.display())]
    SolverNotAFile(PathBuf),
    #[error("Failed to start worker {worker}: {source}")]
    WorkerSpawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
