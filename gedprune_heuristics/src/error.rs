use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while evaluating heuristics or reading heuristic tables.
#[derive(Debug, Error)]
pub enum HeuristicError {
    #[error("Unknown heuristic: {0}")]
    UnknownHeuristic(String),
    #[error("Heuristic table directory not found: {}", .0.display())]
    MissingTableDir(PathBuf),
    #[error("No heuristic rows for dataset '{dataset}' in {}", dir.display())]
    NoTableRows { dataset: String, dir: PathBuf },
    #[error("Heuristic '{heuristic}' has no bounds for dataset '{dataset}'")]
    HeuristicNotInTable { heuristic: String, dataset: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to persist {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}
