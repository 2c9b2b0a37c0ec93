use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the result store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to persist {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
    #[error("{} is not a valid result table: {reason}", path.display())]
    Corrupted { path: PathBuf, reason: String },
    #[error("Invalid result row for ({graph_id_1}, {graph_id_2}): {reason}")]
    InvalidRow {
        graph_id_1: u64,
        graph_id_2: u64,
        reason: String,
    },
    #[error("Every persistence strategy failed for {}: {errors}", path.display())]
    AllStrategiesFailed { path: PathBuf, errors: String },
}
