use std::path::PathBuf;

use thiserror::Error;

use crate::GraphId;

/// Errors raised while loading graphs or enumerating a corpus.
#[derive(Debug, Error)]
pub enum CommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Graph directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("{origin}:{line}: {message}")]
    Parse {
        origin: String,
        line: usize,
        message: String,
    },
    #[error("Duplicate graph id {id}: {} and {}", first.display(), second.display())]
    DuplicateGraphId {
        id: GraphId,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("Failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}
