use gedprune_common::CommonError;
use gedprune_driver::DriverError;
use gedprune_heuristics::HeuristicError;
use gedprune_store::StoreError;
use thiserror::Error;

/// Fatal errors of a run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Common(#[from] CommonError),
    #[error(transparent)]
    Heuristic(#[from] HeuristicError),
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
}
