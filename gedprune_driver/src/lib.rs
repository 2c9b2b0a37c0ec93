//! Running the external GED solver.
//!
//! A [`SolverAdapter`] runs one solver process per pair under a wall-clock
//! timeout, the [`parser`] turns its stdout into a [`ComputedGed`], and a
//! [`WorkerPool`] keeps a bounded number of those processes busy, reporting
//! results over a channel in completion order.
//!
//! [`ComputedGed`]: gedprune_common::ComputedGed

mod error;
pub mod parser;
mod pool;
mod solver;

pub use crate::error::DriverError;
pub use crate::parser::{SolverOutput, parse_output};
pub use crate::pool::{CancelToken, PoolEvent, Task, WorkerPool, default_workers};
pub use crate::solver::{SolverAdapter, SolverConfig, SolverRun, resolve_executable};
