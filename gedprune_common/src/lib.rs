//! Common types shared across the gedprune workspace.
//!
//! This crate provides the graph model and graph-file parsing, pair keys,
//! the typed result records produced by a run, and the deterministic pair
//! enumerator over a directory of graph files.

mod corpus;
mod error;
mod graph;
mod pair;
mod record;

pub use crate::corpus::*;
pub use crate::error::CommonError;
pub use crate::graph::*;
pub use crate::pair::*;
pub use crate::record::*;
