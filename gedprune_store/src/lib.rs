//! Durable, rotated storage for result records.
//!
//! The [`ResultStore`] keeps every record in memory and rewrites the whole
//! table on each flush: each part file is written to a temporary file in the
//! destination directory, synced, and renamed over the old one. A reader (or
//! a restarted run) therefore only ever sees complete flushes.

mod error;
mod row;
mod sink;
mod store;

pub use crate::error::StoreError;
pub use crate::row::{COLUMNS, TableRecordRow};
pub use crate::sink::{CsvSink, JsonLinesSink, TableSink, default_sinks, part_path};
pub use crate::store::{DEFAULT_ROW_CEILING, ResultStore, StoreConfig, read_table};
