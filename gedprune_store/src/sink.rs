//! Persistence strategies, tried in order until one succeeds.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::{COLUMNS, StoreError, TableRecordRow};

/// One way of writing and reading back a result table.
pub trait TableSink: fmt::Debug + Send + Sync {
    /// Short name for log messages.
    fn name(&self) -> &'static str;

    /// Destination of part 1 for the configured output path.
    fn base_path(&self, configured: &Path) -> PathBuf;

    /// Serializes `rows` into `out`.
    ///
    /// # Errors
    ///
    /// Returns the underlying write error.
    fn write_rows(&self, out: &mut dyn Write, rows: &[TableRecordRow]) -> Result<(), StoreError>;

    /// Reads a file previously written by [`TableSink::write_rows`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupted`] if the file is not a complete table.
    fn read_rows(&self, path: &Path) -> Result<Vec<TableRecordRow>, StoreError>;

    /// Atomically replaces `path` with `rows`.
    ///
    /// # Errors
    ///
    /// Returns any error from writing, syncing or renaming; `path` is left
    /// as it was.
    fn write_atomic(&self, path: &Path, rows: &[TableRecordRow]) -> Result<(), StoreError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            self.write_rows(&mut out, rows)?;
            out.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|source| StoreError::Persist {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}

/// Returns the file holding part `part` (1-based) of a table at `base`.
///
/// Part 1 is `base` itself; part `k` is `<stem>_part<k>.<ext>`.
#[must_use]
pub fn part_path(base: &Path, part: usize) -> PathBuf {
    if part <= 1 {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{stem}_part{part}.{}", ext.to_string_lossy()),
        None => format!("{stem}_part{part}"),
    };
    base.with_file_name(name)
}

/// The default chain: CSV, then JSON Lines.
#[must_use]
pub fn default_sinks() -> Vec<Box<dyn TableSink>> {
    vec![Box::new(CsvSink), Box::new(JsonLinesSink)]
}

/// CSV with a header row; absent values are empty cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSink;

impl TableSink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn base_path(&self, configured: &Path) -> PathBuf {
        configured.to_path_buf()
    }

    fn write_rows(&self, out: &mut dyn Write, rows: &[TableRecordRow]) -> Result<(), StoreError> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
        writer.write_record(COLUMNS)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn read_rows(&self, path: &Path) -> Result<Vec<TableRecordRow>, StoreError> {
        let corrupted = |reason: String| StoreError::Corrupted {
            path: path.to_path_buf(),
            reason,
        };
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers().map_err(|e| corrupted(e.to_string()))?;
        if !headers.iter().eq(COLUMNS) {
            return Err(corrupted(format!("unexpected header {headers:?}")));
        }
        reader
            .deserialize::<TableRecordRow>()
            .enumerate()
            .map(|(idx, row)| row.map_err(|e| corrupted(format!("row {}: {e}", idx + 1))))
            .collect()
    }
}

/// One JSON object per line; used when CSV cannot be written.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesSink;

impl TableSink for JsonLinesSink {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn base_path(&self, configured: &Path) -> PathBuf {
        configured.with_extension("jsonl")
    }

    fn write_rows(&self, out: &mut dyn Write, rows: &[TableRecordRow]) -> Result<(), StoreError> {
        for row in rows {
            serde_json::to_writer(&mut *out, row)?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }

    fn read_rows(&self, path: &Path) -> Result<Vec<TableRecordRow>, StoreError> {
        let reader = BufReader::new(File::open(path)?);
        let mut rows = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| StoreError::Corrupted {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let row = serde_json::from_str(&line).map_err(|e| StoreError::Corrupted {
                path: path.to_path_buf(),
                reason: format!("line {}: {e}", idx + 1),
            })?;
            rows.push(row);
        }
        Ok(rows)
    }
}
