use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use contracts::*;
use gedprune_common::{OutcomeKind, PairKey, ResultRecord};

use crate::{StoreError, TableRecordRow, TableSink, default_sinks, part_path};

/// Largest number of data rows in one part file.
pub const DEFAULT_ROW_CEILING: usize = 1_048_573;

/// Where and how often the store writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Output path; part 1 of the CSV table.
    pub path: PathBuf,
    pub row_ceiling: usize,
    /// Flush after this many newly recorded results.
    pub flush_every: usize,
    /// Load existing parts instead of starting empty.
    pub resume: bool,
}

impl StoreConfig {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            row_ceiling: DEFAULT_ROW_CEILING,
            flush_every: 1,
            resume: false,
        }
    }

    #[must_use]
    pub fn with_row_ceiling(mut self, row_ceiling: usize) -> Self {
        self.row_ceiling = row_ceiling;
        self
    }

    #[must_use]
    pub fn with_flush_every(mut self, flush_every: usize) -> Self {
        self.flush_every = flush_every;
        self
    }

    #[must_use]
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }
}

/// The in-memory result table and its persisted copy.
///
/// Only one thread owns a store; every write goes through `&mut self`.
#[derive(Debug)]
pub struct ResultStore {
    config: StoreConfig,
    sinks: Vec<Box<dyn TableSink>>,
    records: Vec<ResultRecord>,
    keys: HashSet<PairKey>,
    unflushed: usize,
    flushes: usize,
    last_parts: usize,
}

impl ResultStore {
    /// Opens the store with the default CSV then JSON Lines chain.
    ///
    /// # Errors
    ///
    /// See [`ResultStore::open_with`].
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        Self::open_with(config, default_sinks())
    }

    /// Opens the store with an explicit strategy chain.
    ///
    /// Existing tables are checked: a corrupted one is deleted. With
    /// `resume`, the first readable table in chain order is loaded.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the output directory cannot be created or a
    /// corrupted file cannot be removed.
    #[requires(config.row_ceiling > 0)]
    #[requires(!sinks.is_empty())]
    pub fn open_with(config: StoreConfig, sinks: Vec<Box<dyn TableSink>>) -> Result<Self, StoreError> {
        if let Some(dir) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let mut loaded: Option<Vec<ResultRecord>> = None;
        for sink in &sinks {
            let base = sink.base_path(&config.path);
            let parts = existing_parts(&base);
            if parts.is_empty() {
                continue;
            }
            match read_records(sink.as_ref(), &parts) {
                Ok(records) if config.resume && loaded.is_none() => {
                    tracing::info!(
                        "Resuming from {} ({} part(s), {} records)",
                        base.display(),
                        parts.len(),
                        records.len()
                    );
                    loaded = Some(records);
                }
                Ok(records) => tracing::info!(
                    "Existing table {} ({} records) will be replaced on the next flush",
                    base.display(),
                    records.len()
                ),
                Err(e) => {
                    tracing::warn!("Deleting unreadable result table {}: {}", base.display(), e);
                    for part in &parts {
                        std::fs::remove_file(part)?;
                    }
                }
            }
        }

        let mut store = Self {
            config,
            sinks,
            records: Vec::new(),
            keys: HashSet::new(),
            unflushed: 0,
            flushes: 0,
            last_parts: 0,
        };
        for record in loaded.into_iter().flatten() {
            store.insert(record);
        }
        Ok(store)
    }

    /// Records one result.
    ///
    /// Returns `false` (and stores nothing) if the pair already has a record.
    /// Flushes when `flush_every` new records have accumulated.
    ///
    /// # Errors
    ///
    /// Returns the flush error, if a flush was due and failed.
    pub fn record(&mut self, record: ResultRecord) -> Result<bool, StoreError> {
        if self.keys.contains(&record.key) {
            tracing::warn!("Ignoring duplicate result for pair {}", record.key);
            return Ok(false);
        }
        self.insert(record);
        self.unflushed += 1;
        if self.unflushed >= self.config.flush_every.max(1) {
            self.flush()?;
        }
        Ok(true)
    }

    /// Records one result without triggering a cadence flush.
    ///
    /// Used for batches (such as a pruning pass) that are flushed once at
    /// the end. Returns `false` if the pair already has a record.
    pub fn stage(&mut self, record: ResultRecord) -> bool {
        if self.keys.contains(&record.key) {
            return false;
        }
        self.insert(record);
        self.unflushed += 1;
        true
    }

    fn insert(&mut self, record: ResultRecord) {
        if self.keys.insert(record.key) {
            self.records.push(record);
        }
    }

    /// Writes the whole table, rotating into parts of at most
    /// `row_ceiling` rows.
    ///
    /// Strategies are tried in order; the first that writes every part wins
    /// and its stale higher-numbered parts are removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AllStrategiesFailed`] if no strategy succeeded.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        let rows: Vec<TableRecordRow> = self.records.iter().map(TableRecordRow::from).collect();
        let chunks: Vec<&[TableRecordRow]> = if rows.is_empty() {
            vec![&[]]
        } else {
            rows.chunks(self.config.row_ceiling).collect()
        };

        let mut errors = Vec::new();
        for sink in &self.sinks {
            let base = sink.base_path(&self.config.path);
            match write_parts(sink.as_ref(), &base, &chunks) {
                Ok(()) => {
                    remove_stale_parts(&base, chunks.len());
                    if chunks.len() > 1 && self.last_parts != chunks.len() {
                        tracing::info!(
                            "Result table rotated into {} parts of at most {} rows",
                            chunks.len(),
                            self.config.row_ceiling
                        );
                    }
                    tracing::debug!(
                        "Flushed {} records to {} via {}",
                        rows.len(),
                        base.display(),
                        sink.name()
                    );
                    self.unflushed = 0;
                    self.flushes += 1;
                    self.last_parts = chunks.len();
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Writing {} via {} failed: {}", base.display(), sink.name(), e);
                    errors.push(format!("{}: {e}", sink.name()));
                }
            }
        }

        Err(StoreError::AllStrategiesFailed {
            path: self.config.path.clone(),
            errors: errors.join("; "),
        })
    }

    /// Returns true if `key` already has a record.
    #[must_use]
    pub fn contains(&self, key: &PairKey) -> bool {
        self.keys.contains(key)
    }

    /// Returns the records in the order they were recorded.
    #[must_use]
    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the number of records per outcome kind.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<OutcomeKind, usize> {
        let mut counts: BTreeMap<OutcomeKind, usize> =
            OutcomeKind::ALL.into_iter().map(|k| (k, 0)).collect();
        for record in &self.records {
            *counts.entry(record.outcome.kind()).or_default() += 1;
        }
        counts
    }

    /// Returns the number of records not yet written.
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.unflushed
    }

    /// Returns the number of successful flushes.
    #[must_use]
    pub const fn flushes(&self) -> usize {
        self.flushes
    }

    /// Returns the part count of the last successful flush.
    #[must_use]
    pub const fn parts(&self) -> usize {
        self.last_parts
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

/// Reads a persisted table back, concatenating its parts.
///
/// Looks for the CSV table at `path` first, then the JSON Lines fallback.
/// Returns an empty list if neither exists.
///
/// # Errors
///
/// Returns [`StoreError::Corrupted`] or [`StoreError::InvalidRow`] if a
/// table exists but cannot be read.
pub fn read_table(path: &Path) -> Result<Vec<ResultRecord>, StoreError> {
    for sink in default_sinks() {
        let parts = existing_parts(&sink.base_path(path));
        if parts.is_empty() {
            continue;
        }
        return read_records(sink.as_ref(), &parts);
    }
    Ok(Vec::new())
}

fn existing_parts(base: &Path) -> Vec<PathBuf> {
    (1..)
        .map(|k| part_path(base, k))
        .take_while(|p| p.is_file())
        .collect()
}

fn read_records(sink: &dyn TableSink, parts: &[PathBuf]) -> Result<Vec<ResultRecord>, StoreError> {
    let mut records = Vec::new();
    for part in parts {
        for row in sink.read_rows(part)? {
            records.push(ResultRecord::try_from(row)?);
        }
    }
    Ok(records)
}

fn write_parts(sink: &dyn TableSink, base: &Path, chunks: &[&[TableRecordRow]]) -> Result<(), StoreError> {
    for (idx, chunk) in chunks.iter().enumerate() {
        sink.write_atomic(&part_path(base, idx + 1), chunk)?;
    }
    Ok(())
}

fn remove_stale_parts(base: &Path, written: usize) {
    for k in (written + 1).. {
        let stale = part_path(base, k);
        if !stale.is_file() {
            break;
        }
        match std::fs::remove_file(&stale) {
            Ok(()) => tracing::debug!("Removed stale part {}", stale.display()),
            Err(e) => {
                tracing::warn!("Failed to remove stale part {}: {}", stale.display(), e);
                break;
            }
        }
    }
}
