//! Precomputed heuristic tables.
//!
//! A table is a CSV file with the header
//! `dataset,graph_id_1,graph_id_2,heuristic_name,lower_bound`. A directory may
//! hold several tables; those whose file name starts with the dataset name
//! are read.

use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::path::Path;

use gedprune_common::{GraphId, PairKey};
use serde::{Deserialize, Deserializer, Serialize};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::{EstimateSource, Heuristic, HeuristicError, HeuristicEstimate};

/// One row of a heuristic table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub dataset: String,
    #[serde(deserialize_with = "lenient_id")]
    pub graph_id_1: u64,
    #[serde(deserialize_with = "lenient_id")]
    pub graph_id_2: u64,
    pub heuristic_name: String,
    pub lower_bound: f64,
}

/// Accepts `12` as well as `12.0`, which spreadsheet exports produce.
fn lenient_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<u64>() {
        return Ok(id);
    }
    match raw.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => Ok(v as u64),
        _ => Err(serde::de::Error::custom(format!("invalid graph id '{raw}'"))),
    }
}

/// Lower bounds indexed by heuristic name and pair.
#[derive(Debug, Clone, Default)]
pub struct HeuristicTable {
    dataset: String,
    bounds: HashMap<String, HashMap<PairKey, f64>>,
}

impl HeuristicTable {
    /// Loads every table for `dataset` found directly under `dir`.
    ///
    /// Rows for other datasets are ignored. Rows that fail to parse are
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`HeuristicError::MissingTableDir`] if `dir` does not exist,
    /// [`HeuristicError::NoTableRows`] if no usable row was found, or the
    /// underlying I/O or CSV error when a file cannot be opened.
    pub fn load_dir(dir: &Path, dataset: &str) -> Result<Self, HeuristicError> {
        if !dir.is_dir() {
            return Err(HeuristicError::MissingTableDir(dir.to_path_buf()));
        }

        let mut table = Self {
            dataset: dataset.to_string(),
            bounds: HashMap::new(),
        };

        let mut paths: Vec<_> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.into_path()),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {}: {e}", dir.display());
                    None
                }
            })
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some("csv")
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(dataset))
            })
            .collect();
        paths.sort();

        for path in &paths {
            let before = table.len();
            let mut reader = csv::Reader::from_path(path)?;
            for (line, row) in reader.deserialize::<TableRow>().enumerate() {
                match row {
                    Ok(row) if row.dataset == dataset => table.insert(
                        &row.heuristic_name,
                        PairKey::new(GraphId(row.graph_id_1), GraphId(row.graph_id_2)),
                        row.lower_bound,
                    ),
                    Ok(_) => {}
                    Err(e) => tracing::warn!(
                        "Skipping row {} of {}: {e}",
                        line + 2,
                        path.display()
                    ),
                }
            }
            tracing::debug!("Read {} bounds from {}", table.len() - before, path.display());
        }

        if table.is_empty() {
            return Err(HeuristicError::NoTableRows {
                dataset: dataset.to_string(),
                dir: dir.to_path_buf(),
            });
        }

        tracing::info!(
            "Loaded {} bounds for dataset '{}' from {} table(s), heuristics: {:?}",
            table.len(),
            dataset,
            paths.len(),
            table.heuristics()
        );
        Ok(table)
    }

    /// Builds a table from computed estimates.
    #[must_use]
    pub fn from_estimates(dataset: &str, estimates: &[HeuristicEstimate]) -> Self {
        let mut table = Self {
            dataset: dataset.to_string(),
            bounds: HashMap::new(),
        };
        for e in estimates {
            table.insert(&e.heuristic, e.key, e.lower_bound);
        }
        table
    }

    fn insert(&mut self, heuristic: &str, key: PairKey, lower_bound: f64) {
        self.bounds
            .entry(Heuristic::canonical_name(heuristic))
            .or_default()
            .insert(key, lower_bound);
    }

    /// Returns the dataset this table was loaded for.
    #[must_use]
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Looks up a bound; the pair may be given in either order.
    #[must_use]
    pub fn get(&self, heuristic: &str, key: PairKey) -> Option<f64> {
        self.bounds
            .get(&Heuristic::canonical_name(heuristic))?
            .get(&key)
            .copied()
    }

    /// Returns true if the table holds any bound for `heuristic`.
    #[must_use]
    pub fn covers(&self, heuristic: &str) -> bool {
        self.bounds
            .get(&Heuristic::canonical_name(heuristic))
            .is_some_and(|m| !m.is_empty())
    }

    /// Fails unless every name in `heuristics` has at least one bound.
    ///
    /// # Errors
    ///
    /// Returns [`HeuristicError::HeuristicNotInTable`] for the first missing
    /// heuristic.
    pub fn require(&self, heuristics: &[String]) -> Result<(), HeuristicError> {
        match heuristics.iter().find(|h| !self.covers(h)) {
            Some(missing) => Err(HeuristicError::HeuristicNotInTable {
                heuristic: missing.clone(),
                dataset: self.dataset.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Returns the heuristic names present, sorted.
    #[must_use]
    pub fn heuristics(&self) -> Vec<String> {
        self.bounds
            .keys()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Returns the number of stored bounds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bounds.values().map(HashMap::len).sum()
    }

    /// Returns true if no bound is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EstimateSource for HeuristicTable {
    fn lower_bound(&self, key: PairKey, heuristic: &str) -> Option<f64> {
        self.get(heuristic, key)
    }

    fn available(&self) -> Vec<String> {
        self.heuristics()
    }
}

/// Writes `estimates` as a heuristic table at `path`.
///
/// The table is written to a temporary file next to `path` and renamed over
/// it, so readers never see a partial table.
///
/// # Errors
///
/// Returns any I/O, CSV or rename error.
pub fn write_table(
    path: &Path,
    dataset: &str,
    estimates: &[HeuristicEstimate],
) -> Result<(), HeuristicError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
        for e in estimates {
            writer.serialize(TableRow {
                dataset: dataset.to_string(),
                graph_id_1: e.key.graph_id_1.raw(),
                graph_id_2: e.key.graph_id_2.raw(),
                heuristic_name: e.heuristic.clone(),
                lower_bound: e.lower_bound,
            })?;
        }
        writer.flush()?;
    }
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|source| HeuristicError::Persist {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Wrote {} estimates to {}", estimates.len(), path.display());
    Ok(())
}
