//! Deterministic enumeration of graph pairs over a directory of graph files.
//!
//! Graph files are ordered by the numeric id in their file name, never by the
//! order the filesystem returns them in. Pairs are produced lazily as index
//! pairs `(i, j)` with `i < j` over that ordering.

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use regex::Regex;
use walkdir::WalkDir;

use crate::{CommonError, Graph, GraphId};

lazy_static! {
    static ref GRAPH_FILE_RE: Regex = Regex::new(r"^graph_(\d+)\.txt$").unwrap();
    static ref DIGITS_RE: Regex = Regex::new(r"\d+").unwrap();
}

/// Default cap on the number of enumerated pairs.
pub const DEFAULT_MAX_PAIRS: u64 = 100_000;

/// Default seed for the pair subsample.
pub const DEFAULT_SEED: u64 = 42;

/// Extracts the numeric graph id from a file name.
///
/// `graph_<id>.txt` is the canonical form; otherwise the first run of digits
/// in the file stem is used.
#[must_use]
pub fn extract_graph_id(path: &Path) -> Option<GraphId> {
    let name = path.file_name()?.to_str()?;
    if let Some(caps) = GRAPH_FILE_RE.captures(name) {
        return caps[1].parse().ok().map(GraphId);
    }
    let stem = path.file_stem()?.to_str()?;
    DIGITS_RE
        .find(stem)
        .and_then(|m| m.as_str().parse().ok())
        .map(GraphId)
}

/// A graph file and the id extracted from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphFile {
    /// Numeric id.
    pub id: GraphId,
    /// Location of the file.
    pub path: PathBuf,
}

/// A directory of graph files sorted by numeric id.
#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
    files: Vec<GraphFile>,
}

impl Corpus {
    /// Scans `dir` (non-recursively) for `.txt` graph files.
    ///
    /// # Errors
    ///
    /// Returns [`CommonError::MissingDirectory`] if `dir` is not a directory,
    /// [`CommonError::DuplicateGraphId`] if two files share an id, or a walk
    /// error if the directory cannot be listed.
    pub fn scan(dir: &Path) -> Result<Self, CommonError> {
        if !dir.is_dir() {
            return Err(CommonError::MissingDirectory(dir.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|source| CommonError::Walk {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("txt")
            {
                continue;
            }
            match extract_graph_id(path) {
                Some(id) => files.push(GraphFile {
                    id,
                    path: path.to_path_buf(),
                }),
                None => tracing::warn!("Skipping {}: no numeric id in file name", path.display()),
            }
        }

        files.sort_by_key(|f| f.id);
        if let Some(dup) = files.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(CommonError::DuplicateGraphId {
                id: dup[0].id,
                first: dup[0].path.clone(),
                second: dup[1].path.clone(),
            });
        }

        tracing::info!("Found {} graph files in {}", files.len(), dir.display());
        Ok(Self {
            root: dir.to_path_buf(),
            files,
        })
    }

    /// Returns the scanned directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the graph files in id order.
    #[must_use]
    pub fn files(&self) -> &[GraphFile] {
        &self.files
    }

    /// Returns the number of graph files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if the corpus holds no graphs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Returns the number of unordered pairs, `n (n - 1) / 2`.
    #[must_use]
    pub fn total_pairs(&self) -> u64 {
        let n = self.files.len() as u64;
        n * n.saturating_sub(1) / 2
    }

    /// Returns all `i < j` index pairs in order.
    #[must_use]
    pub fn pairs(&self) -> PairIndices {
        PairIndices::new(self.files.len())
    }

    /// Returns the pairs selected by `selection`.
    ///
    /// When the corpus has more pairs than the cap, a seeded uniform
    /// subsample is taken; the yielded pairs keep enumeration order. Calling
    /// this again with the same selection yields the same sequence.
    #[must_use]
    pub fn select_pairs(&self, selection: &PairSelection) -> SelectedPairs {
        let total = self.total_pairs();
        let sampled = match selection.max_pairs {
            Some(cap) if total > cap => {
                let mut rng = ChaCha8Rng::seed_from_u64(selection.seed);
                let mut picked: Vec<u64> =
                    rand::seq::index::sample(&mut rng, total as usize, cap as usize)
                        .into_iter()
                        .map(|i| i as u64)
                        .collect();
                picked.sort_unstable();
                tracing::info!(
                    "Corpus has {} pairs; sampling {} with seed {}",
                    total,
                    cap,
                    selection.seed
                );
                Some(picked)
            }
            _ => None,
        };

        SelectedPairs {
            inner: self.pairs(),
            sampled,
            ordinal: 0,
            cursor: 0,
        }
    }

    /// Loads every graph file, in id order.
    ///
    /// # Errors
    ///
    /// Returns the first I/O or parse error encountered.
    pub fn load_graphs(&self) -> Result<Vec<Graph>, CommonError> {
        self.files
            .iter()
            .map(|f| Graph::load(f.id, &f.path))
            .collect()
    }
}

/// How many pairs to enumerate and how to pick them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairSelection {
    /// Cap on the number of pairs; `None` enumerates all of them.
    pub max_pairs: Option<u64>,
    /// Seed for the subsample taken when the cap applies.
    pub seed: u64,
}

impl Default for PairSelection {
    fn default() -> Self {
        Self {
            max_pairs: Some(DEFAULT_MAX_PAIRS),
            seed: DEFAULT_SEED,
        }
    }
}

impl PairSelection {
    /// Enumerates every pair.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            max_pairs: None,
            seed: DEFAULT_SEED,
        }
    }
}

/// Lazy iterator over `(i, j)` with `i < j < n`.
#[derive(Debug, Clone)]
pub struct PairIndices {
    n: usize,
    i: usize,
    j: usize,
}

impl PairIndices {
    /// Creates the iterator for `n` items.
    #[must_use]
    pub const fn new(n: usize) -> Self {
        Self { n, i: 0, j: 1 }
    }
}

impl Iterator for PairIndices {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.j >= self.n {
            self.i += 1;
            self.j = self.i + 1;
            if self.j >= self.n {
                return None;
            }
        }
        let item = (self.i, self.j);
        self.j += 1;
        Some(item)
    }
}

/// Lazy iterator over the pairs chosen by a [`PairSelection`].
#[derive(Debug, Clone)]
pub struct SelectedPairs {
    inner: PairIndices,
    sampled: Option<Vec<u64>>,
    ordinal: u64,
    cursor: usize,
}

impl SelectedPairs {
    /// Returns the number of pairs this iterator yields in total.
    #[must_use]
    pub fn planned(&self, corpus_pairs: u64) -> u64 {
        self.sampled
            .as_ref()
            .map_or(corpus_pairs, |picked| picked.len() as u64)
    }
}

impl Iterator for SelectedPairs {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(sampled) = &self.sampled else {
                return self.inner.next();
            };
            let target = *sampled.get(self.cursor)?;
            let item = self.inner.next()?;
            let ordinal = self.ordinal;
            self.ordinal += 1;
            if ordinal == target {
                self.cursor += 1;
                return Some(item);
            }
        }
    }
}
