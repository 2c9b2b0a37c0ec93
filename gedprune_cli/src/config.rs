use std::path::{Path, PathBuf};
use std::time::Duration;

use gedprune_common::PairSelection;
use gedprune_driver::{SolverConfig, default_workers};
use gedprune_heuristics::Heuristic;
use gedprune_store::StoreConfig;

/// Default pruning threshold.
pub const DEFAULT_THRESHOLD: f64 = 150.0;

/// Completions between progress lines.
pub const DEFAULT_PROGRESS_EVERY: usize = 10;

/// Where lower-bound estimates come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Computed from the loaded graphs.
    Live,
    /// Read from precomputed tables in a directory.
    Table(PathBuf),
}

/// Pruning settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PruningConfig {
    pub threshold: f64,
    /// Consulted heuristics, in order.
    pub heuristics: Vec<String>,
    pub source: SourceKind,
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            heuristics: vec![Heuristic::DEFAULT.name().to_string()],
            source: SourceKind::Live,
        }
    }
}

/// Everything a `run` needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub graph_dir: PathBuf,
    /// Dataset name used to pick heuristic tables.
    pub dataset: String,
    pub workers: usize,
    pub selection: PairSelection,
    pub solver: SolverConfig,
    /// `None` sends every pair to the solver.
    pub pruning: Option<PruningConfig>,
    /// Report what each heuristic would prune and stop.
    pub dry_run: bool,
    pub store: StoreConfig,
    pub progress_every: usize,
    /// Install the SIGINT/SIGTERM/SIGHUP listener.
    pub handle_signals: bool,
}

impl RunConfig {
    /// Starts a builder with defaults for everything but the three paths.
    #[must_use]
    pub fn builder(
        graph_dir: impl Into<PathBuf>,
        solver: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> RunConfigBuilder {
        RunConfigBuilder::new(graph_dir.into(), solver.into(), output.into())
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug, Clone)]
pub struct RunConfigBuilder {
    config: RunConfig,
    dataset: Option<String>,
}

impl RunConfigBuilder {
    fn new(graph_dir: PathBuf, solver: PathBuf, output: PathBuf) -> Self {
        Self {
            config: RunConfig {
                graph_dir,
                dataset: String::new(),
                workers: default_workers(),
                selection: PairSelection::default(),
                solver: SolverConfig::new(solver),
                pruning: Some(PruningConfig::default()),
                dry_run: false,
                store: StoreConfig::new(output),
                progress_every: DEFAULT_PROGRESS_EVERY,
                handle_signals: true,
            },
            dataset: None,
        }
    }

    #[must_use]
    pub fn dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    /// Sets the worker count; zero keeps the default.
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        if workers > 0 {
            self.config.workers = workers;
        }
        self
    }

    #[must_use]
    pub fn selection(mut self, selection: PairSelection) -> Self {
        self.config.selection = selection;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.solver.timeout = timeout;
        self
    }

    #[must_use]
    pub fn solver(mut self, f: impl FnOnce(SolverConfig) -> SolverConfig) -> Self {
        self.config.solver = f(self.config.solver);
        self
    }

    #[must_use]
    pub fn pruning(mut self, pruning: Option<PruningConfig>) -> Self {
        self.config.pruning = pruning;
        self
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn flush_every(mut self, flush_every: usize) -> Self {
        self.config.store.flush_every = flush_every.max(1);
        self
    }

    #[must_use]
    pub fn row_ceiling(mut self, row_ceiling: usize) -> Self {
        self.config.store.row_ceiling = row_ceiling.max(1);
        self
    }

    #[must_use]
    pub fn resume(mut self, resume: bool) -> Self {
        self.config.store.resume = resume;
        self
    }

    #[must_use]
    pub fn progress_every(mut self, progress_every: usize) -> Self {
        self.config.progress_every = progress_every.max(1);
        self
    }

    #[must_use]
    pub fn handle_signals(mut self, handle_signals: bool) -> Self {
        self.config.handle_signals = handle_signals;
        self
    }

    /// Finishes the configuration.
    ///
    /// The dataset defaults to the graph directory's name.
    #[must_use]
    pub fn build(self) -> RunConfig {
        let mut config = self.config;
        config.dataset = self
            .dataset
            .unwrap_or_else(|| dataset_from_dir(&config.graph_dir));
        config
    }
}

/// Everything an `estimate` needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateConfig {
    pub graph_dir: PathBuf,
    pub output: PathBuf,
    pub dataset: String,
    pub heuristics: Vec<Heuristic>,
    pub selection: PairSelection,
}

impl EstimateConfig {
    /// Estimates every heuristic over the default pair selection.
    #[must_use]
    pub fn new(graph_dir: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        let graph_dir = graph_dir.into();
        Self {
            dataset: dataset_from_dir(&graph_dir),
            graph_dir,
            output: output.into(),
            heuristics: Heuristic::ALL.to_vec(),
            selection: PairSelection::default(),
        }
    }
}

fn dataset_from_dir(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_defaults_to_directory_name() {
        let config = RunConfig::builder("data/AIDS", "ged", "out.csv").build();
        assert_eq!(config.dataset, "AIDS");
        assert_eq!(config.pruning, Some(PruningConfig::default()));
        assert_eq!(config.store.flush_every, 1);

        let named = RunConfig::builder("data/AIDS", "ged", "out.csv")
            .dataset("LINUX")
            .workers(0)
            .build();
        assert_eq!(named.dataset, "LINUX");
        assert!(named.workers > 0);
    }
}
