use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use gedprune_cli::{
    CliError, DEFAULT_THRESHOLD, EstimateConfig, PruningConfig, RunConfig, SourceKind,
};
use gedprune_common::{DEFAULT_MAX_PAIRS, DEFAULT_SEED, PairSelection};
use gedprune_heuristics::Heuristic;
use gedprune_store::DEFAULT_ROW_CEILING;

/// Heuristic-pruned, checkpointed graph edit distance runs
#[derive(Parser, Debug)]
#[command(name = "gedprune")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Prune pairs with lower bounds and solve the rest with an external solver
    Run(RunArgs),
    /// Compute a heuristic lower-bound table for a corpus
    Estimate(EstimateArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Directory of graph_<id>.txt files
    pub graph_dir: PathBuf,
    /// Solver executable (bare names are looked up on PATH)
    pub solver: PathBuf,
    /// Output table path
    pub output: PathBuf,

    /// Number of concurrent solver processes (default: CPU count)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,
    /// Dataset name used to select heuristic tables (default: graph directory name)
    #[arg(long)]
    pub dataset: Option<String>,

    /// Directory of precomputed heuristic tables
    #[arg(long)]
    pub heuristics_dir: Option<PathBuf>,
    /// Where lower bounds come from
    #[arg(long, value_enum, default_value = "live")]
    pub source: SourceArg,
    /// Skip a pair when a consulted lower bound is above this value
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,
    /// Heuristic to consult; repeat for several (default: combined_basic)
    #[arg(long = "heuristic")]
    pub heuristics: Vec<String>,
    /// Send every pair to the solver
    #[arg(long, default_value_t = false)]
    pub no_prune: bool,
    /// Report what each heuristic would prune, then stop
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Wall-clock limit per solver run, in seconds
    #[arg(long, default_value_t = 30.0)]
    pub timeout: f64,
    /// Solver search strategy
    #[arg(long, default_value = "astar")]
    pub search: String,
    /// Solver-side lower bound
    #[arg(long, default_value = "BMao")]
    pub lower_bound: String,
    /// Solver-side time limit (-1 disables it)
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    pub time_limit: i64,
    /// Extra argument appended to every solver call; repeatable
    #[arg(long = "solver-arg", allow_hyphen_values = true)]
    pub solver_args: Vec<String>,
    /// Keep the solver's address-space and CPU-time limits as inherited
    #[arg(long, default_value_t = false)]
    pub no_relax_limits: bool,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Flush the table after this many results
    #[arg(long, default_value_t = 1)]
    pub flush_every: usize,
    /// Largest number of rows per part file
    #[arg(long, default_value_t = DEFAULT_ROW_CEILING)]
    pub row_ceiling: usize,
    /// Keep existing results and only solve the missing pairs
    #[arg(long, default_value_t = false)]
    pub resume: bool,
}

#[derive(clap::Args, Debug)]
pub struct EstimateArgs {
    /// Directory of graph_<id>.txt files
    pub graph_dir: PathBuf,
    /// Table to write
    pub output: PathBuf,
    /// Dataset name written into every row (default: graph directory name)
    #[arg(long)]
    pub dataset: Option<String>,
    /// Heuristic to compute; repeat for several (default: all)
    #[arg(long = "heuristic")]
    pub heuristics: Vec<String>,

    #[command(flatten)]
    pub selection: SelectionArgs,
}

#[derive(clap::Args, Debug)]
pub struct SelectionArgs {
    /// Cap on enumerated pairs; larger corpora are subsampled (0 = no cap)
    #[arg(long, default_value_t = DEFAULT_MAX_PAIRS)]
    pub max_pairs: u64,
    /// Seed of the pair subsample
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

impl SelectionArgs {
    fn to_selection(&self) -> PairSelection {
        PairSelection {
            max_pairs: (self.max_pairs > 0).then_some(self.max_pairs),
            seed: self.seed,
        }
    }
}

/// Command-line wrapper for [`SourceKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceArg {
    /// Compute bounds from the loaded graphs
    #[value(name = "live")]
    Live,
    /// Read bounds from --heuristics-dir
    #[value(name = "table")]
    Table,
}

impl RunArgs {
    /// Converts command-line arguments into a run configuration
    pub fn to_config(&self) -> Result<RunConfig, CliError> {
        if !self.timeout.is_finite() || self.timeout <= 0.0 {
            return Err(CliError::Config(format!(
                "--timeout must be a positive number of seconds, got {}",
                self.timeout
            )));
        }
        if self.threshold.is_nan() {
            return Err(CliError::Config("--threshold must be a number".to_string()));
        }
        let timeout = Duration::try_from_secs_f64(self.timeout).map_err(|_| {
            CliError::Config(format!("--timeout {} seconds is out of range", self.timeout))
        })?;

        let source = match (self.source, &self.heuristics_dir) {
            (SourceArg::Live, _) => SourceKind::Live,
            (SourceArg::Table, Some(dir)) => SourceKind::Table(dir.clone()),
            (SourceArg::Table, None) => {
                return Err(CliError::Config(
                    "--source table requires --heuristics-dir".to_string(),
                ));
            }
        };
        let pruning = (!self.no_prune).then(|| PruningConfig {
            threshold: self.threshold,
            heuristics: if self.heuristics.is_empty() {
                PruningConfig::default().heuristics
            } else {
                self.heuristics.clone()
            },
            source,
        });

        let mut builder = RunConfig::builder(&self.graph_dir, &self.solver, &self.output)
            .workers(self.workers.unwrap_or(0))
            .selection(self.selection.to_selection())
            .timeout(timeout)
            .solver(|solver| {
                solver
                    .with_search(&self.search, &self.lower_bound)
                    .with_time_limit(self.time_limit)
                    .with_extra_args(self.solver_args.clone())
                    .with_relax_limits(!self.no_relax_limits)
            })
            .pruning(pruning)
            .dry_run(self.dry_run)
            .flush_every(self.flush_every)
            .row_ceiling(self.row_ceiling)
            .resume(self.resume);
        if let Some(dataset) = &self.dataset {
            builder = builder.dataset(dataset);
        }
        Ok(builder.build())
    }
}

impl EstimateArgs {
    /// Converts command-line arguments into an estimate configuration
    pub fn to_config(&self) -> Result<EstimateConfig, CliError> {
        let mut config = EstimateConfig::new(&self.graph_dir, &self.output);
        if let Some(dataset) = &self.dataset {
            config.dataset.clone_from(dataset);
        }
        if !self.heuristics.is_empty() {
            config.heuristics = self
                .heuristics
                .iter()
                .map(|h| h.parse::<Heuristic>())
                .collect::<Result<_, _>>()?;
        }
        config.selection = self.selection.to_selection();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["gedprune", "run", "graphs/AIDS", "ged", "out.csv"];
        argv.extend_from_slice(extra);
        match Args::parse_from(argv).command {
            Command::Run(args) => args,
            Command::Estimate(_) => unreachable!(),
        }
    }

    #[test]
    fn run_defaults() {
        let config = run_args(&[]).to_config().unwrap();
        assert_eq!(config.dataset, "AIDS");
        assert_eq!(config.solver.time_limit, -1);
        assert_eq!(config.solver.timeout, Duration::from_secs(30));
        assert_eq!(config.pruning.unwrap().threshold, DEFAULT_THRESHOLD);
    }

    #[rstest::rstest]
    #[case::zero("0")]
    #[case::huge("1e20")]
    #[case::infinite("inf")]
    fn unusable_timeouts_are_config_errors(#[case] timeout: &str) {
        let err = run_args(&["--timeout", timeout]).to_config().unwrap_err();
        assert!(matches!(err, CliError::Config(_)), "{err}");
    }

    #[test]
    fn table_source_needs_a_directory() {
        assert!(run_args(&["--source", "table"]).to_config().is_err());
        let config = run_args(&["--source", "table", "--heuristics-dir", "tables", "--threshold", "10"])
            .to_config()
            .unwrap();
        let pruning = config.pruning.unwrap();
        assert_eq!(pruning.source, SourceKind::Table(PathBuf::from("tables")));
        assert_eq!(pruning.threshold, 10.0);
    }

    #[test]
    fn solver_flags_reach_the_config() {
        let config = run_args(&[
            "--no-prune",
            "--time-limit",
            "60",
            "--solver-arg",
            "-v",
            "--max-pairs",
            "0",
            "--no-relax-limits",
        ])
        .to_config()
        .unwrap();
        assert_eq!(config.pruning, None);
        assert_eq!(config.solver.time_limit, 60);
        assert_eq!(config.solver.extra_args, vec!["-v".to_string()]);
        assert!(!config.solver.relax_limits);
        assert_eq!(config.selection.max_pairs, None);
    }

    #[test]
    fn estimate_rejects_unknown_heuristics() {
        let argv = ["gedprune", "estimate", "g", "t.csv", "--heuristic", "nope"];
        let Command::Estimate(args) = Args::parse_from(argv).command else {
            unreachable!()
        };
        assert!(args.to_config().is_err());
    }
}
