use gedprune_common::{Corpus, Graph, GraphPair, Outcome, ResultRecord};
use gedprune_driver::{SolverAdapter, Task, WorkerPool, resolve_executable};
use gedprune_heuristics::{
    Decision, EstimateSource, HeuristicTable, LiveEstimator, PruneReport, PruningPolicy, dry_run,
};

use crate::{CliError, Orchestrator, PruningConfig, RunConfig, RunSummary, SourceKind};

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunReport {
    /// Every enumerated pair has a record.
    Completed(RunSummary),
    /// A termination signal stopped the run after a final flush.
    Interrupted(RunSummary),
    /// Heuristics were only evaluated.
    DryRun(PruneReport),
}

impl RunReport {
    /// Returns the process exit code for this outcome.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Completed(_) | Self::DryRun(_) => 0,
            Self::Interrupted(_) => crate::EXIT_INTERRUPTED,
        }
    }
}

/// Runs the whole pipeline: enumerate, prune, solve, record.
///
/// Fatal problems (missing graph directory, unloadable graphs, missing
/// heuristic table, missing solver) are reported before anything is
/// dispatched. Per-pair problems become records.
///
/// # Errors
///
/// Returns the first fatal error. A store failure during the run is
/// returned after a best-effort final flush.
pub fn run_pipeline(config: &RunConfig) -> Result<RunReport, CliError> {
    if config.pruning.as_ref().is_some_and(|p| p.threshold.is_nan()) {
        return Err(CliError::Config("the pruning threshold must be a number".to_string()));
    }
    let corpus = Corpus::scan(&config.graph_dir)?;
    let graphs = corpus.load_graphs()?;
    let planned = corpus
        .select_pairs(&config.selection)
        .planned(corpus.total_pairs());
    tracing::info!(
        "Loaded {} graphs from {} ({} pairs planned)",
        graphs.len(),
        corpus.root().display(),
        planned
    );

    if config.dry_run {
        let pruning = config.pruning.clone().unwrap_or_default();
        let source = estimate_source(&pruning, &config.dataset, &graphs, &[])?;
        let keys = corpus
            .select_pairs(&config.selection)
            .map(|(i, j)| GraphPair::new(&graphs[i], &graphs[j]).key());
        let report = dry_run(source.as_ref(), keys, pruning.threshold);
        tracing::info!("Dry run finished over {} pairs", report.pairs);
        return Ok(RunReport::DryRun(report));
    }

    let pruning = match &config.pruning {
        Some(pruning) => {
            let policy = PruningPolicy::new(pruning.threshold, &pruning.heuristics);
            let source = estimate_source(pruning, &config.dataset, &graphs, policy.heuristics())?;
            tracing::info!(
                "Pruning with {:?} at threshold {}",
                policy.heuristics(),
                policy.threshold()
            );
            Some((policy, source))
        }
        None => {
            tracing::info!("Pruning disabled");
            None
        }
    };

    let executable = resolve_executable(&config.solver.executable)?;
    let mut solver = config.solver.clone();
    solver.executable = executable;
    let adapter = SolverAdapter::new(solver);

    let mut orchestrator =
        Orchestrator::start(config.store.clone(), config.progress_every, config.handle_signals)?;
    let cancel = orchestrator.cancel_token();

    let mut enumerated = 0;
    let mut resumed = 0;
    let mut skipped = 0;
    let mut tasks = Vec::new();
    for (i, j) in corpus.select_pairs(&config.selection) {
        if cancel.is_cancelled() {
            break;
        }
        enumerated += 1;
        let pair = GraphPair::new(&graphs[i], &graphs[j]);
        let key = pair.key();
        if orchestrator.store().contains(&key) {
            resumed += 1;
            continue;
        }
        let decision = pruning
            .as_ref()
            .map_or(Decision::Keep, |(policy, source)| policy.evaluate(source.as_ref(), key));
        match decision {
            Decision::Skip(reason) => {
                tracing::debug!("Skipping {}: {}", key, reason);
                if orchestrator.record_skip(ResultRecord::new(key, Outcome::Skipped(reason))) {
                    skipped += 1;
                }
            }
            Decision::Keep => tasks.push(Task {
                pair,
                first: corpus.files()[i].path.clone(),
                second: corpus.files()[j].path.clone(),
            }),
        }
    }
    tracing::info!(
        "Pruning pass: {} pairs, {} skipped, {} already recorded, {} to solve",
        enumerated,
        skipped,
        resumed,
        tasks.len()
    );
    orchestrator.flush()?;

    let driven = if tasks.is_empty() || cancel.is_cancelled() {
        Ok(())
    } else {
        let workers = config.workers.clamp(1, tasks.len());
        let pool = WorkerPool::spawn(tasks, adapter, workers, cancel, orchestrator.sender())?;
        let driven = orchestrator.drive(pool.len());
        pool.join();
        driven
    };

    let finished = orchestrator.shutdown();
    driven?;
    let mut summary = finished?;
    summary.enumerated = enumerated;
    summary.resumed = resumed;

    Ok(if summary.interrupted.is_some() {
        RunReport::Interrupted(summary)
    } else {
        RunReport::Completed(summary)
    })
}

/// Builds the configured estimate source; a table must cover `required`.
fn estimate_source<'a>(
    pruning: &PruningConfig,
    dataset: &str,
    graphs: &'a [Graph],
    required: &[String],
) -> Result<Box<dyn EstimateSource + 'a>, CliError> {
    match &pruning.source {
        SourceKind::Live => Ok(Box::new(LiveEstimator::new(graphs))),
        SourceKind::Table(dir) => {
            let table = HeuristicTable::load_dir(dir, dataset)?;
            table.require(required)?;
            tracing::info!(
                "Loaded {} estimates for {} from {}",
                table.len(),
                dataset,
                dir.display()
            );
            Ok(Box::new(table))
        }
    }
}
