//! The single owner of the result store during a run.
//!
//! Workers and the termination listener only ever send [`PoolEvent`]s; the
//! thread that owns the [`Orchestrator`] is the one that receives them and
//! the only one that writes results.

use std::sync::mpsc::{self, Receiver, Sender};

use gedprune_common::{OutcomeKind, ResultRecord};
use gedprune_driver::{CancelToken, PoolEvent};
use gedprune_store::{ResultStore, StoreConfig};

use crate::{CliError, RunSummary, TerminationListener};

/// Lifecycle of one run: `start`, then results through
/// [`Orchestrator::record_skip`] and [`Orchestrator::drive`], then
/// [`Orchestrator::shutdown`].
#[derive(Debug)]
pub struct Orchestrator {
    store: ResultStore,
    cancel: CancelToken,
    events_tx: Sender<PoolEvent>,
    events_rx: Receiver<PoolEvent>,
    listener: Option<TerminationListener>,
    progress_every: usize,
    completed: usize,
    summary: RunSummary,
}

impl Orchestrator {
    /// Opens the store and, with `handle_signals`, installs the
    /// termination listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or the listener cannot
    /// be installed.
    pub fn start(
        store: StoreConfig,
        progress_every: usize,
        handle_signals: bool,
    ) -> Result<Self, CliError> {
        let store = ResultStore::open(store)?;
        let cancel = CancelToken::new();
        let (events_tx, events_rx) = mpsc::channel();
        let listener = if handle_signals {
            Some(TerminationListener::install(events_tx.clone(), cancel.clone())?)
        } else {
            None
        };

        if !store.is_empty() {
            tracing::info!("{} results already recorded", store.len());
        }
        Ok(Self {
            store,
            cancel,
            events_tx,
            events_rx,
            listener,
            progress_every: progress_every.max(1),
            completed: 0,
            summary: RunSummary::default(),
        })
    }

    /// Returns the run's cancel token.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Returns a sender for the pool's events.
    #[must_use]
    pub fn sender(&self) -> Sender<PoolEvent> {
        self.events_tx.clone()
    }

    /// Returns the result store.
    #[must_use]
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Records a pair removed by pruning. The next flush persists it.
    pub fn record_skip(&mut self, record: ResultRecord) -> bool {
        let staged = self.store.stage(record);
        if staged {
            self.summary.pruned += 1;
        }
        staged
    }

    /// Records one finished task and reports progress on cadence.
    ///
    /// # Errors
    ///
    /// Returns the store error if a due flush failed.
    pub fn on_task_complete(&mut self, record: ResultRecord) -> Result<(), CliError> {
        tracing::debug!("{} -> {}", record.key, record.outcome.kind());
        if self.store.record(record)? {
            self.completed += 1;
            if self.completed % self.progress_every == 0 {
                self.log_progress();
            }
        }
        Ok(())
    }

    /// Persists everything recorded so far.
    ///
    /// # Errors
    ///
    /// Returns the store error if no persistence strategy succeeded.
    pub fn flush(&mut self) -> Result<(), CliError> {
        self.store.flush()?;
        Ok(())
    }

    /// Consumes pool events until `workers` workers have exited.
    ///
    /// A store failure cancels the run; the remaining results are still
    /// collected in memory and the first failure is returned once every
    /// worker is gone.
    ///
    /// # Errors
    ///
    /// Returns the first store error seen.
    pub fn drive(&mut self, workers: usize) -> Result<(), CliError> {
        let mut exited = 0;
        let mut failure = None;
        while exited < workers {
            let Ok(event) = self.events_rx.recv() else {
                break;
            };
            if self.handle(event, &mut failure) {
                exited += 1;
            }
        }
        failure.map_or(Ok(()), Err)
    }

    /// Stops dispatch, takes in any events still queued, flushes and
    /// returns the summary.
    ///
    /// The summary's `enumerated` and `resumed` fields are left for the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns the error of the final flush.
    pub fn shutdown(mut self) -> Result<RunSummary, CliError> {
        self.cancel.cancel();
        drop(self.listener.take());

        let mut failure = None;
        let queued: Vec<PoolEvent> = self.events_rx.try_iter().collect();
        for event in queued {
            self.handle(event, &mut failure);
        }
        if let Some(e) = failure {
            tracing::warn!("Late result could not be flushed: {}", e);
        }

        let flushed = self.flush();
        self.summary.absorb(self.store.records());
        match &flushed {
            Ok(()) => tracing::info!(
                "Final flush: {} results in {}",
                self.store.len(),
                self.store.config().path.display()
            ),
            Err(e) => tracing::error!("Final flush failed: {}", e),
        }
        flushed?;
        Ok(self.summary)
    }

    /// Returns true once a termination signal has been seen.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.summary.interrupted.is_some()
    }

    // Returns true for a worker exit.
    fn handle(&mut self, event: PoolEvent, failure: &mut Option<CliError>) -> bool {
        match event {
            PoolEvent::Dispatched { worker, key } => {
                self.summary.dispatched += 1;
                tracing::trace!("Worker {} took {}", worker, key);
            }
            PoolEvent::Completed { record, .. } => {
                if failure.is_some() {
                    self.store.stage(record);
                } else if let Err(e) = self.on_task_complete(record) {
                    tracing::error!("Result store failed, stopping dispatch: {}", e);
                    self.cancel.cancel();
                    *failure = Some(e);
                }
            }
            PoolEvent::Cancelled { worker, key } => {
                self.summary.abandoned += 1;
                tracing::debug!("Worker {} abandoned {}", worker, key);
            }
            PoolEvent::WorkerExited { worker } => {
                tracing::trace!("Worker {} exited", worker);
                return true;
            }
            PoolEvent::Interrupted { signal } => {
                if self.summary.interrupted.is_none() {
                    tracing::warn!(
                        "{} received after {} results; finishing up",
                        signal,
                        self.completed
                    );
                    self.summary.interrupted = Some(signal);
                }
                self.cancel.cancel();
            }
        }
        false
    }

    fn log_progress(&self) {
        let counts = self.store.counts();
        let count = |kind: OutcomeKind| counts.get(&kind).copied().unwrap_or(0);
        tracing::info!(
            "Progress: {} processed, {} skipped, {} failed, {} timed out",
            self.store.len(),
            count(OutcomeKind::Skipped),
            count(OutcomeKind::SolverFailed),
            count(OutcomeKind::TimedOut)
        );
    }
}
