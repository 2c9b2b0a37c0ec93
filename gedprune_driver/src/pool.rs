//! Bounded pool of solver workers.
//!
//! Each worker thread supervises one solver process at a time. Workers pull
//! tasks from a shared queue and report over a single channel, so results
//! arrive in completion order and the receiving thread is the only place
//! that ever sees them.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use contracts::*;
use gedprune_common::{GraphPair, PairKey, ResultRecord};

use crate::{DriverError, SolverAdapter};

/// Shared flag telling workers and running solvers to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A pair that survived pruning and still needs the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub pair: GraphPair,
    /// Graph file for `pair.key().graph_id_1`.
    pub first: PathBuf,
    /// Graph file for `pair.key().graph_id_2`.
    pub second: PathBuf,
}

impl Task {
    #[must_use]
    pub const fn key(&self) -> PairKey {
        self.pair.key()
    }
}

/// Messages delivered to the pool's consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolEvent {
    /// A worker took a task.
    Dispatched { worker: usize, key: PairKey },
    /// A task reached a terminal solver state.
    Completed { worker: usize, record: ResultRecord },
    /// A task's solver was killed by cancellation; nothing to record.
    Cancelled { worker: usize, key: PairKey },
    /// A worker ran out of tasks or saw the cancel flag.
    WorkerExited { worker: usize },
    /// A termination signal arrived.
    Interrupted { signal: String },
}

/// Returns the number of workers to use when none is configured.
#[must_use]
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

type TaskQueue = Arc<Mutex<Box<dyn Iterator<Item = Task> + Send>>>;

/// Running workers.
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    cancel: CancelToken,
}

impl WorkerPool {
    /// Starts `workers` threads draining `tasks`.
    ///
    /// Every worker sends exactly one [`PoolEvent::WorkerExited`] when it
    /// stops, so the consumer knows the pool is done once it has seen
    /// [`WorkerPool::len`] of them.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::WorkerSpawn`] if a thread cannot be started;
    /// workers already started are cancelled.
    #[requires(workers > 0)]
    pub fn spawn<I>(
        tasks: I,
        adapter: SolverAdapter,
        workers: usize,
        cancel: CancelToken,
        events: Sender<PoolEvent>,
    ) -> Result<Self, DriverError>
    where
        I: IntoIterator<Item = Task>,
        I::IntoIter: Send + 'static,
    {
        let queue: TaskQueue = Arc::new(Mutex::new(Box::new(tasks.into_iter())));
        let adapter = Arc::new(adapter);
        let mut handles = Vec::with_capacity(workers);

        for worker in 0..workers {
            let queue = Arc::clone(&queue);
            let adapter = Arc::clone(&adapter);
            let cancel_for_worker = cancel.clone();
            let events = events.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("gedprune-worker-{worker}"))
                .spawn(move || worker_loop(worker, &queue, &adapter, &cancel_for_worker, &events));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    cancel.cancel();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(DriverError::WorkerSpawn { worker, source });
                }
            }
        }

        tracing::info!("Started {} solver workers", workers);
        Ok(Self { handles, cancel })
    }

    /// Returns the number of workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stops handing out tasks and kills running solvers.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for every worker thread to finish.
    pub fn join(self) {
        for handle in self.handles {
            if handle.join().is_err() {
                tracing::error!("A solver worker panicked");
            }
        }
    }
}

fn worker_loop(
    worker: usize,
    queue: &TaskQueue,
    adapter: &SolverAdapter,
    cancel: &CancelToken,
    events: &Sender<PoolEvent>,
) {
    let _exit = ExitNotice { worker, events };
    let timeout = adapter.config().timeout;
    loop {
        if cancel.is_cancelled() {
            break;
        }
        let next = match queue.lock() {
            Ok(mut tasks) => tasks.next(),
            Err(_) => {
                tracing::error!("Worker {}: task queue poisoned", worker);
                break;
            }
        };
        let Some(task) = next else {
            break;
        };

        tracing::trace!("Worker {}: dispatched {}", worker, task.key());
        if events
            .send(PoolEvent::Dispatched {
                worker,
                key: task.key(),
            })
            .is_err()
        {
            break;
        }

        let run = adapter.run(&task.first, &task.second, cancel);
        let event = match run.into_outcome(timeout) {
            Some(outcome) => {
                let record = ResultRecord::new(task.key(), outcome);
                tracing::trace!("Worker {}: {} {}", worker, task.key(), record.outcome.kind());
                PoolEvent::Completed { worker, record }
            }
            None => PoolEvent::Cancelled {
                worker,
                key: task.key(),
            },
        };
        if events.send(event).is_err() {
            break;
        }
    }
}

/// Sends [`PoolEvent::WorkerExited`] when a worker stops, panics included.
struct ExitNotice<'a> {
    worker: usize,
    events: &'a Sender<PoolEvent>,
}

impl Drop for ExitNotice<'_> {
    fn drop(&mut self) {
        let _ = self.events.send(PoolEvent::WorkerExited {
            worker: self.worker,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gedprune_common::{Graph, GraphId};

    #[test]
    fn cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn missing_solver_fails_every_task() {
        let (tx, rx) = std::sync::mpsc::channel();
        let origin = Graph::from_edges(GraphId(0), &[]);
        let tasks: Vec<Task> = (1..=3)
            .map(|i| Task {
                pair: GraphPair::new(&origin, &Graph::from_edges(GraphId(i), &[(0, 1)])),
                first: PathBuf::from("a"),
                second: PathBuf::from("b"),
            })
            .collect();
        let adapter = SolverAdapter::new(crate::SolverConfig::new("/nonexistent/solver"));
        let pool = WorkerPool::spawn(tasks, adapter, 2, CancelToken::new(), tx).unwrap();
        let workers = pool.len();
        pool.join();

        let events: Vec<PoolEvent> = rx.try_iter().collect();
        let exits = events
            .iter()
            .filter(|e| matches!(e, PoolEvent::WorkerExited { .. }))
            .count();
        let failed = events
            .iter()
            .filter(|e| {
                matches!(e, PoolEvent::Completed { record, .. }
                    if record.outcome.kind() == gedprune_common::OutcomeKind::SolverFailed)
            })
            .count();
        assert_eq!(exits, workers);
        assert_eq!(failed, 3);
    }
}
