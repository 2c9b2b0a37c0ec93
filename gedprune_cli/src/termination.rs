//! Turns termination signals into a pool event.
//!
//! A dedicated thread runs a single-threaded tokio runtime that waits for
//! SIGINT, SIGTERM or SIGHUP (Ctrl-C on other platforms). The first signal
//! is forwarded as [`PoolEvent::Interrupted`] and then cancels the run; the
//! orchestrator does the rest on its own thread.

use std::io;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use gedprune_driver::{CancelToken, PoolEvent};
use tokio::sync::oneshot;

/// Background signal listener. Dropping it stops the thread.
#[derive(Debug)]
pub struct TerminationListener {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TerminationListener {
    /// Installs the signal handlers and starts listening.
    ///
    /// Returns once the handlers are registered, so a signal delivered after
    /// this call is never lost.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread, the runtime or a handler cannot be
    /// created.
    pub fn install(events: Sender<PoolEvent>, cancel: CancelToken) -> io::Result<Self> {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (ready_tx, ready_rx) = mpsc::channel::<io::Result<()>>();

        let handle = std::thread::Builder::new()
            .name("gedprune-signals".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                runtime.block_on(listen(events, cancel, shutdown_rx, ready_tx));
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                tracing::debug!("Termination listener installed");
                Ok(Self {
                    shutdown: Some(shutdown_tx),
                    handle: Some(handle),
                })
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(io::Error::other("signal listener exited before it was ready"))
            }
        }
    }
}

impl Drop for TerminationListener {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Signal listener panicked");
            }
        }
    }
}

#[cfg(unix)]
async fn listen(
    events: Sender<PoolEvent>,
    cancel: CancelToken,
    shutdown: oneshot::Receiver<()>,
    ready: mpsc::Sender<io::Result<()>>,
) {
    use tokio::signal::unix::{SignalKind, signal};

    let registered = signal(SignalKind::interrupt()).and_then(|int| {
        let term = signal(SignalKind::terminate())?;
        let hup = signal(SignalKind::hangup())?;
        Ok((int, term, hup))
    });
    let (mut int, mut term, mut hup) = match registered {
        Ok(signals) => {
            let _ = ready.send(Ok(()));
            signals
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let name = tokio::select! {
        _ = int.recv() => "SIGINT",
        _ = term.recv() => "SIGTERM",
        _ = hup.recv() => "SIGHUP",
        _ = shutdown => return,
    };
    interrupt(name, &events, &cancel);
}

#[cfg(not(unix))]
async fn listen(
    events: Sender<PoolEvent>,
    cancel: CancelToken,
    shutdown: oneshot::Receiver<()>,
    ready: mpsc::Sender<io::Result<()>>,
) {
    let _ = ready.send(Ok(()));
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
        }
        _ = shutdown => return,
    }
    interrupt("Ctrl-C", &events, &cancel);
}

// The event goes first so a consumer that sees the cancel flag also finds
// the event in the channel.
fn interrupt(name: &str, events: &Sender<PoolEvent>, cancel: &CancelToken) {
    tracing::warn!("Received {}, stopping dispatch", name);
    let _ = events.send(PoolEvent::Interrupted {
        signal: name.to_string(),
    });
    cancel.cancel();
}
