//! One external solver process per pair.

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use gedprune_common::Outcome;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::{CancelToken, DriverError, parse_output};

/// Default wall-clock limit for one solver run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval between exit, timeout and cancellation checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

// How long output readers may lag behind an exit near the timeout.
const OUTPUT_GRACE: Duration = Duration::from_millis(250);

/// How to invoke the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub executable: PathBuf,
    /// Search strategy passed as `-p`.
    pub search: String,
    /// Solver-side lower bound passed as `-l`.
    pub lower_bound: String,
    /// Solver-side time limit passed as `-t`; `-1` disables it.
    pub time_limit: i64,
    /// Appended verbatim after the fixed arguments.
    pub extra_args: Vec<String>,
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Raise the child's address-space and CPU-time limits before exec.
    pub relax_limits: bool,
    /// Track the child's peak resident memory.
    pub sample_memory: bool,
}

impl SolverConfig {
    /// Defaults for the exact A* search.
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            search: "astar".to_string(),
            lower_bound: "BMao".to_string(),
            time_limit: -1,
            extra_args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            relax_limits: true,
            sample_memory: true,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>, lower_bound: impl Into<String>) -> Self {
        self.search = search.into();
        self.lower_bound = lower_bound.into();
        self
    }

    #[must_use]
    pub fn with_time_limit(mut self, time_limit: i64) -> Self {
        self.time_limit = time_limit;
        self
    }

    #[must_use]
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    #[must_use]
    pub fn with_relax_limits(mut self, relax: bool) -> Self {
        self.relax_limits = relax;
        self
    }

    #[must_use]
    pub fn with_sample_memory(mut self, sample: bool) -> Self {
        self.sample_memory = sample;
        self
    }
}

/// Resolves the solver executable.
///
/// A bare name is looked up on `PATH`; anything with a directory component
/// must point at an existing file.
///
/// # Errors
///
/// Returns [`DriverError::SolverNotFound`] or [`DriverError::SolverNotAFile`].
pub fn resolve_executable(name: &Path) -> Result<PathBuf, DriverError> {
    if name.components().count() > 1 || name.is_absolute() {
        if name.is_file() {
            return Ok(name.to_path_buf());
        }
        return Err(DriverError::SolverNotAFile(name.to_path_buf()));
    }
    which::which(name).map_err(|source| DriverError::SolverNotFound {
        name: name.display().to_string(),
        source,
    })
}

/// How one solver run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverRun {
    /// Exited with status zero.
    Finished {
        stdout: String,
        elapsed: Duration,
        peak_memory_mb: Option<f64>,
    },
    /// The timeout fired and the process was killed.
    TimedOut { elapsed: Duration },
    /// Could not be started, or exited unsuccessfully.
    Failed { reason: String },
    /// Killed because the run is shutting down.
    Cancelled,
}

impl SolverRun {
    /// Maps the run to a recordable outcome.
    ///
    /// Returns `None` for [`SolverRun::Cancelled`]: an interrupted run leaves
    /// no record behind.
    #[must_use]
    pub fn into_outcome(self, timeout: Duration) -> Option<Outcome> {
        match self {
            Self::Finished {
                stdout,
                elapsed,
                peak_memory_mb,
            } => Some(match parse_output(&stdout) {
                Some(parsed) => Outcome::Computed(parsed.into_computed(elapsed, peak_memory_mb)),
                None => Outcome::SolverFailed {
                    reason: "unparsable solver output".to_string(),
                },
            }),
            Self::TimedOut { .. } => Some(Outcome::TimedOut {
                timeout_secs: timeout.as_secs_f64(),
            }),
            Self::Failed { reason } => Some(Outcome::SolverFailed { reason }),
            Self::Cancelled => None,
        }
    }
}

/// Runs the solver on a pair of graph files.
#[derive(Debug, Clone)]
pub struct SolverAdapter {
    config: SolverConfig,
}

impl SolverAdapter {
    #[must_use]
    pub const fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Arguments passed to the solver, without the executable.
    #[must_use]
    pub fn args(&self, first: &Path, second: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-d".into(),
            first.into(),
            "-q".into(),
            second.into(),
            "-m".into(),
            "pair".into(),
            "-p".into(),
            self.config.search.clone().into(),
            "-l".into(),
            self.config.lower_bound.clone().into(),
            "-t".into(),
            self.config.time_limit.to_string().into(),
            "-g".into(),
        ];
        args.extend(self.config.extra_args.iter().map(OsString::from));
        args
    }

    /// Runs the solver and waits for it to exit, time out or be cancelled.
    ///
    /// Returns no later than one poll interval after the timeout (plus a
    /// short grace for output still in flight). On timeout or cancellation
    /// the child (and its process group on Unix) is killed and reaped before
    /// returning; after a normal exit anything left in the group is killed.
    pub fn run(&self, first: &Path, second: &Path, cancel: &CancelToken) -> SolverRun {
        let mut cmd = Command::new(&self.config.executable);
        cmd.args(self.args(first, second))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
            if self.config.relax_limits {
                // SAFETY: the hook only calls getrlimit/setrlimit, which are
                // async-signal-safe, and allocates nothing.
                unsafe {
                    cmd.pre_exec(relax_limits);
                }
            }
        }

        let start = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return SolverRun::Failed {
                    reason: format!("failed to start {}: {e}", self.config.executable.display()),
                };
            }
        };
        tracing::trace!("Started solver pid {} on {} / {}", child.id(), first.display(), second.display());

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let mut memory = self
            .config
            .sample_memory
            .then(|| MemorySampler::new(child.id()));

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    terminate(&mut child);
                    return SolverRun::Failed {
                        reason: format!("failed to wait for solver: {e}"),
                    };
                }
            }

            if cancel.is_cancelled() {
                terminate(&mut child);
                tracing::debug!("Cancelled solver on {} / {}", first.display(), second.display());
                return SolverRun::Cancelled;
            }

            let elapsed = start.elapsed();
            if elapsed >= self.config.timeout {
                terminate(&mut child);
                tracing::debug!(
                    "Solver timed out after {:.2}s on {} / {}",
                    elapsed.as_secs_f64(),
                    first.display(),
                    second.display()
                );
                return SolverRun::TimedOut {
                    elapsed: start.elapsed(),
                };
            }

            if let Some(sampler) = memory.as_mut() {
                sampler.sample();
            }
            std::thread::sleep(
                self.config
                    .poll_interval
                    .min(self.config.timeout.saturating_sub(elapsed)),
            );
        };
        let elapsed = start.elapsed();
        kill_leftovers(&child);

        // A process that left the group can still hold the pipes open.
        let deadline = (start + self.config.timeout).max(Instant::now() + OUTPUT_GRACE);
        let stdout = join_output(stdout, deadline);
        let stderr = join_output(stderr, deadline);
        finish(status, stdout, &stderr, elapsed, memory.and_then(|m| m.peak_mb()))
    }
}

fn finish(
    status: ExitStatus,
    stdout: String,
    stderr: &str,
    elapsed: Duration,
    peak_memory_mb: Option<f64>,
) -> SolverRun {
    if status.success() {
        return SolverRun::Finished {
            stdout,
            elapsed,
            peak_memory_mb,
        };
    }
    let last = stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(str::trim)
        .unwrap_or("no stderr");
    SolverRun::Failed {
        reason: format!("solver exited with {status}: {last}"),
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<String>> {
    let mut pipe = pipe?;
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("gedprune-solver-io".to_string())
        .spawn(move || {
            let mut buf = Vec::new();
            if let Err(e) = pipe.read_to_end(&mut buf) {
                tracing::debug!("Failed to read solver output: {}", e);
            }
            let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
        })
        .map_err(|e| tracing::warn!("Failed to start output reader: {}", e))
        .ok()?;
    Some(rx)
}

fn join_output(output: Option<Receiver<String>>, deadline: Instant) -> String {
    let Some(output) = output else {
        return String::new();
    };
    match output.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(text) => text,
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!("Solver output still open after the solver exited; giving up on it");
            String::new()
        }
        Err(RecvTimeoutError::Disconnected) => String::new(),
    }
}

/// Kills whatever the solver left running in its process group.
///
/// The group id stays reserved while any member is alive, so it cannot
/// name an unrelated group after the child has been reaped.
fn kill_leftovers(child: &Child) {
    #[cfg(unix)]
    {
        let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
            return;
        };
        // SAFETY: plain syscall on the group created for this child; ESRCH
        // just means the group is already empty.
        let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
        if rc == 0 {
            tracing::debug!("Killed processes left behind by solver pid {}", pgid);
        }
    }
    #[cfg(not(unix))]
    {
        let _ = child;
    }
}

/// Kills the child (its whole process group on Unix) and reaps it.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
            let _ = child.kill();
            let _ = child.wait();
            return;
        };
        // SAFETY: plain syscall; a negative pid addresses the process group
        // created for this child.
        let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
        if rc != 0 {
            let _ = child.kill();
        }
    }
    #[cfg(not(unix))]
    {
        let _ = child.kill();
    }
    if let Err(e) = child.wait() {
        tracing::warn!("Failed to reap solver pid {}: {}", child.id(), e);
    }
}

#[cfg(unix)]
fn relax_limits() -> std::io::Result<()> {
    let unlimited = libc::rlimit {
        rlim_cur: libc::RLIM_INFINITY,
        rlim_max: libc::RLIM_INFINITY,
    };
    for resource in [libc::RLIMIT_AS, libc::RLIMIT_CPU] {
        // SAFETY: valid pointers to stack values; failures leave the
        // inherited limit in place.
        unsafe {
            if libc::setrlimit(resource, &unlimited) != 0 {
                let mut current = libc::rlimit {
                    rlim_cur: 0,
                    rlim_max: 0,
                };
                if libc::getrlimit(resource, &mut current) == 0 {
                    current.rlim_cur = current.rlim_max;
                    libc::setrlimit(resource, &current);
                }
            }
        }
    }
    Ok(())
}

/// Tracks the peak resident memory of one process.
struct MemorySampler {
    system: System,
    pid: Pid,
    peak_bytes: u64,
}

impl MemorySampler {
    fn new(pid: u32) -> Self {
        Self {
            system: System::new(),
            pid: Pid::from_u32(pid),
            peak_bytes: 0,
        }
    }

    fn sample(&mut self) {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        if let Some(process) = self.system.process(self.pid) {
            self.peak_bytes = self.peak_bytes.max(process.memory());
        }
    }

    fn peak_mb(&self) -> Option<f64> {
        (self.peak_bytes > 0).then(|| self.peak_bytes as f64 / (1024.0 * 1024.0))
    }
}
