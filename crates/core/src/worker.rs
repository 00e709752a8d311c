// SPDX-License-Identifier: MIT

//! Worker process identity, state machine, and the capability traits an
//! adapter implements to spawn and signal a real OS process.

use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

/// OS process identifier. Unique while the process is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a worker, per spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Spawned, `process_startup_delay` has not yet elapsed.
    Starting,
    /// Past the startup delay and still alive.
    Running,
    /// A graceful stop has been requested; exit is pending or overdue.
    Stopping,
    /// Reaped. Terminal — never re-enters any other state.
    Dead,
}

crate::simple_display! {
    WorkerState {
        Starting => "starting",
        Running => "running",
        Stopping => "stopping",
        Dead => "dead",
    }
}

/// How a dead worker's process exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    pub code: Option<i32>,
    pub was_signal: bool,
}

/// Errors signalling a live process can surface.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to signal pid {0}: {1}")]
    SignalFailed(Pid, String),
}

/// Errors the OS can raise launching a worker command.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("worker command not found: {0}")]
    NotFound(String),
    #[error("permission denied spawning worker: {0}")]
    PermissionDenied(String),
    #[error("failed to spawn worker: {0}")]
    Os(String),
}

/// A live OS process backing a [`WorkerHandle`].
///
/// Implemented by `flotilla-adapters` for real children and by a fake for
/// tests. `poll_exit` must never block.
pub trait ProcessHandle: Send {
    fn pid(&self) -> Pid;
    fn stop_graceful(&self) -> Result<(), ProcessError>;
    fn kill_forced(&self) -> Result<(), ProcessError>;
    fn poll_exit(&mut self) -> Option<ExitStatus>;
}

/// Launches the worker command line as a new OS process.
pub trait ProcessSpawner: Send + Sync {
    fn spawn(&self) -> Result<Box<dyn ProcessHandle>, SpawnError>;
}

/// One live (or recently-dead) worker and its process-control capability.
///
/// Owned exclusively by the Fleet from creation to disposal; never `Clone`,
/// never reused after reaping per spec.md §3.
pub struct WorkerHandle {
    handle: Box<dyn ProcessHandle>,
    started_at: Instant,
    state: WorkerState,
    exit_status: Option<ExitStatus>,
}

impl WorkerHandle {
    pub fn new(handle: Box<dyn ProcessHandle>, started_at: Instant) -> Self {
        Self {
            handle,
            started_at,
            state: WorkerState::Starting,
            exit_status: None,
        }
    }

    pub fn pid(&self) -> Pid {
        self.handle.pid()
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    pub fn is_dead(&self) -> bool {
        self.state == WorkerState::Dead
    }

    /// Promote `Starting -> Running` once `process_startup_delay` has
    /// elapsed and the process is still alive. A no-op in any other state.
    pub fn promote_if_ready(&mut self, now: Instant, startup_delay: Duration) {
        if self.state == WorkerState::Starting && now.duration_since(self.started_at) >= startup_delay {
            self.state = WorkerState::Running;
        }
    }

    /// Request a polite exit. Idempotent; a no-op on a `Dead` handle.
    pub fn stop_graceful(&mut self) -> Result<(), ProcessError> {
        if self.state == WorkerState::Dead {
            return Ok(());
        }
        let already_stopping = self.state == WorkerState::Stopping;
        self.state = WorkerState::Stopping;
        if already_stopping {
            return Ok(());
        }
        self.handle.stop_graceful()
    }

    /// Force an unignorable termination. Idempotent.
    pub fn kill_forced(&mut self) -> Result<(), ProcessError> {
        if self.state == WorkerState::Dead {
            return Ok(());
        }
        self.handle.kill_forced()
    }

    /// Non-blocking check for process exit. Transitions to `Dead` and
    /// records [`ExitStatus`] the first time the child is observed gone.
    ///
    /// Returns `true` if this call is the one that reaped the process
    /// (i.e. the caller should log an unexpected death if `state` was not
    /// already `Stopping`).
    pub fn poll_exit(&mut self) -> bool {
        if self.state == WorkerState::Dead {
            return false;
        }
        match self.handle.poll_exit() {
            Some(status) => {
                self.exit_status = Some(status);
                self.state = WorkerState::Dead;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
