// SPDX-License-Identifier: MIT

//! Top-level coordination: wires the Fleet, AutoScaler, and control-surface
//! listener together, and sequences orderly shutdown (spec.md §4.5).

mod signals;

use crate::autoscaler::AutoScaler;
use crate::fleet::Fleet;
use crate::listener::{self, ControlContext};
use flotilla_core::{Clock, Config, ProcessSpawner, QueueDepthProbe};
use parking_lot::Mutex;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use signals::watch_signals;

/// `Initializing -> Running -> Draining -> Stopped`, per spec.md §4.5.
/// `Draining` is entered exactly once; later shutdown requests are logged
/// and ignored (spec.md §9's resolved Open Question — no fast-kill
/// escalation at this level; per-worker escalation happens in
/// [`Fleet::stop_all`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Initializing,
    Running,
    Draining,
    Stopped,
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to acquire the daemon lock at {0}: another supervisor is likely already running")]
    AlreadyRunning(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bind the control socket and take the daemon's advisory lock file, both
/// under `state_dir`. The returned `File` must be kept alive for as long as
/// the lock should be held — dropping it releases the lock.
pub fn bind_control_socket(state_dir: &Path) -> Result<(UnixListener, File), SupervisorError> {
    std::fs::create_dir_all(state_dir)?;

    // Open without truncating before the lock is held: truncating first
    // would wipe another supervisor's pid if the lock attempt below fails.
    let lock_path = state_dir.join("daemon.pid");
    let mut lock_file = std::fs::OpenOptions::new().write(true).create(true).truncate(false).open(&lock_path)?;
    fs2::FileExt::try_lock_exclusive(&lock_file).map_err(|_| SupervisorError::AlreadyRunning(lock_path))?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    let socket_path = state_dir.join("daemon.sock");
    let _ = std::fs::remove_file(&socket_path); // stale socket left by an unclean exit
    let listener = UnixListener::bind(&socket_path)?;
    Ok((listener, lock_file))
}

/// Wires a Fleet, an AutoScaler, and the control-surface listener, and
/// coordinates orderly shutdown between them (spec.md §4.5).
pub struct Supervisor<S, C, P> {
    fleet: Arc<Fleet<S, C>>,
    probe: P,
    autoscaler: Arc<AutoScaler<S, C, P>>,
    config: Arc<Config>,
    cancel: CancellationToken,
    state: Mutex<SupervisorState>,
}

impl<S, C, P> Supervisor<S, C, P>
where
    S: ProcessSpawner + 'static,
    C: Clock + 'static,
    P: QueueDepthProbe + Clone + 'static,
{
    pub fn new(fleet: Arc<Fleet<S, C>>, probe: P, config: Arc<Config>) -> Self {
        let cancel = CancellationToken::new();
        let autoscaler = Arc::new(AutoScaler::new(fleet.clone(), probe.clone(), config.clone(), cancel.clone()));
        Self { fleet, probe, autoscaler, config, cancel, state: Mutex::new(SupervisorState::Initializing) }
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.lock()
    }

    /// The token operator commands and signal handlers cancel to begin
    /// orderly shutdown.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn initiate_shutdown(&self, reason: &str) {
        let mut state = self.state.lock();
        if matches!(*state, SupervisorState::Draining | SupervisorState::Stopped) {
            info!(reason, "shutdown already in progress, ignoring");
            return;
        }
        info!(reason, "initiating orderly shutdown");
        *state = SupervisorState::Draining;
        self.cancel.cancel();
    }

    /// Run until signaled: grow to the initial worker count, serve the
    /// control socket and the AutoScaler loop concurrently, then drain the
    /// fleet once cancellation fires (by signal or a `Stop` command).
    pub async fn run(self: Arc<Self>, listener: UnixListener, initial_count: Option<u32>) {
        let target = self.config.clamp_initial_count(initial_count);
        self.fleet.grow(target);
        *self.state.lock() = SupervisorState::Running;
        info!(target, "supervisor started");

        let ctx = Arc::new(ControlContext {
            fleet: self.fleet.clone(),
            probe: self.probe.clone(),
            config: self.config.clone(),
            shutdown: self.cancel.clone(),
        });

        let signals = tokio::spawn(watch_signals(self.clone()));
        let listener_task = tokio::spawn(listener::run(listener, ctx, self.cancel.clone()));

        self.autoscaler.run().await;
        info!("autoscaler loop stopped, draining the fleet");
        self.fleet.stop_all().await;
        *self.state.lock() = SupervisorState::Stopped;

        listener_task.abort();
        signals.abort();
        info!("supervisor stopped");
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
