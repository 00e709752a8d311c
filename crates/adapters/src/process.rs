// SPDX-License-Identifier: MIT

//! Real OS process spawning and signalling (spec.md §4.2).

use flotilla_core::{ExitStatus, Pid, ProcessError, ProcessHandle, ProcessSpawner, SpawnError, WorkerCommand};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid as NixPid;
use std::io;
use std::process::{Child, Command, Stdio};
use tracing::debug;

/// Spawns the worker command line as a new child process.
///
/// The worker program is opaque (spec.md §1): stdio is inherited rather
/// than piped, since the supervisor never reads or writes worker output.
pub struct OsProcessSpawner {
    command: WorkerCommand,
}

impl OsProcessSpawner {
    pub fn new(command: WorkerCommand) -> Self {
        Self { command }
    }
}

impl ProcessSpawner for OsProcessSpawner {
    fn spawn(&self) -> Result<Box<dyn ProcessHandle>, SpawnError> {
        let child = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| classify_spawn_error(&self.command, e))?;
        let pid = Pid(child.id());
        debug!(pid = pid.0, "spawned worker process");
        Ok(Box::new(OsProcessHandle { pid, child }))
    }
}

fn classify_spawn_error(command: &WorkerCommand, err: io::Error) -> SpawnError {
    match err.kind() {
        io::ErrorKind::NotFound => SpawnError::NotFound(command.program.display().to_string()),
        io::ErrorKind::PermissionDenied => {
            SpawnError::PermissionDenied(command.program.display().to_string())
        }
        _ => SpawnError::Os(err.to_string()),
    }
}

/// A live child process, signalled by pid via `nix`.
pub struct OsProcessHandle {
    pid: Pid,
    child: Child,
}

impl ProcessHandle for OsProcessHandle {
    fn pid(&self) -> Pid {
        self.pid
    }

    fn stop_graceful(&self) -> Result<(), ProcessError> {
        send_signal(self.pid, Signal::SIGTERM)
    }

    fn kill_forced(&self) -> Result<(), ProcessError> {
        send_signal(self.pid, Signal::SIGKILL)
    }

    fn poll_exit(&mut self) -> Option<ExitStatus> {
        match self.child.try_wait() {
            Ok(Some(status)) => Some(ExitStatus {
                code: status.code(),
                was_signal: status.code().is_none(),
            }),
            Ok(None) => None,
            // An error here almost always means the child was already
            // reaped by something else; treat it as "gone".
            Err(_) => Some(ExitStatus { code: None, was_signal: false }),
        }
    }
}

/// Deliver `sig` to `pid`. A process that has already exited (`ESRCH`) is
/// not an error — signal delivery is inherently idempotent at the OS level
/// (spec.md §8's idempotence law).
fn send_signal(pid: Pid, sig: Signal) -> Result<(), ProcessError> {
    match signal::kill(NixPid::from_raw(pid.0 as i32), sig) {
        Ok(()) => Ok(()),
        Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(e) => Err(ProcessError::SignalFailed(pid, e.to_string())),
    }
}
