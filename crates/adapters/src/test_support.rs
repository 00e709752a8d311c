// SPDX-License-Identifier: MIT

//! Deterministic fakes for `flotilla-daemon`'s Fleet/AutoScaler tests.
//!
//! Gated behind the `test-support` feature, mirroring the teacher's
//! `FakeClock`/fake-adapter pattern: no real OS process or broker
//! connection is touched, so scenario tests in spec.md §8 run instantly
//! and deterministically.

use async_trait::async_trait;
use flotilla_core::{ExitStatus, Pid, ProbeError, ProcessError, ProcessHandle, ProcessSpawner, QueueDepthProbe, SpawnError};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Shared state for one fake process, independently controllable by a test
/// after it has been spawned.
#[derive(Default)]
struct FakeProcessState {
    stop_calls: u32,
    kill_calls: u32,
    exit: Option<ExitStatus>,
}

/// A [`ProcessHandle`] backed by an in-memory state cell instead of a real
/// child process.
pub struct FakeProcessHandle {
    pid: Pid,
    state: Arc<Mutex<FakeProcessState>>,
}

impl ProcessHandle for FakeProcessHandle {
    fn pid(&self) -> Pid {
        self.pid
    }

    fn stop_graceful(&self) -> Result<(), ProcessError> {
        self.state.lock().stop_calls += 1;
        Ok(())
    }

    fn kill_forced(&self) -> Result<(), ProcessError> {
        let mut state = self.state.lock();
        state.kill_calls += 1;
        // SIGKILL can't be ignored; the fake models the process as dying
        // immediately unless it had already exited on its own.
        state.exit.get_or_insert(ExitStatus { code: None, was_signal: true });
        Ok(())
    }

    fn poll_exit(&mut self) -> Option<ExitStatus> {
        self.state.lock().exit.take()
    }
}

/// Spawns [`FakeProcessHandle`]s with sequential pids, optionally failing
/// the next N spawns to simulate `SpawnError` (spec.md §4.2/§7).
pub struct FakeSpawner {
    next_pid: AtomicU32,
    fail_next: Mutex<u32>,
    processes: Mutex<HashMap<Pid, Arc<Mutex<FakeProcessState>>>>,
    spawn_count: AtomicU32,
}

impl FakeSpawner {
    pub fn new() -> Self {
        Self {
            next_pid: AtomicU32::new(1),
            fail_next: Mutex::new(0),
            processes: Mutex::new(HashMap::new()),
            spawn_count: AtomicU32::new(0),
        }
    }

    /// The next `n` calls to `spawn` will fail with `SpawnError::Os`.
    pub fn fail_next_spawns(&self, n: u32) {
        *self.fail_next.lock() = n;
    }

    pub fn spawn_count(&self) -> u32 {
        self.spawn_count.load(Ordering::SeqCst)
    }

    /// Simulate the OS reaping `pid` (an unexpected death if the test
    /// hasn't also called a graceful stop on it).
    pub fn exit(&self, pid: Pid, status: ExitStatus) {
        if let Some(state) = self.processes.lock().get(&pid) {
            state.lock().exit = Some(status);
        }
    }

    pub fn stop_calls(&self, pid: Pid) -> u32 {
        self.processes.lock().get(&pid).map(|s| s.lock().stop_calls).unwrap_or(0)
    }

    pub fn kill_calls(&self, pid: Pid) -> u32 {
        self.processes.lock().get(&pid).map(|s| s.lock().kill_calls).unwrap_or(0)
    }
}

impl Default for FakeSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSpawner for FakeSpawner {
    fn spawn(&self) -> Result<Box<dyn ProcessHandle>, SpawnError> {
        let mut fail_next = self.fail_next.lock();
        if *fail_next > 0 {
            *fail_next -= 1;
            return Err(SpawnError::Os("fake spawn failure".into()));
        }
        drop(fail_next);

        self.spawn_count.fetch_add(1, Ordering::SeqCst);
        let pid = Pid(self.next_pid.fetch_add(1, Ordering::SeqCst));
        let state = Arc::new(Mutex::new(FakeProcessState::default()));
        self.processes.lock().insert(pid, state.clone());
        Ok(Box::new(FakeProcessHandle { pid, state }))
    }
}

/// Lets a test hold an `Arc<FakeSpawner>` for out-of-band control (`exit`,
/// `kill_calls`, ...) while also handing a clone to a `Fleet` as its
/// `ProcessSpawner`.
impl ProcessSpawner for Arc<FakeSpawner> {
    fn spawn(&self) -> Result<Box<dyn ProcessHandle>, SpawnError> {
        (**self).spawn()
    }
}

/// A scripted sequence of depth observations, consumed one per call to
/// `depth`. Exhausting the sequence repeats the last value, matching how
/// scenario tables in spec.md §8 describe a tail of steady-state ticks.
pub struct FakeProbe {
    responses: Mutex<VecDeque<Result<u64, ProbeError>>>,
    last: Mutex<Result<u64, ProbeError>>,
    calls: AtomicU32,
}

impl FakeProbe {
    pub fn new(depths: impl IntoIterator<Item = u64>) -> Self {
        Self::from_results(depths.into_iter().map(Ok))
    }

    pub fn from_results(results: impl IntoIterator<Item = Result<u64, ProbeError>>) -> Self {
        let responses: VecDeque<_> = results.into_iter().collect();
        Self {
            last: Mutex::new(responses.back().cloned().unwrap_or(Ok(0))),
            responses: Mutex::new(responses),
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueueDepthProbe for FakeProbe {
    async fn depth(&self, _queue_name: &str) -> Result<u64, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock();
        let result = responses.pop_front().unwrap_or_else(|| self.last.lock().clone());
        *self.last.lock() = result.clone();
        result
    }
}
