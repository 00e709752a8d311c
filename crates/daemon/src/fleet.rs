// SPDX-License-Identifier: MIT

//! The Fleet: atomic mutation of the worker set under concurrent requests
//! from the AutoScaler and the operator control surface (spec.md §4.3).

use flotilla_core::{Clock, Pid, ProcessSpawner, WorkerHandle, WorkerState};
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const REAP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Point-in-time worker counts, as returned by [`Fleet::size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FleetSize {
    pub starting: u32,
    pub running: u32,
    pub total: u32,
}

/// One row of [`Fleet::snapshot`].
#[derive(Debug, Clone, Copy)]
pub struct WorkerSnapshot {
    pub pid: Pid,
    pub state: WorkerState,
    pub started_at: Instant,
}

pub struct Fleet<S, C> {
    spawner: S,
    clock: C,
    min_processes: u32,
    max_processes: u32,
    process_startup_delay: Duration,
    graceful_shutdown_timeout: Duration,
    workers: Mutex<Vec<WorkerHandle>>,
    unexpected_deaths: Mutex<u64>,
}

impl<S: ProcessSpawner, C: Clock> Fleet<S, C> {
    pub fn new(
        spawner: S,
        clock: C,
        min_processes: u32,
        max_processes: u32,
        process_startup_delay: Duration,
        graceful_shutdown_timeout: Duration,
    ) -> Self {
        Self {
            spawner,
            clock,
            min_processes,
            max_processes,
            process_startup_delay,
            graceful_shutdown_timeout,
            workers: Mutex::new(Vec::new()),
            unexpected_deaths: Mutex::new(0),
        }
    }

    /// Total count of unexpected deaths observed since startup, for status
    /// reporting (spec.md §7).
    pub fn unexpected_death_count(&self) -> u64 {
        *self.unexpected_deaths.lock()
    }

    /// Reap exited children and promote `Starting -> Running` workers past
    /// their startup delay. Called at the start of every public operation
    /// (spec.md §4.3's "Reaping").
    fn refresh(&self) {
        let now = self.clock.now();
        let mut workers = self.workers.lock();
        let mut i = 0;
        while i < workers.len() {
            let was_stopping = workers[i].state() == WorkerState::Stopping;
            if workers[i].poll_exit() {
                let pid = workers[i].pid();
                let exit = workers[i].exit_status();
                if was_stopping {
                    info!(pid = pid.0, ?exit, "worker exited after graceful stop");
                } else {
                    *self.unexpected_deaths.lock() += 1;
                    warn!(pid = pid.0, ?exit, "worker died unexpectedly");
                }
                workers.remove(i);
                continue;
            }
            workers[i].promote_if_ready(now, self.process_startup_delay);
            i += 1;
        }
    }

    /// `min_processes ≤ total ≤ max_processes` enforcement run at the start
    /// of every AutoScaler tick and the end of every public Fleet
    /// operation (spec.md §4.3's "Minimum-processes invariant"). The only
    /// unconditional replace-on-death path.
    pub fn enforce_min(&self) {
        self.refresh();
        let deficit = {
            let workers = self.workers.lock();
            self.min_processes.saturating_sub(workers.len() as u32)
        };
        if deficit > 0 {
            let added = self.grow_raw(deficit);
            if added < deficit {
                warn!(deficit, added, "could not fully restore min_processes");
            }
        }
    }

    fn spawn_one(&self) -> Result<WorkerHandle, flotilla_core::SpawnError> {
        let handle = self.spawner.spawn()?;
        Ok(WorkerHandle::new(handle, self.clock.now()))
    }

    /// Spawn loop with no trailing min-enforcement; the shared primitive
    /// behind [`Fleet::grow`] and [`Fleet::enforce_min`].
    ///
    /// Per spec.md §5, the fleet lock is never held across the spawn
    /// syscall: each worker is spawned unlocked, then the lock is taken
    /// only to commit it into the set (re-checking `max_processes`, since
    /// a concurrent grow could have filled the fleet in the meantime).
    fn grow_raw(&self, k: u32) -> u32 {
        let mut added = 0;
        for _ in 0..k {
            {
                let workers = self.workers.lock();
                if workers.len() as u32 >= self.max_processes {
                    break;
                }
            }
            match self.spawn_one() {
                Ok(mut handle) => {
                    let mut workers = self.workers.lock();
                    if workers.len() as u32 >= self.max_processes {
                        // Lost the race against a concurrent grow; this
                        // worker must not exist.
                        let _ = handle.kill_forced();
                        break;
                    }
                    info!(pid = handle.pid().0, "spawned worker");
                    workers.push(handle);
                    added += 1;
                }
                Err(e) => {
                    warn!(error = %e, "spawn failed, aborting remaining grows this call");
                    break;
                }
            }
        }
        added
    }

    /// Attempt to spawn `k` new workers, clamped to `max_processes`.
    /// Returns the number actually added — less than `k` (including zero)
    /// is a normal result, not an error (spec.md §4.3).
    pub fn grow(&self, k: u32) -> u32 {
        self.refresh();
        let added = self.grow_raw(k);
        self.enforce_min();
        added
    }

    /// Request graceful stop of up to `k` oldest `Running` workers (ties
    /// broken by lower pid), clamped so `total - k >= min_processes`.
    /// `Starting` workers are never eligible (spec.md §4.3).
    pub fn shrink(&self, k: u32) -> u32 {
        self.refresh();
        let removed = {
            let mut workers = self.workers.lock();
            let total = workers.len() as u32;
            let budget = k.min(total.saturating_sub(self.min_processes));

            let mut candidates: Vec<usize> = workers
                .iter()
                .enumerate()
                .filter(|(_, w)| w.state() == WorkerState::Running)
                .map(|(i, _)| i)
                .collect();
            candidates.sort_by_key(|&i| (workers[i].started_at(), workers[i].pid()));
            candidates.truncate(budget as usize);

            let mut removed = 0;
            for i in candidates {
                if workers[i].stop_graceful().is_ok() {
                    info!(pid = workers[i].pid().0, "requested graceful stop");
                    removed += 1;
                }
            }
            removed
        };
        self.enforce_min();
        removed
    }

    /// Graceful-stop every live worker, wait up to
    /// `graceful_shutdown_timeout`, then force-kill survivors. Blocks
    /// until every handle is `Dead` (spec.md §4.3).
    pub async fn stop_all(&self) {
        self.refresh();
        {
            let mut workers = self.workers.lock();
            for w in workers.iter_mut() {
                let _ = w.stop_graceful();
            }
        }

        let deadline = tokio::time::Instant::now() + self.graceful_shutdown_timeout;
        loop {
            self.refresh();
            if self.workers.lock().is_empty() {
                return;
            }
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(REAP_POLL_INTERVAL.min(self.graceful_shutdown_timeout)).await;
        }

        let mut workers = self.workers.lock();
        for w in workers.iter_mut() {
            if w.state() != WorkerState::Dead {
                warn!(pid = w.pid().0, "graceful shutdown window elapsed, force-killing");
                let _ = w.kill_forced();
            }
        }
        drop(workers);

        loop {
            self.refresh();
            if self.workers.lock().is_empty() {
                return;
            }
            tokio::time::sleep(REAP_POLL_INTERVAL).await;
        }
    }

    /// Observational worker counts, reflecting reaped state as of the call.
    pub fn size(&self) -> FleetSize {
        self.refresh();
        let workers = self.workers.lock();
        let starting = workers.iter().filter(|w| w.state() == WorkerState::Starting).count() as u32;
        let running = workers.iter().filter(|w| w.state() == WorkerState::Running).count() as u32;
        FleetSize { starting, running, total: workers.len() as u32 }
    }

    /// Total live (non-dead) worker count — what the AutoScaler's policy
    /// calls `n`. `Starting` workers count (spec.md §9's resolved Open
    /// Question).
    pub fn total(&self) -> u32 {
        self.size().total
    }

    /// Consistent report for the `status` control command (spec.md §6).
    pub fn snapshot(&self) -> Vec<WorkerSnapshot> {
        self.refresh();
        self.workers
            .lock()
            .iter()
            .map(|w| WorkerSnapshot { pid: w.pid(), state: w.state(), started_at: w.started_at() })
            .collect()
    }
}

#[cfg(test)]
#[path = "fleet_tests.rs"]
mod tests;
