// SPDX-License-Identifier: MIT

//! The AutoScaler: the periodic monitoring/decision loop (spec.md §4.4).

use crate::fleet::Fleet;
use flotilla_core::{Clock, Config, ProcessSpawner, QueueDepthProbe};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The whole scaling rule from spec.md §4.4, factored out as a pure
/// function so it can be table-tested independently of the Fleet/probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Grow,
    Shrink,
    NoOp,
}

pub fn decide(depth: u64, n: u32, config: &Config) -> Decision {
    let depth = depth as f64;
    let n_f = n as f64;
    if depth > n_f * config.scale_up_multiplier && n < config.max_processes {
        Decision::Grow
    } else if depth < n_f * config.scale_down_multiplier && n > config.min_processes {
        Decision::Shrink
    } else {
        Decision::NoOp
    }
}

pub struct AutoScaler<S, C, P> {
    fleet: Arc<Fleet<S, C>>,
    probe: P,
    config: Arc<Config>,
    cancel: CancellationToken,
}

impl<S, C, P> AutoScaler<S, C, P>
where
    S: ProcessSpawner,
    C: Clock,
    P: QueueDepthProbe,
{
    pub fn new(fleet: Arc<Fleet<S, C>>, probe: P, config: Arc<Config>, cancel: CancellationToken) -> Self {
        Self { fleet, probe, config, cancel }
    }

    /// Run the tick loop until cancelled. Each step honors the shutdown
    /// flag before doing any further work (spec.md §4.4's "Cancellation").
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.config.check_interval);
        interval.tick().await; // the first tick fires immediately; consume it
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = interval.tick() => {}
            }
            self.tick().await;
        }
    }

    /// One iteration of the loop, exposed separately so tests can drive
    /// scenarios tick-by-tick without waiting on real timers.
    pub async fn tick(&self) {
        self.fleet.enforce_min();
        if self.cancel.is_cancelled() {
            return;
        }

        let depth = match self.probe.depth(&self.config.queue_name).await {
            Ok(depth) => depth,
            Err(e) => {
                warn!(error = %e, "probe failed this tick, skipping scaling decision");
                return;
            }
        };
        if self.cancel.is_cancelled() {
            return;
        }

        let n = self.fleet.total();
        match decide(depth, n, &self.config) {
            Decision::Grow => {
                let added = self.fleet.grow(1);
                info!(depth, n, added, "scaled up");
            }
            Decision::Shrink => {
                let removed = self.fleet.shrink(1);
                info!(depth, n, removed, "scaled down");
            }
            Decision::NoOp => {
                info!(depth, n, "no scaling action, within the dead-band");
            }
        }
    }
}

#[cfg(test)]
#[path = "autoscaler_tests.rs"]
mod tests;
