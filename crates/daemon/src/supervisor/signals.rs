// SPDX-License-Identifier: MIT

//! SIGTERM/SIGINT handling: both signals initiate the same orderly
//! shutdown sequence (spec.md §4.5).

use super::Supervisor;
use flotilla_core::{Clock, ProcessSpawner, QueueDepthProbe};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

/// Wait for SIGTERM or SIGINT and call [`Supervisor::initiate_shutdown`].
/// Returns once the supervisor's shutdown token is cancelled by any means,
/// so the task can be awaited rather than only aborted.
pub async fn watch_signals<S, C, P>(supervisor: Arc<Supervisor<S, C, P>>)
where
    S: ProcessSpawner + 'static,
    C: Clock + 'static,
    P: QueueDepthProbe + Clone + 'static,
{
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to install SIGTERM handler");
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to install SIGINT handler");
            return;
        }
    };
    let cancel = supervisor.shutdown_token();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = sigterm.recv() => {
                info!("received SIGTERM");
                supervisor.initiate_shutdown("SIGTERM");
            }
            _ = sigint.recv() => {
                info!("received SIGINT");
                supervisor.initiate_shutdown("SIGINT");
            }
        }
    }
}
