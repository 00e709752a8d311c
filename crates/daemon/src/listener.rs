// SPDX-License-Identifier: MIT

//! Accepts control-surface connections and dispatches them against the
//! Fleet. Connections are handled one at a time to completion, matching
//! spec.md §5's "one command handler ... services operator requests
//! serially".

use crate::fleet::Fleet;
use crate::protocol::{self, Request, Response, StatusReport, WorkerStatus};
use flotilla_core::{Clock, Config, ProcessSpawner, QueueDepthProbe};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Shared state every control-surface request handler needs.
pub struct ControlContext<S, C, P> {
    pub fleet: Arc<Fleet<S, C>>,
    pub probe: P,
    pub config: Arc<Config>,
    /// Cancelled by a `Stop` request; the Supervisor awaits this to begin
    /// draining the fleet.
    pub shutdown: CancellationToken,
}

pub async fn run<S, C, P>(listener: UnixListener, ctx: Arc<ControlContext<S, C, P>>, cancel: CancellationToken)
where
    S: ProcessSpawner,
    C: Clock,
    P: QueueDepthProbe,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _addr)) => {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            warn!(error = %e, "control connection error");
                        }
                    }
                    Err(e) => warn!(error = %e, "failed to accept a control connection"),
                }
            }
        }
    }
}

async fn handle_connection<S, C, P>(
    stream: UnixStream,
    ctx: &ControlContext<S, C, P>,
) -> Result<(), protocol::ProtocolError>
where
    S: ProcessSpawner,
    C: Clock,
    P: QueueDepthProbe,
{
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let request = protocol::read_request(&mut reader).await?;
    let response = dispatch(ctx, request).await;
    protocol::write_response(&mut writer, &response).await
}

async fn dispatch<S, C, P>(ctx: &ControlContext<S, C, P>, request: Request) -> Response
where
    S: ProcessSpawner,
    C: Clock,
    P: QueueDepthProbe,
{
    match request {
        Request::Status => status_report(ctx).await,
        Request::ScaleUp { k } if k >= 1 => Response::Scaled { actual: ctx.fleet.grow(k) },
        Request::ScaleDown { k } if k >= 1 => Response::Scaled { actual: ctx.fleet.shrink(k) },
        Request::ScaleUp { .. } | Request::ScaleDown { .. } => {
            Response::Error { message: "k must be >= 1".into() }
        }
        Request::Stop => {
            ctx.shutdown.cancel();
            Response::Ok
        }
    }
}

async fn status_report<S, C, P>(ctx: &ControlContext<S, C, P>) -> Response
where
    S: ProcessSpawner,
    C: Clock,
    P: QueueDepthProbe,
{
    let depth = ctx.probe.depth(&ctx.config.queue_name).await.ok();
    let size = ctx.fleet.size();
    let workers = ctx
        .fleet
        .snapshot()
        .into_iter()
        .map(|w| WorkerStatus {
            pid: w.pid.0,
            state: w.state.to_string(),
            uptime_ms: w.started_at.elapsed().as_millis() as u64,
        })
        .collect();
    Response::Status(StatusReport {
        depth,
        fleet_total: size.total,
        fleet_running: size.running,
        fleet_starting: size.starting,
        min_processes: ctx.config.min_processes,
        max_processes: ctx.config.max_processes,
        scale_up_threshold: ctx.config.scale_up_multiplier,
        scale_down_threshold: ctx.config.scale_down_multiplier,
        unexpected_deaths: ctx.fleet.unexpected_death_count(),
        workers,
    })
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
