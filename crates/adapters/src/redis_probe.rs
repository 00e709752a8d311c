// SPDX-License-Identifier: MIT

//! Redis-backed [`QueueDepthProbe`] (spec.md §4.1).

use async_trait::async_trait;
use flotilla_core::{BrokerConfig, ProbeError, QueueDepthProbe};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::warn;

/// Probes a Redis list's length via `LLEN`.
///
/// The connection manager is created once and reused across ticks
/// (spec.md §4.1: "pooled/reused"); a transient failure is retried once
/// within the tick after a short fixed backoff before surfacing.
pub struct RedisProbe {
    client: redis::Client,
    manager: Mutex<Option<ConnectionManager>>,
    timeout: Duration,
}

const RETRY_BACKOFF: Duration = Duration::from_millis(100);

impl RedisProbe {
    pub fn new(broker: &BrokerConfig, timeout: Duration) -> Result<Self, ProbeError> {
        let client = redis::Client::open(connection_url(broker)).map_err(|_| ProbeError::Unreachable)?;
        Ok(Self { client, manager: Mutex::new(None), timeout })
    }

    async fn connection(&self) -> Result<ConnectionManager, ProbeError> {
        let mut guard = self.manager.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self
            .client
            .get_connection_manager()
            .await
            .map_err(|_| ProbeError::Unreachable)?;
        *guard = Some(conn.clone());
        Ok(conn)
    }

    /// Drop the cached connection so the next attempt reconnects from
    /// scratch, rather than retrying against a connection we know is bad.
    async fn discard_connection(&self) {
        *self.manager.lock().await = None;
    }

    async fn attempt(&self, queue_name: &str) -> Result<u64, ProbeError> {
        let mut conn = self.connection().await?;
        match tokio::time::timeout(self.timeout, conn.llen::<_, u64>(queue_name)).await {
            Ok(Ok(len)) => Ok(len),
            Ok(Err(e)) if e.is_io_error() => {
                self.discard_connection().await;
                Err(ProbeError::Unreachable)
            }
            Ok(Err(_)) => Err(ProbeError::MalformedResponse),
            Err(_elapsed) => Err(ProbeError::Timeout),
        }
    }
}

#[async_trait]
impl QueueDepthProbe for RedisProbe {
    async fn depth(&self, queue_name: &str) -> Result<u64, ProbeError> {
        match self.attempt(queue_name).await {
            Ok(len) => Ok(len),
            Err(ProbeError::Timeout) => Err(ProbeError::Timeout),
            Err(first_err) => {
                warn!(queue = queue_name, error = %first_err, "probe failed, retrying once");
                tokio::time::sleep(RETRY_BACKOFF).await;
                self.attempt(queue_name).await
            }
        }
    }
}

fn connection_url(broker: &BrokerConfig) -> String {
    match &broker.password {
        Some(password) => format!("redis://:{}@{}:{}/{}", password, broker.host, broker.port, broker.db),
        None => format!("redis://{}:{}/{}", broker.host, broker.port, broker.db),
    }
}

#[cfg(test)]
#[path = "redis_probe_tests.rs"]
mod tests;
