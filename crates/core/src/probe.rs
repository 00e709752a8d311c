// SPDX-License-Identifier: MIT

//! The queue-depth capability the AutoScaler polls each tick.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failure modes for a single depth observation, per spec.md §4.1.
///
/// A probe failure is never fatal — the AutoScaler treats it as "skip this
/// tick" (spec.md §4.1, the probe-failure law in spec.md §8).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("broker unreachable")]
    Unreachable,
    #[error("broker probe timed out")]
    Timeout,
    #[error("malformed response from broker")]
    MalformedResponse,
}

/// Observes the length of a named queue on the broker.
///
/// Any implementation satisfying this contract is acceptable; this is the
/// "capability" dependency-inversion point called out in spec.md §9 so
/// tests can use a deterministic in-memory implementation instead of a
/// real broker.
#[async_trait]
pub trait QueueDepthProbe: Send + Sync {
    async fn depth(&self, queue_name: &str) -> Result<u64, ProbeError>;
}

/// Lets a single probe instance be shared between the AutoScaler and the
/// control-surface listener's `status` handler.
#[async_trait]
impl<T: QueueDepthProbe + ?Sized> QueueDepthProbe for Arc<T> {
    async fn depth(&self, queue_name: &str) -> Result<u64, ProbeError> {
        (**self).depth(queue_name).await
    }
}
