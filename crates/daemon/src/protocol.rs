// SPDX-License-Identifier: MIT

//! The control-surface wire protocol between the `flotilla` CLI and the
//! running Supervisor (spec.md §6, "Control surface").
//!
//! Wire format: one JSON value per line over the Unix domain socket.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command")]
pub enum Request {
    Status,
    ScaleUp { k: u32 },
    ScaleDown { k: u32 },
    Stop,
}

/// One row of a [`StatusReport`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerStatus {
    pub pid: u32,
    pub state: String,
    pub uptime_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusReport {
    pub depth: Option<u64>,
    pub fleet_total: u32,
    pub fleet_running: u32,
    pub fleet_starting: u32,
    pub min_processes: u32,
    pub max_processes: u32,
    pub scale_up_threshold: f64,
    pub scale_down_threshold: f64,
    pub unexpected_deaths: u64,
    pub workers: Vec<WorkerStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "result")]
pub enum Response {
    Status(StatusReport),
    Scaled { actual: u32 },
    Ok,
    Error { message: String },
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("connection closed before a message was received")]
    Eof,
}

/// Read one newline-terminated JSON `Request` from `reader`.
pub async fn read_request<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Request, ProtocolError> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Err(ProtocolError::Eof);
    }
    Ok(serde_json::from_str(line.trim_end())?)
}

/// Write `response` to `writer` as one newline-terminated JSON value.
pub async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Response) -> Result<(), ProtocolError> {
    let mut payload = serde_json::to_string(response)?;
    payload.push('\n');
    writer.write_all(payload.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Write `request` to `writer` as one newline-terminated JSON value.
pub async fn write_request<W: AsyncWrite + Unpin>(writer: &mut W, request: &Request) -> Result<(), ProtocolError> {
    let mut payload = serde_json::to_string(request)?;
    payload.push('\n');
    writer.write_all(payload.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one newline-terminated JSON `Response` from `reader`.
pub async fn read_response<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Response, ProtocolError> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Err(ProtocolError::Eof);
    }
    Ok(serde_json::from_str(line.trim_end())?)
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
