// SPDX-License-Identifier: MIT

//! A thin client for the control socket: connect, send one request, read
//! one response, all bounded by `FLOTILLA_IPC_TIMEOUT_MS`.

use flotilla_daemon::protocol::{self, ProtocolError, Request, Response};
use std::path::Path;
use thiserror::Error;
use tokio::io::BufReader;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no supervisor is running at {0}")]
    NotRunning(std::path::PathBuf),
    #[error("timed out waiting for the supervisor to respond")]
    Timeout,
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

pub async fn send(socket_path: &Path, timeout: std::time::Duration, request: &Request) -> Result<Response, ClientError> {
    let connect = UnixStream::connect(socket_path);
    let mut stream = tokio::time::timeout(timeout, connect)
        .await
        .map_err(|_| ClientError::Timeout)?
        .map_err(|_| ClientError::NotRunning(socket_path.to_path_buf()))?;

    tokio::time::timeout(timeout, protocol::write_request(&mut stream, request))
        .await
        .map_err(|_| ClientError::Timeout)??;

    let (reader, _writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let response = tokio::time::timeout(timeout, protocol::read_response(&mut reader))
        .await
        .map_err(|_| ClientError::Timeout)??;
    Ok(response)
}
