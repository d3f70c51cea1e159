// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! [`BoardSyncClient`] over a [`Transport`].
//!
//! ```text
//! ┌──────────────┐  Command   ┌──────────────┐  ClientMessage  ┌──────────┐
//! │ RemoteClient │───mpsc────►│  connection  │────────────────►│  server  │
//! │   (handle)   │◄─oneshot───│     task     │◄────────────────│          │
//! └──────────────┘            └──────────────┘  ServerMessage  └──────────┘
//! ```
//!
//! The connection task owns the transport. It tags each request with a fresh
//! id and keeps the caller's reply channel in a pending map until the
//! response with that id arrives. Requests are never serialized behind each
//! other, so any number of them can be in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use cb_core::protocol::{BoardReply, BoardRequest, ClientMessage, ServerMessage};

use crate::client::{outcome_to_result, BoardSyncClient, BoxFuture, SyncError, SyncResult};
use crate::config::SyncConfig;
use crate::transport::{Transport, WebSocketTransport};

struct Command {
    request: BoardRequest,
    reply: oneshot::Sender<SyncResult<BoardReply>>,
}

/// Handle to a connection with the board server.
///
/// Dropping the last handle closes the connection.
#[derive(Debug)]
pub struct RemoteClient {
    commands: mpsc::UnboundedSender<Command>,
    timeout: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
}

impl RemoteClient {
    /// Connects to `config.url` over WebSocket.
    pub async fn connect(config: &SyncConfig) -> SyncResult<Self> {
        Self::connect_with(WebSocketTransport::new(), config).await
    }

    /// Connects using a custom transport.
    pub async fn connect_with<T>(mut transport: T, config: &SyncConfig) -> SyncResult<Self>
    where
        T: Transport + 'static,
    {
        connect_with_retry(&mut transport, config).await?;

        let (commands, rx) = mpsc::unbounded_channel();
        let in_flight = Arc::new(AtomicUsize::new(0));
        tokio::spawn(run_connection(transport, rx, Arc::clone(&in_flight)));
        Ok(RemoteClient {
            commands,
            timeout: config.request_timeout(),
            in_flight,
        })
    }

    /// True until the connection task has stopped.
    pub fn is_connected(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Requests the connection task is still waiting on.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }
}

impl BoardSyncClient for RemoteClient {
    fn execute(&self, request: BoardRequest) -> BoxFuture<'_, SyncResult<BoardReply>> {
        Box::pin(async move {
            let op = request.name();
            let (reply, response) = oneshot::channel();
            self.commands
                .send(Command { request, reply })
                .map_err(|_| SyncError::NotConnected)?;

            let response = match self.timeout {
                Some(limit) => tokio::time::timeout(limit, response).await.map_err(|_| {
                    warn!(op, "request timed out");
                    SyncError::Timeout
                })?,
                None => response.await,
            };
            // The connection task dropped our reply channel.
            response.map_err(|_| SyncError::Disconnected)?
        })
    }
}

/// Connect with exponential backoff retry.
async fn connect_with_retry<T: Transport>(transport: &mut T, config: &SyncConfig) -> SyncResult<()> {
    let mut attempt = 0;
    let mut delay = Duration::from_millis(config.initial_delay_ms);

    loop {
        attempt += 1;
        match transport.connect(&config.url).await {
            Ok(()) => {
                info!(url = %config.url, attempt, "connected to board server");
                return Ok(());
            }
            Err(e) if attempt >= config.max_retries => {
                warn!(url = %config.url, attempt, error = %e, "giving up on board server");
                return Err(SyncError::MaxRetriesExceeded);
            }
            Err(e) => {
                debug!(attempt, error = %e, delay_ms = delay.as_millis() as u64, "connect failed, retrying");
                tokio::time::sleep(delay).await;
                delay = config.next_delay(delay);
            }
        }
    }
}

/// Pumps requests out and routes responses back until either side closes.
async fn run_connection<T: Transport>(
    mut transport: T,
    mut commands: mpsc::UnboundedReceiver<Command>,
    in_flight: Arc<AtomicUsize>,
) {
    let mut pending: HashMap<u64, oneshot::Sender<SyncResult<BoardReply>>> = HashMap::new();
    let mut next_id: u64 = 1;

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(Command { request, reply }) = command else {
                    debug!("all client handles dropped");
                    break;
                };
                let id = next_id;
                next_id += 1;
                debug!(id, op = request.name(), "sending request");

                // Callers that timed out never get an answer; forget them.
                pending.retain(|_, waiting| !waiting.is_closed());

                match transport.send(ClientMessage::request(id, request)).await {
                    Ok(()) => {
                        pending.insert(id, reply);
                    }
                    Err(e) => {
                        let connected = transport.is_connected();
                        let _ = reply.send(Err(e.into()));
                        if !connected {
                            break;
                        }
                    }
                }
            }

            incoming = transport.recv() => {
                match incoming {
                    Ok(Some(ServerMessage::Response { id, outcome })) => {
                        match pending.remove(&id) {
                            // The caller may have timed out and gone away.
                            Some(reply) => { let _ = reply.send(outcome_to_result(outcome)); }
                            None => debug!(id, "response for unknown request"),
                        }
                    }
                    Ok(Some(ServerMessage::Pong { id })) => debug!(id, "pong"),
                    Ok(Some(ServerMessage::Error { message })) => {
                        warn!(%message, "server reported an error");
                    }
                    Ok(None) => {
                        info!("connection closed by server");
                        break;
                    }
                    Err(e) if transport.is_connected() => {
                        warn!(error = %e, "dropping unreadable message");
                    }
                    Err(e) => {
                        warn!(error = %e, "connection lost");
                        break;
                    }
                }
            }
        }
        in_flight.store(pending.len(), Ordering::Relaxed);
    }

    if !pending.is_empty() {
        debug!(count = pending.len(), "failing in-flight requests");
    }
    for (_, reply) in pending.drain() {
        let _ = reply.send(Err(SyncError::Disconnected));
    }
    in_flight.store(0, Ordering::Relaxed);
    let _ = transport.disconnect().await;
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
