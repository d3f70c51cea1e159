// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket server implementation.
//!
//! Each connection is served by its own task. Frames from one client are
//! handled in arrival order, and every request gets exactly one response
//! carrying the request's id.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info};

use cb_core::protocol::{ClientMessage, ServerMessage};

use crate::state::ServerState;

/// Run the WebSocket server on the given address.
pub async fn run(addr: SocketAddr, state: ServerState) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on: {}", addr);

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: ServerState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    info!("New WebSocket connection from: {}", peer_addr);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    loop {
        match ws_stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let response = match handle_client_message(&text, &state).await {
                    Ok(response) => response,
                    Err(e) => {
                        debug!("Malformed frame from {}: {}", peer_addr, e);
                        ServerMessage::error(format!("malformed message: {e}"))
                    }
                };
                let json = response.to_json()?;
                ws_sink.send(Message::Text(json.into())).await?;
            }
            Some(Ok(Message::Close(_))) => {
                info!("Client {} disconnected", peer_addr);
                break;
            }
            Some(Ok(Message::Ping(data))) => {
                ws_sink.send(Message::Pong(data)).await?;
            }
            Some(Ok(_)) => {
                // Ignore other message types (Binary, Pong, Frame)
            }
            Some(Err(e)) => {
                error!("WebSocket error from {}: {}", peer_addr, e);
                break;
            }
            None => {
                info!("Client {} stream ended", peer_addr);
                break;
            }
        }
    }

    info!("Connection closed: {}", peer_addr);
    Ok(())
}

/// Process a client message and return the response for it.
///
/// Only an unparseable frame is an error; a refused request is answered
/// with an error outcome.
async fn handle_client_message(
    text: &str,
    state: &ServerState,
) -> Result<ServerMessage, serde_json::Error> {
    let msg = ClientMessage::from_json(text)?;

    match msg {
        ClientMessage::Request { id, request } => {
            debug!(id, op = request.name(), "request received");
            let outcome = state.execute(request).await;
            Ok(ServerMessage::response(id, outcome))
        }

        ClientMessage::Ping { id } => {
            debug!("Ping received: {}", id);
            Ok(ServerMessage::pong(id))
        }
    }
}
