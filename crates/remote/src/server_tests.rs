// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Test server utilities and in-process server tests.
//!
//! Provides a TestServer that runs on a random port and exposes its state
//! for verification.

#![cfg(test)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::server;
use crate::state::ServerState;

/// A test server that runs on a random port and can be controlled.
pub struct TestServer {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    state: ServerState,
    /// Keep the temp directory alive for the lifetime of the test server.
    _temp_dir: tempfile::TempDir,
}

impl TestServer {
    /// Start a new test server on a random available port.
    pub async fn start() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = ServerState::new(temp_dir.path()).unwrap();

        // Bind to port 0 to get a random available port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let state_clone = state.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = accept_loop(listener, state_clone) => {
                    if let Err(e) = result {
                        eprintln!("Test server error: {}", e);
                    }
                }
                _ = shutdown_rx => {
                    // Shutdown requested
                }
            }
        });

        TestServer {
            addr,
            shutdown_tx,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get the WebSocket URL for connecting to this server.
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Get access to the server state for verification.
    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Shutdown the test server.
    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Accept loop that uses the actual server::handle_connection.
async fn accept_loop(
    listener: TcpListener,
    state: ServerState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            let _ = server::handle_connection(stream, peer_addr, state).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream::{SplitSink, SplitStream};
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpStream;
    use tokio::time::{timeout, Duration};
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    use cb_core::protocol::{
        BoardReply, BoardRequest, ClientMessage, ErrorKind, Outcome, ServerMessage,
    };
    use cb_core::{Board, NewCard};
    use cb_sync::{BoardSyncClient, RemoteClient, SyncConfig, SyncError};

    type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

    /// Raw protocol connection for exercising the wire format directly.
    struct RawClient {
        sink: SplitSink<Ws, Message>,
        stream: SplitStream<Ws>,
    }

    impl RawClient {
        async fn connect(server: &TestServer) -> Self {
            let (ws, _) = connect_async(&server.ws_url()).await.unwrap();
            let (sink, stream) = ws.split();
            RawClient { sink, stream }
        }

        async fn send_text(&mut self, text: String) {
            self.sink.send(Message::Text(text.into())).await.unwrap();
        }

        async fn send(&mut self, msg: ClientMessage) {
            self.send_text(msg.to_json().unwrap()).await;
        }

        async fn recv(&mut self) -> ServerMessage {
            match timeout(Duration::from_secs(5), self.stream.next()).await {
                Ok(Some(Ok(Message::Text(text)))) => ServerMessage::from_json(&text).unwrap(),
                Ok(other) => panic!("Expected text frame, got {:?}", other),
                Err(_) => panic!("Timeout waiting for server message"),
            }
        }
    }

    async fn remote_client(server: &TestServer) -> RemoteClient {
        RemoteClient::connect(&SyncConfig::for_url(server.ws_url()))
            .await
            .unwrap()
    }

    async fn seeded_board(server: &TestServer) -> Board {
        server.state().create_board("Roadmap").await.unwrap()
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let server = TestServer::start().await;
        let mut client = RawClient::connect(&server).await;

        client.send(ClientMessage::ping(42)).await;

        assert!(matches!(client.recv().await, ServerMessage::Pong { id: 42 }));
        server.shutdown();
    }

    #[tokio::test]
    async fn test_response_carries_request_id() {
        let server = TestServer::start().await;
        let board = seeded_board(&server).await;
        let mut client = RawClient::connect(&server).await;

        client
            .send(ClientMessage::request(
                7,
                BoardRequest::FetchBoard {
                    board_id: board.id.clone(),
                },
            ))
            .await;

        match client.recv().await {
            ServerMessage::Response {
                id: 7,
                outcome: Outcome::Ok {
                    reply: BoardReply::Board(fetched),
                },
            } => assert_eq!(fetched.title, "Roadmap"),
            other => panic!("Expected board response, got {:?}", other),
        }
        server.shutdown();
    }

    #[tokio::test]
    async fn test_refused_request_gets_error_outcome() {
        let server = TestServer::start().await;
        let mut client = RawClient::connect(&server).await;

        client
            .send(ClientMessage::request(
                1,
                BoardRequest::DeleteCard {
                    card_id: "card-missing".into(),
                },
            ))
            .await;

        assert!(matches!(
            client.recv().await,
            ServerMessage::Response {
                id: 1,
                outcome: Outcome::Err {
                    kind: ErrorKind::NotFound,
                    ..
                },
            }
        ));
        server.shutdown();
    }

    #[tokio::test]
    async fn test_malformed_frame_keeps_connection_open() {
        let server = TestServer::start().await;
        let mut client = RawClient::connect(&server).await;

        client.send_text("{not json".to_string()).await;
        assert!(matches!(client.recv().await, ServerMessage::Error { .. }));

        client.send(ClientMessage::ping(2)).await;
        assert!(matches!(client.recv().await, ServerMessage::Pong { id: 2 }));
        server.shutdown();
    }

    #[tokio::test]
    async fn test_remote_client_full_flow() {
        let server = TestServer::start().await;
        let board = seeded_board(&server).await;
        let client = remote_client(&server).await;

        let todo = client
            .create_list(board.id.clone(), "Todo".into())
            .await
            .unwrap();
        let done = client
            .create_list(board.id.clone(), "Done".into())
            .await
            .unwrap();
        let a = client
            .create_card(todo.id.clone(), NewCard::new("A"))
            .await
            .unwrap();
        let mut second = NewCard::new("B");
        second.order = 1;
        client.create_card(todo.id.clone(), second).await.unwrap();

        client
            .move_card(a.id.clone(), done.id.clone(), 99)
            .await
            .unwrap();
        client
            .reorder_lists(board.id.clone(), vec![done.id.clone(), todo.id.clone()])
            .await
            .unwrap();

        let fetched = client.fetch_board(board.id.clone()).await.unwrap();
        assert_eq!(fetched.list_ids(), vec![done.id.clone(), todo.id.clone()]);
        let moved = fetched.card(&a.id).unwrap();
        assert_eq!(moved.list_id, done.id);
        assert_eq!(moved.order, 0);
        assert_eq!(fetched.lists[1].cards[0].order, 0);
        server.shutdown();
    }

    #[tokio::test]
    async fn test_reorder_with_stale_list_set_conflicts() {
        let server = TestServer::start().await;
        let board = seeded_board(&server).await;
        let client = remote_client(&server).await;
        let todo = client
            .create_list(board.id.clone(), "Todo".into())
            .await
            .unwrap();
        client
            .create_list(board.id.clone(), "Done".into())
            .await
            .unwrap();

        let err = client
            .reorder_lists(board.id.clone(), vec![todo.id])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Rejected {
                kind: ErrorKind::Conflict,
                ..
            }
        ));
        server.shutdown();
    }

    #[tokio::test]
    async fn test_clients_share_canonical_state() {
        let server = TestServer::start().await;
        let board = seeded_board(&server).await;
        let first = remote_client(&server).await;
        let second = remote_client(&server).await;

        let list = first
            .create_list(board.id.clone(), "Shared".into())
            .await
            .unwrap();
        second
            .create_card(list.id.clone(), NewCard::new("from second"))
            .await
            .unwrap();

        let seen = first.fetch_board(board.id.clone()).await.unwrap();
        assert_eq!(seen.card_count(), 1);
        assert_eq!(seen.lists[0].cards[0].title, "from second");
        server.shutdown();
    }
}
