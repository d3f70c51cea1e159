// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the cb-remote server binary.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;

use cb_core::protocol::{BoardReply, BoardRequest};
use cb_core::{Board, DragEvent, DragItem, DropTarget, NewCard};
use cb_sync::{BoardSession, BoardSyncClient, ChannelNotifier, RemoteClient, SyncConfig};

/// Helper to spawn a server process and clean it up on drop.
struct ServerProcess {
    child: Child,
    port: u16,
}

impl ServerProcess {
    /// Each test passes its own `slot` so concurrent tests use distinct ports.
    fn spawn(data: &Path, slot: u16) -> Self {
        // Use a port range that's less likely to conflict
        let port = 49152 + (std::process::id() % 1000) as u16 * 4 + slot;

        let child = Command::new(env!("CARGO_BIN_EXE_cb-remote"))
            .arg("--bind")
            .arg(format!("127.0.0.1:{}", port))
            .arg("--data")
            .arg(data)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn server process");

        ServerProcess { child, port }
    }

    fn config(&self) -> SyncConfig {
        // Generous retries: CI runners can be slow to bring the server up.
        SyncConfig {
            max_retries: 20,
            max_delay_secs: 1,
            ..SyncConfig::for_url(format!("ws://127.0.0.1:{}", self.port))
        }
    }

    async fn client(&self) -> RemoteClient {
        RemoteClient::connect(&self.config())
            .await
            .expect("should connect to server within retries")
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        // Kill the server process
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

async fn create_board(client: &RemoteClient, title: &str) -> Board {
    match client
        .execute(BoardRequest::CreateBoard {
            title: title.to_string(),
        })
        .await
        .expect("create board")
    {
        BoardReply::Board(board) => board,
        other => panic!("Expected board, got {:?}", other),
    }
}

#[tokio::test]
async fn test_session_against_real_server() {
    let data = tempfile::tempdir().expect("create temp dir");
    let server = ServerProcess::spawn(data.path(), 0);
    let client = Arc::new(server.client().await);

    let board = create_board(&client, "Sprint").await;
    let todo = client
        .create_list(board.id.clone(), "Todo".into())
        .await
        .unwrap();
    let done = client
        .create_list(board.id.clone(), "Done".into())
        .await
        .unwrap();
    let card = client
        .create_card(todo.id.clone(), NewCard::new("Ship it"))
        .await
        .unwrap();

    let (notifier, mut notifications) = ChannelNotifier::new();
    let session = BoardSession::open(client.clone(), board.id.clone(), Arc::new(notifier))
        .await
        .unwrap();

    session.handle_drag(DragEvent::Start {
        item: DragItem::Card(card.id.clone()),
    });
    let commit = session
        .handle_drag(DragEvent::End {
            target: Some(DropTarget::List(done.id.clone())),
        })
        .expect("drop emits a move");
    commit.await.unwrap().unwrap();

    let server_board = client.fetch_board(board.id.clone()).await.unwrap();
    let moved = server_board.card(&card.id).unwrap();
    assert_eq!(moved.list_id, done.id);
    assert_eq!(moved.order, 0);
    assert_eq!(session.snapshot().list_ids(), server_board.list_ids());
    assert!(notifications.try_recv().is_err());
}

#[tokio::test]
async fn test_boards_survive_restart() {
    let data = tempfile::tempdir().expect("create temp dir");

    let board = {
        let server = ServerProcess::spawn(data.path(), 1);
        let client = server.client().await;
        let board = create_board(&client, "Durable").await;
        client
            .create_list(board.id.clone(), "Backlog".into())
            .await
            .unwrap();
        board
    };

    let server = ServerProcess::spawn(data.path(), 2);
    let client = server.client().await;
    let fetched = client.fetch_board(board.id).await.unwrap();

    assert_eq!(fetched.title, "Durable");
    assert_eq!(fetched.lists.len(), 1);
    assert_eq!(fetched.lists[0].title, "Backlog");
}
