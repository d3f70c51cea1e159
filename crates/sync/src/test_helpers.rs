// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles for cb-sync tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};

use cb_core::protocol::{
    BoardReply, BoardRequest, ClientMessage, ErrorKind, Outcome, ServerMessage,
};
use cb_core::{Board, BoardId, CardId, Database, ListId, NewCard};

use crate::client::{BoardSyncClient, BoxFuture, SyncError, SyncResult};
use crate::notify::{Level, Notification, Notifier};
use crate::transport::{Transport, TransportError, TransportFuture};

type Handler = Arc<dyn Fn(&BoardRequest) -> Option<Outcome> + Send + Sync>;

/// In-memory transport. Requests are answered by a handler, or by the test
/// through the paired [`MockServer`].
pub struct MockTransport {
    connected: bool,
    failing_connects: u32,
    attempts: Arc<AtomicU32>,
    handler: Handler,
    incoming_tx: mpsc::UnboundedSender<Option<ServerMessage>>,
    incoming_rx: mpsc::UnboundedReceiver<Option<ServerMessage>>,
    requests_tx: mpsc::UnboundedSender<(u64, BoardRequest)>,
}

/// Test-side end of a [`MockTransport`].
pub struct MockServer {
    incoming_tx: mpsc::UnboundedSender<Option<ServerMessage>>,
    requests_rx: mpsc::UnboundedReceiver<(u64, BoardRequest)>,
    attempts: Arc<AtomicU32>,
}

impl MockTransport {
    /// Transport whose requests are answered by `handler`; `None` means no answer.
    pub fn answering<F>(handler: F) -> (Self, MockServer)
    where
        F: Fn(&BoardRequest) -> Option<Outcome> + Send + Sync + 'static,
    {
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let attempts = Arc::new(AtomicU32::new(0));
        let transport = MockTransport {
            connected: false,
            failing_connects: 0,
            attempts: Arc::clone(&attempts),
            handler: Arc::new(handler),
            incoming_tx: incoming_tx.clone(),
            incoming_rx,
            requests_tx,
        };
        let server = MockServer {
            incoming_tx,
            requests_rx,
            attempts,
        };
        (transport, server)
    }

    /// Transport that never answers on its own.
    pub fn silent() -> (Self, MockServer) {
        Self::answering(|_| None)
    }

    /// Fails the first `count` connection attempts.
    pub fn fail_connects(mut self, count: u32) -> Self {
        self.failing_connects = count;
        self
    }
}

impl MockServer {
    /// Next request the client sent, with its correlation id.
    pub async fn next_request(&mut self) -> (u64, BoardRequest) {
        self.requests_rx.recv().await.unwrap()
    }

    pub fn respond(&self, id: u64, outcome: Outcome) {
        self.incoming_tx
            .send(Some(ServerMessage::response(id, outcome)))
            .unwrap();
    }

    pub fn push(&self, msg: ServerMessage) {
        self.incoming_tx.send(Some(msg)).unwrap();
    }

    /// Simulates the server closing the connection.
    pub fn close(&self) {
        self.incoming_tx.send(None).unwrap();
    }

    pub fn connect_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, _url: &str) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= self.failing_connects {
                return Err(TransportError::ConnectionFailed("mock failure".into()));
            }
            self.connected = true;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.connected = false;
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if !self.connected {
                return Err(TransportError::ConnectionClosed);
            }
            if let ClientMessage::Request { id, request } = msg {
                if let Some(outcome) = (self.handler)(&request) {
                    let _ = self
                        .incoming_tx
                        .send(Some(ServerMessage::response(id, outcome)));
                }
                let _ = self.requests_tx.send((id, request));
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>> {
        Box::pin(async move {
            if !self.connected {
                return Err(TransportError::ConnectionClosed);
            }
            match self.incoming_rx.recv().await {
                Some(Some(msg)) => Ok(Some(msg)),
                Some(None) | None => {
                    self.connected = false;
                    Ok(None)
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Client backed by an in-memory [`Database`], with scriptable failures and
/// delays per operation name (see [`BoardRequest::name`]).
#[derive(Default)]
pub struct ScriptedClient {
    db: Mutex<Option<Database>>,
    failures: Mutex<HashMap<&'static str, u32>>,
    gates: Mutex<HashMap<&'static str, VecDeque<oneshot::Receiver<()>>>>,
    requests: Mutex<Vec<BoardRequest>>,
}

impl ScriptedClient {
    /// Creates a server-side board from `(list title, [card titles])` and
    /// returns the client together with the board as the server sees it.
    pub fn with_board(layout: &[(&str, &[&str])]) -> (Arc<Self>, Board) {
        let mut db = Database::open_in_memory().unwrap();
        let board_id = db.create_board("Test board").unwrap().id;
        for (list_title, cards) in layout {
            let list = db.create_list(&board_id, list_title).unwrap();
            for (i, title) in cards.iter().enumerate() {
                let mut card = NewCard::new(*title);
                card.order = i as u32;
                db.create_card(&list.id, &card).unwrap();
            }
        }
        let board = db.fetch_board(&board_id).unwrap();
        let client = ScriptedClient {
            db: Mutex::new(Some(db)),
            ..ScriptedClient::default()
        };
        (Arc::new(client), board)
    }

    /// Makes the next `count` requests named `op` fail with a transport error.
    pub fn fail_next(&self, op: &'static str, count: u32) {
        *self.failures.lock().unwrap().entry(op).or_default() += count;
    }

    /// Holds the next request named `op` until the returned sender fires.
    pub fn hold_next(&self, op: &'static str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(rx);
        tx
    }

    /// Runs `f` against the server state, e.g. to act as another user.
    pub fn server<R>(&self, f: impl FnOnce(&mut Database) -> R) -> R {
        let mut db = self.db.lock().unwrap();
        f(db.as_mut().unwrap())
    }

    /// The board as the server currently stores it.
    pub fn server_board(&self, board_id: &BoardId) -> Board {
        self.server(|db| db.fetch_board(board_id).unwrap())
    }

    /// Number of requests named `op` seen so far.
    pub fn count(&self, op: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.name() == op)
            .count()
    }

    pub fn requests(&self) -> Vec<BoardRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn take_failure(&self, op: &'static str) -> bool {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(op) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        }
    }
}

impl BoardSyncClient for ScriptedClient {
    fn execute(&self, request: BoardRequest) -> BoxFuture<'_, SyncResult<BoardReply>> {
        Box::pin(async move {
            let op = request.name();
            self.requests.lock().unwrap().push(request.clone());

            let gate = self
                .gates
                .lock()
                .unwrap()
                .get_mut(op)
                .and_then(VecDeque::pop_front);
            if let Some(gate) = gate {
                let _ = gate.await;
            }

            if self.take_failure(op) {
                return Err(SyncError::Transport(TransportError::ConnectionClosed));
            }
            self.server(|db| {
                db.execute(request).map_err(|e| SyncError::Rejected {
                    kind: ErrorKind::from(&e),
                    message: e.to_string(),
                })
            })
        })
    }
}

/// Notifier that remembers everything it was told.
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn errors(&self) -> usize {
        self.all()
            .iter()
            .filter(|n| n.level == Level::Error)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

/// Looks up a card id by title.
pub fn card_named(board: &Board, title: &str) -> CardId {
    board
        .lists
        .iter()
        .flat_map(|l| l.cards.iter())
        .find(|c| c.title == title)
        .map(|c| c.id.clone())
        .unwrap()
}

/// Looks up a list id by title.
pub fn list_named(board: &Board, title: &str) -> ListId {
    board
        .lists
        .iter()
        .find(|l| l.title == title)
        .map(|l| l.id.clone())
        .unwrap()
}

/// Card titles of a list, in order.
pub fn titles_in(board: &Board, list_title: &str) -> Vec<String> {
    board
        .lists
        .iter()
        .find(|l| l.title == list_title)
        .map(|l| l.cards.iter().map(|c| c.title.clone()).collect())
        .unwrap_or_default()
}

/// Every list with its card titles, in board order.
pub fn arrangement(board: &Board) -> Vec<(String, Vec<String>)> {
    board
        .lists
        .iter()
        .map(|l| (l.title.clone(), l.cards.iter().map(|c| c.title.clone()).collect()))
        .collect()
}
