// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Wraps the canonical board database for access from every connection.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use cb_core::protocol::{BoardRequest, Outcome};
use cb_core::{Board, BoardId, Database, Result};

/// Database file name inside the data directory.
const DB_FILE: &str = "boards.db";

/// Shared server state containing the canonical database.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    /// Every write goes through this lock, so requests apply one at a time
    /// in arrival order.
    db: Mutex<Database>,
}

impl ServerState {
    /// Opens (or creates) the database in the given directory.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let db = Database::open(&data_dir.join(DB_FILE))?;
        Ok(ServerState {
            inner: Arc::new(ServerStateInner { db: Mutex::new(db) }),
        })
    }

    /// Applies one request and turns the result into a wire outcome.
    pub async fn execute(&self, request: BoardRequest) -> Outcome {
        let op = request.name();
        let result = {
            let mut db = self.inner.db.lock().await;
            db.execute(request)
        };
        match &result {
            Ok(_) => debug!(op, "request applied"),
            Err(e) => warn!(op, error = %e, "request rejected"),
        }
        Outcome::from(result)
    }

    /// Creates a board, e.g. to seed an empty server.
    pub async fn create_board(&self, title: &str) -> Result<Board> {
        self.inner.db.lock().await.create_board(title)
    }

    /// Ids and titles of every stored board.
    pub async fn boards(&self) -> Result<Vec<(BoardId, String)>> {
        self.inner.db.lock().await.list_boards()
    }
}
