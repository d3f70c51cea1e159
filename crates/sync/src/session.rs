// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! One open board: store, drag controller, reconciler and lifecycle managers.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, info};

use cb_core::{Board, BoardId, BoardStore, DragController, DragEvent, DragPhase, SharedStore};

use crate::client::{BoardSyncClient, SyncResult};
use crate::lifecycle::{CardManager, ListManager};
use crate::notify::Notifier;
use crate::reconciler::{Reconciler, Reconciliation};

/// Client-side state and behaviour for a single board.
pub struct BoardSession {
    store: SharedStore,
    drag: Mutex<DragController>,
    reconciler: Reconciler,
    cards: CardManager,
    lists: ListManager,
}

impl BoardSession {
    /// Fetches `board_id` and seeds a fresh store with it.
    pub async fn open(
        client: Arc<dyn BoardSyncClient>,
        board_id: BoardId,
        notifier: Arc<dyn Notifier>,
    ) -> SyncResult<Self> {
        let board = client.fetch_board(board_id).await?;
        info!(board_id = %board.id, lists = board.lists.len(), cards = board.card_count(), "board opened");

        let store = SharedStore::new(BoardStore::new(board));
        let reconciler = Reconciler::new(client, store.clone(), notifier);
        Ok(BoardSession {
            store,
            drag: Mutex::new(DragController::new()),
            cards: CardManager::new(reconciler.clone()),
            lists: ListManager::new(reconciler.clone()),
            reconciler,
        })
    }

    /// Feeds one drag event. A settled move is committed in the background
    /// and its task handle returned.
    pub fn handle_drag(&self, event: DragEvent) -> Option<JoinHandle<SyncResult<()>>> {
        let intent = {
            let mut drag = self.drag.lock().unwrap_or_else(PoisonError::into_inner);
            self.store.with(|store| drag.handle(store, event))
        }?;
        debug!(?intent, "drag settled");
        Some(self.reconciler.commit(intent))
    }

    pub fn cards(&self) -> &CardManager {
        &self.cards
    }

    pub fn lists(&self) -> &ListManager {
        &self.lists
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// The current board snapshot.
    pub fn snapshot(&self) -> Arc<Board> {
        self.store.snapshot()
    }

    pub fn drag_phase(&self) -> DragPhase {
        self.drag
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .phase()
            .clone()
    }

    /// Replaces local state with the server's board.
    pub async fn refresh(&self) -> Reconciliation {
        self.reconciler.reconcile().await
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
