// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence of committed moves and recovery from failed writes.
//!
//! A move intent becomes exactly one request, dispatched on its own task so
//! the caller never waits for the network. Success needs no follow-up: the
//! store already shows the move. Failure of any kind notifies the user and
//! replaces the store with a freshly fetched board. Intermediate drag states
//! cannot be reliably replayed, so there is no fine-grained rollback.
//!
//! At most one refetch runs at a time. Failures that arrive while one is in
//! flight are absorbed by it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use cb_core::{MoveIntent, SharedStore};

use crate::client::{BoardSyncClient, SyncError, SyncResult};
use crate::notify::{Notification, Notifier};

/// What a call to [`Reconciler::reconcile`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The store now holds the fetched board.
    Replaced,
    /// Another refetch was already running; this request was dropped.
    Absorbed,
    /// The refetch itself failed; the store was left alone.
    Failed,
}

/// Commits move intents and reconciles the store after failures.
#[derive(Clone)]
pub struct Reconciler {
    inner: Arc<Inner>,
}

struct Inner {
    client: Arc<dyn BoardSyncClient>,
    store: SharedStore,
    notifier: Arc<dyn Notifier>,
    refetching: AtomicBool,
}

/// Clears the in-flight flag however the refetch ends.
struct RefetchGuard<'a>(&'a AtomicBool);

impl Drop for RefetchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Reconciler {
    pub fn new(
        client: Arc<dyn BoardSyncClient>,
        store: SharedStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Reconciler {
            inner: Arc::new(Inner {
                client,
                store,
                notifier,
                refetching: AtomicBool::new(false),
            }),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.inner.store
    }

    pub(crate) fn client(&self) -> &dyn BoardSyncClient {
        self.inner.client.as_ref()
    }

    pub(crate) fn notify(&self, notification: Notification) {
        self.inner.notifier.notify(notification);
    }

    /// Dispatches the request for `intent` on a background task.
    pub fn commit(&self, intent: MoveIntent) -> JoinHandle<SyncResult<()>> {
        let this = self.clone();
        tokio::spawn(async move { this.commit_now(intent).await })
    }

    /// Sends the request for `intent` and reconciles if it fails.
    pub async fn commit_now(&self, intent: MoveIntent) -> SyncResult<()> {
        let client = &self.inner.client;
        let result = match &intent {
            MoveIntent::Card {
                card_id,
                to_list,
                to_order,
                ..
            } => {
                debug!(%card_id, list_id = %to_list, order = to_order, "committing card move");
                client
                    .move_card(card_id.clone(), to_list.clone(), *to_order)
                    .await
            }
            MoveIntent::Lists { board_id, list_ids } => {
                debug!(%board_id, lists = list_ids.len(), "committing list order");
                client
                    .reorder_lists(board_id.clone(), list_ids.clone())
                    .await
            }
        };

        if let Err(e) = &result {
            let what = match intent {
                MoveIntent::Card { .. } => "card move",
                MoveIntent::Lists { .. } => "list order",
            };
            self.report_failure(what, e).await;
        }
        result
    }

    /// Tells the user a write failed, then resynchronizes the store.
    pub async fn report_failure(&self, what: &str, error: &SyncError) {
        warn!(%error, "{what} failed, reconciling");
        self.inner
            .notifier
            .notify(Notification::error(format!("Could not save {what}: {error}")));
        self.reconcile().await;
    }

    /// Replaces the store with the server's board, unless a refetch is
    /// already in flight.
    pub async fn reconcile(&self) -> Reconciliation {
        let inner = &self.inner;
        if inner.refetching.swap(true, Ordering::AcqRel) {
            debug!("refetch already in flight, absorbing");
            return Reconciliation::Absorbed;
        }
        let _guard = RefetchGuard(&inner.refetching);

        let board_id = inner.store.with(|store| store.board_id().clone());
        match inner.client.fetch_board(board_id.clone()).await {
            Ok(board) => {
                info!(%board_id, cards = board.card_count(), "board reconciled from server");
                inner.store.replace_all(board);
                Reconciliation::Replaced
            }
            Err(error) => {
                warn!(%board_id, %error, "board refetch failed");
                inner.notifier.notify(Notification::error(format!(
                    "Could not refresh the board: {error}"
                )));
                Reconciliation::Failed
            }
        }
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
