// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Create, edit and delete for individual cards and lists.
//!
//! Creates and edits wait for the server: the entity only enters the store
//! with its confirmed identity and fields. Deletes are optimistic and fall
//! back to full reconciliation when the server refuses them.

use tracing::{debug, info, warn};

use cb_core::{Card, CardId, CardPatch, List, ListId, ListPatch, NewCard};

use crate::client::{SyncError, SyncResult};
use crate::notify::Notification;
use crate::reconciler::Reconciler;

/// Card create/edit/delete against the server and the local store.
#[derive(Clone)]
pub struct CardManager {
    reconciler: Reconciler,
}

impl CardManager {
    pub fn new(reconciler: Reconciler) -> Self {
        CardManager { reconciler }
    }

    /// Appends a card to `list_id` once the server has created it.
    pub async fn create(&self, list_id: &ListId, mut card: NewCard) -> SyncResult<Card> {
        let store = self.reconciler.store();
        card.order = store.with(|s| s.board().list(list_id).map_or(0, |l| l.len())) as u32;
        debug!(%list_id, order = card.order, "creating card");

        match self
            .reconciler
            .client()
            .create_card(list_id.clone(), card)
            .await
        {
            Ok(created) => {
                info!(card_id = %created.id, %list_id, "card created");
                store.with(|s| s.insert_card(created.clone()));
                Ok(created)
            }
            Err(e) => Err(surface(&self.reconciler, "create card", e)),
        }
    }

    /// Applies `patch` on the server, then patches the local copy.
    pub async fn update(&self, card_id: &CardId, patch: CardPatch) -> SyncResult<Card> {
        match self
            .reconciler
            .client()
            .update_card(card_id.clone(), patch)
            .await
        {
            Ok(updated) => {
                debug!(%card_id, "card updated");
                self.reconciler
                    .store()
                    .with(|s| s.patch_card(updated.clone()));
                Ok(updated)
            }
            Err(e) => Err(surface(&self.reconciler, "update card", e)),
        }
    }

    /// Removes the card locally, then deletes it on the server.
    pub async fn delete(&self, card_id: &CardId) -> SyncResult<()> {
        let removed = self.reconciler.store().with(|s| s.remove_card(card_id));
        if removed.is_none() {
            debug!(%card_id, "deleting card not in local store");
        }

        let result = self.reconciler.client().delete_card(card_id.clone()).await;
        match &result {
            Ok(()) => info!(%card_id, "card deleted"),
            Err(e) => self.reconciler.report_failure("card deletion", e).await,
        }
        result
    }
}

/// List create/edit/delete against the server and the local store.
#[derive(Clone)]
pub struct ListManager {
    reconciler: Reconciler,
}

impl ListManager {
    pub fn new(reconciler: Reconciler) -> Self {
        ListManager { reconciler }
    }

    /// Appends a list to the board once the server has created it.
    pub async fn create(&self, title: impl Into<String>) -> SyncResult<List> {
        let store = self.reconciler.store();
        let board_id = store.with(|s| s.board_id().clone());
        let title = title.into();
        debug!(%board_id, %title, "creating list");

        match self
            .reconciler
            .client()
            .create_list(board_id.clone(), title)
            .await
        {
            Ok(created) => {
                info!(list_id = %created.id, %board_id, "list created");
                store.with(|s| s.insert_list(created.clone()));
                Ok(created)
            }
            Err(e) => Err(surface(&self.reconciler, "create list", e)),
        }
    }

    pub async fn update(&self, list_id: &ListId, patch: ListPatch) -> SyncResult<List> {
        match self
            .reconciler
            .client()
            .update_list(list_id.clone(), patch)
            .await
        {
            Ok(updated) => {
                self.reconciler
                    .store()
                    .with(|s| s.patch_list(updated.clone()));
                Ok(updated)
            }
            Err(e) => Err(surface(&self.reconciler, "update list", e)),
        }
    }

    /// Removes the list and its cards locally, then deletes it on the server.
    pub async fn delete(&self, list_id: &ListId) -> SyncResult<()> {
        self.reconciler.store().with(|s| s.remove_list(list_id));

        let result = self.reconciler.client().delete_list(list_id.clone()).await;
        match &result {
            Ok(()) => info!(%list_id, "list deleted"),
            Err(e) => self.reconciler.report_failure("list deletion", e).await,
        }
        result
    }
}

/// Tells the user a non-optimistic operation failed. The store is untouched.
fn surface(reconciler: &Reconciler, what: &str, error: SyncError) -> SyncError {
    warn!(%error, "{what} failed");
    reconciler.notify(Notification::error(format!("Could not {what}: {error}")));
    error
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
