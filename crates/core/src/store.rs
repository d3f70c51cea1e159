// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client-side board state.
//!
//! [`BoardStore`] holds the client's current snapshot of one board and is the
//! only place it is mutated. Every mutation swaps in a complete new snapshot,
//! so readers never observe a half-applied change. [`SharedStore`] is the
//! handle handed to asynchronous collaborators (reconciler, lifecycle
//! managers); it serializes access the same way a UI event loop would.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error};

use crate::error::Result;
use crate::invariant::check_board;
use crate::model::{Board, BoardId, Card, CardId, List, ListId};
use crate::reorder::{renumber_cards, renumber_lists};

/// The client's snapshot of a board.
#[derive(Debug)]
pub struct BoardStore {
    snapshot: Arc<Board>,
    revision: u64,
}

impl BoardStore {
    /// Creates a store seeded with `board`.
    pub fn new(board: Board) -> Self {
        BoardStore {
            snapshot: Arc::new(board),
            revision: 0,
        }
    }

    /// The current snapshot. Cheap to clone and never mutated in place.
    pub fn snapshot(&self) -> Arc<Board> {
        Arc::clone(&self.snapshot)
    }

    /// Borrow of the current snapshot.
    pub fn board(&self) -> &Board {
        &self.snapshot
    }

    pub fn board_id(&self) -> &BoardId {
        &self.snapshot.id
    }

    /// Number of snapshots committed so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Runs a transformation over the snapshot and stores its result.
    ///
    /// Returns false when the transformation handed back the same snapshot.
    pub fn apply<F>(&mut self, transform: F) -> bool
    where
        F: FnOnce(&Arc<Board>) -> Arc<Board>,
    {
        let next = transform(&self.snapshot);
        if Arc::ptr_eq(&next, &self.snapshot) {
            return false;
        }
        self.commit(next);
        true
    }

    /// Replaces the whole snapshot, e.g. with authoritative server state.
    pub fn replace_all(&mut self, board: Board) {
        debug!(board_id = %board.id, lists = board.lists.len(), "replacing board snapshot");
        self.commit(Arc::new(board));
    }

    /// Verifies the snapshot invariants.
    pub fn check(&self) -> Result<()> {
        check_board(&self.snapshot)?;
        Ok(())
    }

    /// Appends a new list, or updates it in place when already present.
    ///
    /// The list lands at its `order`, clamped to the current list count.
    pub fn insert_list(&mut self, list: List) -> bool {
        if list.board_id != self.snapshot.id {
            return false;
        }
        let mut lists = self.snapshot.lists.clone();
        lists.retain(|l| l.id != list.id);
        let at = (list.order as usize).min(lists.len());
        lists.insert(at, Arc::new(list));
        renumber_lists(&mut lists);
        self.commit_lists(lists);
        true
    }

    /// Replaces a list's own fields, keeping its local position and cards.
    pub fn patch_list(&mut self, updated: List) -> bool {
        let Some(index) = self.snapshot.list_index(&updated.id) else {
            return false;
        };
        let mut lists = self.snapshot.lists.clone();
        let current = &self.snapshot.lists[index];
        let replacement = List {
            id: current.id.clone(),
            board_id: current.board_id.clone(),
            title: updated.title,
            order: current.order,
            cards: current.cards.clone(),
        };
        lists[index] = Arc::new(replacement);
        self.commit_lists(lists);
        true
    }

    /// Removes a list with all its cards and closes the gap.
    pub fn remove_list(&mut self, list_id: &ListId) -> Option<Arc<List>> {
        let index = self.snapshot.list_index(list_id)?;
        let mut lists = self.snapshot.lists.clone();
        let removed = lists.remove(index);
        renumber_lists(&mut lists);
        self.commit_lists(lists);
        Some(removed)
    }

    /// Inserts a card into its list at its `order`, clamped to the list length.
    ///
    /// A card already on the board is moved rather than duplicated.
    pub fn insert_card(&mut self, card: Card) -> bool {
        let Some(li) = self.snapshot.list_index(&card.list_id) else {
            return false;
        };
        let mut lists = self.snapshot.lists.clone();
        if let Some((old_li, ci)) = self.snapshot.find_card(&card.id) {
            let list = Arc::make_mut(&mut lists[old_li]);
            list.cards.remove(ci);
            renumber_cards(&mut list.cards, &self.snapshot.lists[old_li].id);
        }
        let list = Arc::make_mut(&mut lists[li]);
        let at = (card.order as usize).min(list.cards.len());
        list.cards.insert(at, Arc::new(card));
        let list_id = list.id.clone();
        renumber_cards(&mut list.cards, &list_id);
        self.commit_lists(lists);
        true
    }

    /// Replaces a card's content fields, keeping its local list and order.
    pub fn patch_card(&mut self, updated: Card) -> bool {
        let Some((li, ci)) = self.snapshot.find_card(&updated.id) else {
            return false;
        };
        let mut lists = self.snapshot.lists.clone();
        let current = &self.snapshot.lists[li].cards[ci];
        let card = Card {
            list_id: current.list_id.clone(),
            order: current.order,
            ..updated
        };
        Arc::make_mut(&mut lists[li]).cards[ci] = Arc::new(card);
        self.commit_lists(lists);
        true
    }

    /// Removes a card and renumbers its former siblings.
    pub fn remove_card(&mut self, card_id: &CardId) -> Option<Arc<Card>> {
        let (li, ci) = self.snapshot.find_card(card_id)?;
        let mut lists = self.snapshot.lists.clone();
        let list = Arc::make_mut(&mut lists[li]);
        let removed = list.cards.remove(ci);
        let list_id = list.id.clone();
        renumber_cards(&mut list.cards, &list_id);
        self.commit_lists(lists);
        Some(removed)
    }

    fn commit_lists(&mut self, lists: Vec<Arc<List>>) {
        self.commit(Arc::new(Board {
            id: self.snapshot.id.clone(),
            title: self.snapshot.title.clone(),
            lists,
        }));
    }

    fn commit(&mut self, next: Arc<Board>) {
        if let Err(violation) = check_board(&next) {
            // Only reachable through a defect in a transformation or bad server data.
            error!(board_id = %next.id, %violation, "board invariant violated");
        }
        self.snapshot = next;
        self.revision += 1;
    }
}

/// Cloneable handle to a [`BoardStore`] shared with async tasks.
///
/// Every access holds the lock only for a synchronous mutation, so no await
/// point ever runs while the store is locked.
#[derive(Debug, Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<BoardStore>>,
}

impl SharedStore {
    pub fn new(store: BoardStore) -> Self {
        SharedStore {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Runs `f` with exclusive access to the store.
    pub fn with<R>(&self, f: impl FnOnce(&mut BoardStore) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Board> {
        self.with(|store| store.snapshot())
    }

    /// See [`BoardStore::apply`].
    pub fn apply<F>(&self, transform: F) -> bool
    where
        F: FnOnce(&Arc<Board>) -> Arc<Board>,
    {
        self.with(|store| store.apply(transform))
    }

    /// See [`BoardStore::replace_all`].
    pub fn replace_all(&self, board: Board) {
        self.with(|store| store.replace_all(board))
    }
}

impl From<BoardStore> for SharedStore {
    fn from(store: BoardStore) -> Self {
        SharedStore::new(store)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
