// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The network boundary used by the reconciler and lifecycle managers.
//!
//! [`BoardSyncClient`] has one required method, [`BoardSyncClient::execute`],
//! which sends a [`BoardRequest`] and resolves with the server's reply. The
//! typed operations are provided on top of it, so a test double only has to
//! answer requests.

use std::future::Future;
use std::pin::Pin;

use cb_core::protocol::{BoardReply, BoardRequest, ErrorKind, Outcome};
use cb_core::{Board, BoardId, Card, CardId, CardPatch, List, ListId, ListPatch, NewCard, Order};

use crate::transport::TransportError;

/// Boxed future returned by client operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Error type for sync client operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Not connected.
    #[error("not connected to remote server")]
    NotConnected,

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The server processed the request and refused it.
    #[error("rejected ({kind:?}): {message}")]
    Rejected { kind: ErrorKind, message: String },

    /// The connection ended while the request was in flight.
    #[error("connection lost before a response arrived")]
    Disconnected,

    /// Max retries exceeded.
    #[error("max reconnection retries exceeded")]
    MaxRetriesExceeded,

    /// The server answered with a reply of the wrong shape.
    #[error("unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply {
        expected: &'static str,
        got: &'static str,
    },

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl SyncError {
    /// True when the server rejected the request for a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SyncError::Rejected {
                kind: ErrorKind::NotFound,
                ..
            }
        )
    }
}

/// Result type for sync client operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Converts a wire outcome into a client result.
pub fn outcome_to_result(outcome: Outcome) -> SyncResult<BoardReply> {
    match outcome {
        Outcome::Ok { reply } => Ok(reply),
        Outcome::Err { kind, message } => Err(SyncError::Rejected { kind, message }),
    }
}

fn reply_name(reply: &BoardReply) -> &'static str {
    match reply {
        BoardReply::Board(_) => "board",
        BoardReply::List(_) => "list",
        BoardReply::Card(_) => "card",
        BoardReply::Done => "done",
    }
}

fn unexpected(expected: &'static str, reply: &BoardReply) -> SyncError {
    SyncError::UnexpectedReply {
        expected,
        got: reply_name(reply),
    }
}

/// Client for the board backend.
///
/// Every operation is independent: callers may have any number of them in
/// flight at once and responses may resolve in any order.
pub trait BoardSyncClient: Send + Sync {
    /// Sends one request and waits for its reply.
    fn execute(&self, request: BoardRequest) -> BoxFuture<'_, SyncResult<BoardReply>>;

    /// Fetches the full board with ordered lists and cards.
    fn fetch_board(&self, board_id: BoardId) -> BoxFuture<'_, SyncResult<Board>> {
        Box::pin(async move {
            match self.execute(BoardRequest::FetchBoard { board_id }).await? {
                BoardReply::Board(board) => Ok(board),
                other => Err(unexpected("board", &other)),
            }
        })
    }

    fn create_list(&self, board_id: BoardId, title: String) -> BoxFuture<'_, SyncResult<List>> {
        Box::pin(async move {
            match self
                .execute(BoardRequest::CreateList { board_id, title })
                .await?
            {
                BoardReply::List(list) => Ok(list),
                other => Err(unexpected("list", &other)),
            }
        })
    }

    fn update_list(&self, list_id: ListId, patch: ListPatch) -> BoxFuture<'_, SyncResult<List>> {
        Box::pin(async move {
            match self
                .execute(BoardRequest::UpdateList { list_id, patch })
                .await?
            {
                BoardReply::List(list) => Ok(list),
                other => Err(unexpected("list", &other)),
            }
        })
    }

    fn delete_list(&self, list_id: ListId) -> BoxFuture<'_, SyncResult<()>> {
        Box::pin(async move {
            self.execute(BoardRequest::DeleteList { list_id }).await?;
            Ok(())
        })
    }

    /// Persists the full list order of a board.
    fn reorder_lists(
        &self,
        board_id: BoardId,
        list_ids: Vec<ListId>,
    ) -> BoxFuture<'_, SyncResult<()>> {
        Box::pin(async move {
            self.execute(BoardRequest::ReorderLists { board_id, list_ids })
                .await?;
            Ok(())
        })
    }

    fn create_card(&self, list_id: ListId, card: NewCard) -> BoxFuture<'_, SyncResult<Card>> {
        Box::pin(async move {
            match self
                .execute(BoardRequest::CreateCard { list_id, card })
                .await?
            {
                BoardReply::Card(card) => Ok(card),
                other => Err(unexpected("card", &other)),
            }
        })
    }

    fn update_card(&self, card_id: CardId, patch: CardPatch) -> BoxFuture<'_, SyncResult<Card>> {
        Box::pin(async move {
            match self
                .execute(BoardRequest::UpdateCard { card_id, patch })
                .await?
            {
                BoardReply::Card(card) => Ok(card),
                other => Err(unexpected("card", &other)),
            }
        })
    }

    fn delete_card(&self, card_id: CardId) -> BoxFuture<'_, SyncResult<()>> {
        Box::pin(async move {
            self.execute(BoardRequest::DeleteCard { card_id }).await?;
            Ok(())
        })
    }

    /// Moves a card to `order` within `list_id`.
    fn move_card(
        &self,
        card_id: CardId,
        list_id: ListId,
        order: Order,
    ) -> BoxFuture<'_, SyncResult<()>> {
        Box::pin(async move {
            self.execute(BoardRequest::MoveCard {
                card_id,
                list_id,
                order,
            })
            .await?;
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
