// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cb-core: Shared library for the corkboard task board
//!
//! This crate provides the board data model, the pure reordering functions,
//! the client-side store and drag controller, the wire protocol, and the
//! SQLite storage used by the reference server.

pub mod db;
pub mod drag;
pub mod error;
pub mod intent;
pub mod invariant;
pub mod model;
pub mod protocol;
pub mod reorder;
pub mod store;

#[cfg(test)]
mod test_helpers;

pub use db::Database;
pub use drag::{DragBinding, DragController, DragEvent, DragItem, DragPhase, DragSource, DropTarget};
pub use error::{Error, Result};
pub use intent::MoveIntent;
pub use invariant::{check_board, InvariantViolation};
pub use model::{
    Board, BoardId, Card, CardId, CardPatch, CardStatus, List, ListId, ListPatch, NewCard, Order,
    UserId,
};
pub use protocol::{BoardReply, BoardRequest, ClientMessage, ErrorKind, Outcome, ServerMessage};
pub use store::{BoardStore, SharedStore};
