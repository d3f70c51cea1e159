// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages for client-server communication.
//!
//! The protocol is request/response:
//! - Client sends board requests tagged with a client-chosen id
//! - Server answers each request with a response carrying the same id
//!
//! Ids let a client keep several requests in flight on one connection and
//! match responses that arrive in a different order.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{
    Board, BoardId, Card, CardId, CardPatch, List, ListId, ListPatch, NewCard, Order,
};

/// Operations a client can ask the server to perform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BoardRequest {
    /// Fetch a full board with ordered lists and cards.
    FetchBoard { board_id: BoardId },
    CreateBoard { title: String },
    CreateList { board_id: BoardId, title: String },
    UpdateList { list_id: ListId, patch: ListPatch },
    DeleteList { list_id: ListId },
    /// Replace the list order of a board with the given full sequence.
    ReorderLists {
        board_id: BoardId,
        list_ids: Vec<ListId>,
    },
    CreateCard { list_id: ListId, card: NewCard },
    UpdateCard { card_id: CardId, patch: CardPatch },
    DeleteCard { card_id: CardId },
    MoveCard {
        card_id: CardId,
        list_id: ListId,
        order: Order,
    },
}

impl BoardRequest {
    /// Short operation name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BoardRequest::FetchBoard { .. } => "fetch_board",
            BoardRequest::CreateBoard { .. } => "create_board",
            BoardRequest::CreateList { .. } => "create_list",
            BoardRequest::UpdateList { .. } => "update_list",
            BoardRequest::DeleteList { .. } => "delete_list",
            BoardRequest::ReorderLists { .. } => "reorder_lists",
            BoardRequest::CreateCard { .. } => "create_card",
            BoardRequest::UpdateCard { .. } => "update_card",
            BoardRequest::DeleteCard { .. } => "delete_card",
            BoardRequest::MoveCard { .. } => "move_card",
        }
    }
}

/// Successful result of a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BoardReply {
    Board(Board),
    List(List),
    Card(Card),
    /// The request succeeded and returns nothing.
    Done,
}

/// Category of a rejected request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Internal,
}

impl From<&Error> for ErrorKind {
    fn from(err: &Error) -> Self {
        match err {
            e if e.is_not_found() => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Validation(_) | Error::InvalidStatus(_) => ErrorKind::Validation,
            _ => ErrorKind::Internal,
        }
    }
}

/// Outcome of a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok { reply: BoardReply },
    Err { kind: ErrorKind, message: String },
}

impl Outcome {
    pub fn ok(reply: BoardReply) -> Self {
        Outcome::Ok { reply }
    }

    pub fn err(kind: ErrorKind, message: impl Into<String>) -> Self {
        Outcome::Err {
            kind,
            message: message.into(),
        }
    }
}

impl From<crate::error::Result<BoardReply>> for Outcome {
    fn from(result: crate::error::Result<BoardReply>) -> Self {
        match result {
            Ok(reply) => Outcome::ok(reply),
            Err(e) => Outcome::err(ErrorKind::from(&e), e.to_string()),
        }
    }
}

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A board request awaiting a response with the same id.
    Request { id: u64, request: BoardRequest },

    /// Ping message for keepalive.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Answer to the request with the same id.
    Response { id: u64, outcome: Outcome },

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// A message the server could not attribute to a request.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Creates a Request message.
    pub fn request(id: u64, request: BoardRequest) -> Self {
        ClientMessage::Request { id, request }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates a Response message.
    pub fn response(id: u64, outcome: impl Into<Outcome>) -> Self {
        ServerMessage::Response {
            id,
            outcome: outcome.into(),
        }
    }

    /// Creates a Pong message.
    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
