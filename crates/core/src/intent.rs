// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Move intents.
//!
//! A move intent describes a completed drag gesture in terms the backing
//! store understands. Card moves carry the card's final list and order; list
//! moves carry the full ordered id sequence of the board, which expresses a
//! total order without per-item races.

use serde::{Deserialize, Serialize};

use crate::model::{Board, BoardId, CardId, ListId, Order};

/// A committed reordering to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MoveIntent {
    /// A card ended the gesture at `to_list`/`to_order`.
    Card {
        card_id: CardId,
        from_list: ListId,
        to_list: ListId,
        to_order: Order,
    },
    /// The board's lists ended the gesture in this order.
    Lists {
        board_id: BoardId,
        list_ids: Vec<ListId>,
    },
}

impl MoveIntent {
    /// Describes where `card_id` sits on `board`, if it is still there.
    pub fn card(board: &Board, card_id: &CardId, from_list: ListId) -> Option<Self> {
        let card = board.card(card_id)?;
        Some(MoveIntent::Card {
            card_id: card_id.clone(),
            from_list,
            to_list: card.list_id.clone(),
            to_order: card.order,
        })
    }

    /// Describes the current list order of `board`.
    pub fn lists(board: &Board) -> Self {
        MoveIntent::Lists {
            board_id: board.id.clone(),
            list_ids: board.list_ids(),
        }
    }

    /// True for a card that changed lists.
    pub fn is_cross_list(&self) -> bool {
        matches!(self, MoveIntent::Card { from_list, to_list, .. } if from_list != to_list)
    }
}

#[cfg(test)]
#[path = "intent_tests.rs"]
mod tests;
