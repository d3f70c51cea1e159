// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Structural invariants of a board snapshot.
//!
//! After every committed operation:
//! - list `order` values on a board are exactly `0..m`
//! - card `order` values in a list are exactly `0..n`
//! - every card points at the list holding it, every list at its board
//! - no card is a member of two lists

use std::collections::HashSet;

use thiserror::Error;

use crate::model::{Board, BoardId, CardId, ListId, Order};

/// The rule a snapshot broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("list order on board {board} is not dense: {found:?}")]
    ListOrder { board: BoardId, found: Vec<Order> },

    #[error("card order in list {list} is not dense: {found:?}")]
    CardOrder { list: ListId, found: Vec<Order> },

    #[error("list {list} is on board {holder} but claims board {claimed}")]
    ListParent {
        list: ListId,
        holder: BoardId,
        claimed: BoardId,
    },

    #[error("card {card} is in list {holder} but claims list {claimed}")]
    CardParent {
        card: CardId,
        holder: ListId,
        claimed: ListId,
    },

    #[error("card {card} is a member of more than one list")]
    DuplicateCard { card: CardId },
}

/// True when the orders are a permutation of `0..len`.
pub fn is_dense(orders: impl IntoIterator<Item = Order>) -> bool {
    let mut sorted: Vec<Order> = orders.into_iter().collect();
    sorted.sort_unstable();
    sorted.iter().enumerate().all(|(i, o)| *o as usize == i)
}

/// Checks every invariant of a board snapshot.
pub fn check_board(board: &Board) -> Result<(), InvariantViolation> {
    if !is_dense(board.lists.iter().map(|l| l.order)) {
        return Err(InvariantViolation::ListOrder {
            board: board.id.clone(),
            found: board.lists.iter().map(|l| l.order).collect(),
        });
    }

    let mut seen = HashSet::new();
    for list in &board.lists {
        if list.board_id != board.id {
            return Err(InvariantViolation::ListParent {
                list: list.id.clone(),
                holder: board.id.clone(),
                claimed: list.board_id.clone(),
            });
        }
        if !is_dense(list.cards.iter().map(|c| c.order)) {
            return Err(InvariantViolation::CardOrder {
                list: list.id.clone(),
                found: list.cards.iter().map(|c| c.order).collect(),
            });
        }
        for card in &list.cards {
            if card.list_id != list.id {
                return Err(InvariantViolation::CardParent {
                    card: card.id.clone(),
                    holder: list.id.clone(),
                    claimed: card.list_id.clone(),
                });
            }
            if !seen.insert(&card.id) {
                return Err(InvariantViolation::DuplicateCard {
                    card: card.id.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "invariant_tests.rs"]
mod tests;
