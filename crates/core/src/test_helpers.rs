// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for cb-core tests.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use crate::model::{Board, Card, List, Order};

/// Builds board `b-1` from `(list id, [card ids])` pairs.
///
/// Lists and cards get dense orders and their id doubles as title.
pub fn board_with(layout: &[(&str, &[&str])]) -> Board {
    let created = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).single().unwrap_or_default();
    let mut board = Board::new("b-1", "Test board");
    for (li, (list_id, cards)) in layout.iter().enumerate() {
        let mut list = List::new(*list_id, "b-1", *list_id, li as Order);
        list.cards = cards
            .iter()
            .enumerate()
            .map(|(ci, card_id)| Arc::new(Card::new(*card_id, *list_id, *card_id, ci as Order, created)))
            .collect();
        board.lists.push(Arc::new(list));
    }
    board
}

/// Card ids with their order keys for one list, for compact assertions.
pub fn layout_of(board: &Board, list_id: &str) -> Vec<(String, Order)> {
    board
        .lists
        .iter()
        .find(|l| l.id.as_str() == list_id)
        .map(|l| {
            l.cards
                .iter()
                .map(|c| (c.id.to_string(), c.order))
                .collect()
        })
        .unwrap_or_default()
}

/// List ids with their order keys.
pub fn list_layout(board: &Board) -> Vec<(String, Order)> {
    board
        .lists
        .iter()
        .map(|l| (l.id.to_string(), l.order))
        .collect()
}
