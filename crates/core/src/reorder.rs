// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reordering algorithm.
//!
//! Pure functions from a board snapshot and an ordering request to a new
//! snapshot. Inapplicable input (unknown ids, a card dropped onto itself)
//! yields the input snapshot itself, so callers can detect a no-op with
//! [`Arc::ptr_eq`]. Lists and cards that a move does not touch are shared
//! with the input snapshot.
//!
//! Positional moves follow array-move semantics: the dragged entity is
//! removed at its old index and inserted at the target's index, so moving
//! forward lands after the target and moving backward lands before it.

use std::sync::Arc;

use crate::model::{Board, BoardId, Card, CardId, List, ListId, Order};

/// Moves a card onto the position of another card in the same list.
pub fn reorder_within_list(
    board: &Arc<Board>,
    list_id: &ListId,
    from: &CardId,
    to: &CardId,
) -> Arc<Board> {
    let Some(li) = board.list_index(list_id) else {
        return Arc::clone(board);
    };
    let list = &board.lists[li];
    let (Some(old_index), Some(new_index)) = (list.position_of(from), list.position_of(to)) else {
        return Arc::clone(board);
    };
    if old_index == new_index {
        return Arc::clone(board);
    }

    let mut cards = list.cards.clone();
    array_move(&mut cards, old_index, new_index);
    renumber_cards(&mut cards, list_id);

    replace_lists(board, [(li, with_cards(list, cards))])
}

/// Moves a card from one list into another at `dest_index`.
///
/// `dest_index` is clamped to the destination length; `None` appends. When
/// source and destination are the same list this is a positional move.
pub fn move_across_lists(
    board: &Arc<Board>,
    card_id: &CardId,
    source: &ListId,
    dest: &ListId,
    dest_index: Option<usize>,
) -> Arc<Board> {
    let (Some(si), Some(di)) = (board.list_index(source), board.list_index(dest)) else {
        return Arc::clone(board);
    };
    let source_list = &board.lists[si];
    let Some(ci) = source_list.position_of(card_id) else {
        return Arc::clone(board);
    };

    if si == di {
        let last = source_list.cards.len() - 1;
        let target = dest_index.unwrap_or(last).min(last);
        if target == ci {
            return Arc::clone(board);
        }
        let mut cards = source_list.cards.clone();
        array_move(&mut cards, ci, target);
        renumber_cards(&mut cards, source);
        return replace_lists(board, [(si, with_cards(source_list, cards))]);
    }

    let dest_list = &board.lists[di];

    let mut source_cards = source_list.cards.clone();
    let card = source_cards.remove(ci);
    renumber_cards(&mut source_cards, source);

    let mut dest_cards = dest_list.cards.clone();
    let at = dest_index
        .unwrap_or(dest_cards.len())
        .min(dest_cards.len());
    dest_cards.insert(at, card);
    renumber_cards(&mut dest_cards, dest);

    replace_lists(
        board,
        [
            (si, with_cards(source_list, source_cards)),
            (di, with_cards(dest_list, dest_cards)),
        ],
    )
}

/// Moves a list onto the position of another list on the same board.
pub fn reorder_lists(
    board: &Arc<Board>,
    board_id: &BoardId,
    from: &ListId,
    to: &ListId,
) -> Arc<Board> {
    if &board.id != board_id {
        return Arc::clone(board);
    }
    let (Some(old_index), Some(new_index)) = (board.list_index(from), board.list_index(to)) else {
        return Arc::clone(board);
    };
    if old_index == new_index {
        return Arc::clone(board);
    }

    let mut lists = board.lists.clone();
    array_move(&mut lists, old_index, new_index);
    renumber_lists(&mut lists);

    Arc::new(Board {
        id: board.id.clone(),
        title: board.title.clone(),
        lists,
    })
}

/// Rewrites card orders to `0..n` in positional order and points every card
/// at `list_id`. Cards already correct keep their allocation.
pub fn renumber_cards(cards: &mut [Arc<Card>], list_id: &ListId) {
    for (i, card) in cards.iter_mut().enumerate() {
        let order = i as Order;
        if card.order != order || &card.list_id != list_id {
            let card = Arc::make_mut(card);
            card.order = order;
            card.list_id = list_id.clone();
        }
    }
}

/// Rewrites list orders to `0..m` in positional order.
pub fn renumber_lists(lists: &mut [Arc<List>]) {
    for (i, list) in lists.iter_mut().enumerate() {
        let order = i as Order;
        if list.order != order {
            Arc::make_mut(list).order = order;
        }
    }
}

/// Stable positional move: remove at `from`, insert at `to`.
fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    items.insert(to, item);
}

fn with_cards(list: &List, cards: Vec<Arc<Card>>) -> Arc<List> {
    Arc::new(List {
        id: list.id.clone(),
        board_id: list.board_id.clone(),
        title: list.title.clone(),
        order: list.order,
        cards,
    })
}

fn replace_lists<const N: usize>(board: &Board, replaced: [(usize, Arc<List>); N]) -> Arc<Board> {
    let mut lists = board.lists.clone();
    for (index, list) in replaced {
        lists[index] = list;
    }
    Arc::new(Board {
        id: board.id.clone(),
        title: board.title.clone(),
        lists,
    })
}

#[cfg(test)]
#[path = "reorder_tests.rs"]
mod tests;
