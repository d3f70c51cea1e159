// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Drag gesture interpretation.
//!
//! [`DragController`] is a state machine over one gesture:
//!
//! ```text
//! Idle ──start──► Dragging ──over──► Over(target) ──over──► Over(target') …
//!                     │                   │
//!                     └──────end/cancel───┴──────► Settled
//! ```
//!
//! Every `over` event is turned into a reordering transform and applied to the
//! store immediately, so the dragged entity follows the pointer before anything
//! is persisted. On `end` over a target the final position is compared with
//! the position captured at `start`; only a real change produces a
//! [`MoveIntent`]. A cancel or a drop outside any target emits nothing and
//! keeps whatever the last `over` produced.
//!
//! The controller knows nothing about the gesture library. Adapters translate
//! their callbacks into [`DragEvent`]s, or call the [`DragSource`] methods.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::intent::MoveIntent;
use crate::model::{Board, CardId, ListId};
use crate::reorder::{move_across_lists, reorder_lists, reorder_within_list};
use crate::store::BoardStore;

/// The entity being dragged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DragItem {
    Card(CardId),
    List(ListId),
}

/// What the pointer is currently over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DropTarget {
    /// Another card; the dragged entity takes its position.
    Card(CardId),
    /// A list body or its empty area.
    List(ListId),
}

/// Structured gesture events fed to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    Start { item: DragItem },
    Over { target: DropTarget },
    /// Pointer released, optionally over a final target.
    End { target: Option<DropTarget> },
    /// Gesture aborted by the gesture system.
    Cancel,
}

/// Phase of the current gesture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging,
    DraggingOver(DropTarget),
    Settled,
}

/// Where the dragged entity was when the gesture started.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Origin {
    item: DragItem,
    /// Holding list at start, for cards.
    list: Option<ListId>,
    index: usize,
}

/// Turns drag gestures into optimistic store updates and move intents.
#[derive(Debug, Default)]
pub struct DragController {
    phase: DragPhase,
    origin: Option<Origin>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    /// The entity being dragged, if a gesture is active.
    pub fn active_item(&self) -> Option<&DragItem> {
        self.origin.as_ref().map(|o| &o.item)
    }

    /// Feeds one event. Returns the intent to persist when a gesture settles
    /// with a changed position.
    pub fn handle(&mut self, store: &mut BoardStore, event: DragEvent) -> Option<MoveIntent> {
        match event {
            DragEvent::Start { item } => {
                self.start(store.board(), item);
                None
            }
            DragEvent::Over { target } => {
                self.over(store, target);
                None
            }
            DragEvent::End {
                target: Some(target),
            } => {
                self.over(store, target);
                self.settle(store.board())
            }
            // Dropped outside any target: same as a cancel.
            DragEvent::End { target: None } | DragEvent::Cancel => {
                if self.origin.take().is_some() {
                    debug!("drag aborted, keeping last preview");
                    self.phase = DragPhase::Settled;
                }
                None
            }
        }
    }

    fn start(&mut self, board: &Board, item: DragItem) {
        let origin = match &item {
            DragItem::Card(card_id) => board.find_card(card_id).map(|(li, ci)| Origin {
                list: Some(board.lists[li].id.clone()),
                index: ci,
                item: item.clone(),
            }),
            DragItem::List(list_id) => board.list_index(list_id).map(|index| Origin {
                list: None,
                index,
                item: item.clone(),
            }),
        };

        match origin {
            Some(origin) => {
                debug!(?item, index = origin.index, "drag started");
                self.origin = Some(origin);
                self.phase = DragPhase::Dragging;
            }
            None => {
                debug!(?item, "drag started on unknown entity, ignoring");
                self.origin = None;
                self.phase = DragPhase::Idle;
            }
        }
    }

    fn over(&mut self, store: &mut BoardStore, target: DropTarget) {
        let Some(origin) = &self.origin else {
            return;
        };
        // Pointer still over the same target: the preview already reflects it.
        if self.phase == DragPhase::DraggingOver(target.clone()) {
            return;
        }

        let item = origin.item.clone();
        let changed = store.apply(|board| preview(board, &item, &target));
        if changed {
            debug!(?item, ?target, "drag preview applied");
        }
        self.phase = DragPhase::DraggingOver(target);
    }

    fn settle(&mut self, board: &Board) -> Option<MoveIntent> {
        let origin = self.origin.take()?;
        self.phase = DragPhase::Settled;

        match origin.item {
            DragItem::Card(card_id) => {
                let (li, ci) = board.find_card(&card_id)?;
                let from_list = origin.list?;
                if board.lists[li].id == from_list && ci == origin.index {
                    return None;
                }
                MoveIntent::card(board, &card_id, from_list)
            }
            DragItem::List(list_id) => {
                let index = board.list_index(&list_id)?;
                if index == origin.index {
                    return None;
                }
                Some(MoveIntent::lists(board))
            }
        }
    }
}

/// Computes the preview snapshot for `item` hovering over `target`.
fn preview(board: &Arc<Board>, item: &DragItem, target: &DropTarget) -> Arc<Board> {
    match (item, target) {
        (DragItem::Card(card_id), DropTarget::Card(over_id)) => {
            let (Some((from_li, _)), Some((to_li, to_ci))) =
                (board.find_card(card_id), board.find_card(over_id))
            else {
                return Arc::clone(board);
            };
            let from_list = &board.lists[from_li].id;
            if from_li == to_li {
                reorder_within_list(board, from_list, card_id, over_id)
            } else {
                let to_list = &board.lists[to_li].id;
                move_across_lists(board, card_id, from_list, to_list, Some(to_ci))
            }
        }
        (DragItem::Card(card_id), DropTarget::List(list_id)) => {
            let Some((from_li, _)) = board.find_card(card_id) else {
                return Arc::clone(board);
            };
            let from_list = &board.lists[from_li].id;
            if from_list == list_id {
                // Hovering the card's own list body keeps its position.
                return Arc::clone(board);
            }
            move_across_lists(board, card_id, from_list, list_id, None)
        }
        (DragItem::List(list_id), DropTarget::List(over_id)) => {
            reorder_lists(board, &board.id, list_id, over_id)
        }
        (DragItem::List(list_id), DropTarget::Card(over_id)) => {
            let Some((to_li, _)) = board.find_card(over_id) else {
                return Arc::clone(board);
            };
            reorder_lists(board, &board.id, list_id, &board.lists[to_li].id)
        }
    }
}

/// Capability interface a gesture library adapter drives.
///
/// Implementors only provide [`DragSource::dispatch`]; the callbacks map one
/// to one onto [`DragEvent`]s.
pub trait DragSource {
    /// Handles one event, returning an intent when a gesture settles.
    fn dispatch(&mut self, event: DragEvent) -> Option<MoveIntent>;

    fn on_drag_start(&mut self, item: DragItem) {
        self.dispatch(DragEvent::Start { item });
    }

    fn on_drag_over(&mut self, target: DropTarget) {
        self.dispatch(DragEvent::Over { target });
    }

    fn on_drag_end(&mut self, target: Option<DropTarget>) -> Option<MoveIntent> {
        self.dispatch(DragEvent::End { target })
    }

    fn on_drag_cancel(&mut self) {
        self.dispatch(DragEvent::Cancel);
    }
}

/// A controller bound to the store it drives.
pub struct DragBinding<'a> {
    pub controller: &'a mut DragController,
    pub store: &'a mut BoardStore,
}

impl DragSource for DragBinding<'_> {
    fn dispatch(&mut self, event: DragEvent) -> Option<MoveIntent> {
        self.controller.handle(self.store, event)
    }
}

#[cfg(test)]
#[path = "drag_tests.rs"]
mod tests;
