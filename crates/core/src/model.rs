// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Board data model.
//!
//! A [`Board`] owns an ordered sequence of [`List`]s and each list owns an
//! ordered sequence of [`Card`]s. Position inside the parent is expressed by a
//! dense zero-based `order` key. Children are held behind [`Arc`] so a
//! transformation can rebuild only the entities it touches and leave every
//! other list and card pointer-identical to the previous snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Dense zero-based position of an entity inside its parent.
pub type Order = u32;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier.
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            /// Returns the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                $name(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                $name(id)
            }
        }
    };
}

entity_id!(
    /// Identity of a board.
    BoardId
);
entity_id!(
    /// Identity of a list.
    ListId
);
entity_id!(
    /// Identity of a card.
    CardId
);
entity_id!(
    /// Weak reference to a user. Used for lookup only.
    UserId
);

/// Workflow status of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    /// Captured but not planned.
    #[default]
    Backlog,
    /// Planned, not yet started.
    Todo,
    /// Being worked on.
    InProgress,
    /// Waiting for review.
    InReview,
    /// Finished.
    Done,
}

impl CardStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Backlog => "backlog",
            CardStatus::Todo => "todo",
            CardStatus::InProgress => "in_progress",
            CardStatus::InReview => "in_review",
            CardStatus::Done => "done",
        }
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CardStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "backlog" => Ok(CardStatus::Backlog),
            "todo" => Ok(CardStatus::Todo),
            "in_progress" => Ok(CardStatus::InProgress),
            "in_review" => Ok(CardStatus::InReview),
            "done" => Ok(CardStatus::Done),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// A unit of work living in exactly one list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    /// The list currently holding this card.
    pub list_id: ListId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub status: CardStatus,
    /// Position inside the holding list.
    pub order: Order,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Creates a card with default status and no optional fields.
    pub fn new(
        id: impl Into<CardId>,
        list_id: impl Into<ListId>,
        title: impl Into<String>,
        order: Order,
        created_at: DateTime<Utc>,
    ) -> Self {
        Card {
            id: id.into(),
            list_id: list_id.into(),
            title: title.into(),
            description: None,
            due_date: None,
            completed: false,
            status: CardStatus::default(),
            order,
            assignees: Vec::new(),
            created_at,
            updated_at: created_at,
        }
    }
}

/// An ordered column of cards on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub board_id: BoardId,
    pub title: String,
    /// Position inside the board.
    pub order: Order,
    #[serde(default)]
    pub cards: Vec<Arc<Card>>,
}

impl List {
    /// Creates an empty list.
    pub fn new(
        id: impl Into<ListId>,
        board_id: impl Into<BoardId>,
        title: impl Into<String>,
        order: Order,
    ) -> Self {
        List {
            id: id.into(),
            board_id: board_id.into(),
            title: title.into(),
            order,
            cards: Vec::new(),
        }
    }

    /// Positional index of a card in this list.
    pub fn position_of(&self, card_id: &CardId) -> Option<usize> {
        self.cards.iter().position(|c| &c.id == card_id)
    }

    /// Card ids in positional order.
    pub fn card_ids(&self) -> Vec<CardId> {
        self.cards.iter().map(|c| c.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// A board with its lists and cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    #[serde(default)]
    pub lists: Vec<Arc<List>>,
}

impl Board {
    /// Creates an empty board.
    pub fn new(id: impl Into<BoardId>, title: impl Into<String>) -> Self {
        Board {
            id: id.into(),
            title: title.into(),
            lists: Vec::new(),
        }
    }

    /// Looks up a list by identity.
    pub fn list(&self, list_id: &ListId) -> Option<&Arc<List>> {
        self.lists.iter().find(|l| &l.id == list_id)
    }

    /// Positional index of a list on this board.
    pub fn list_index(&self, list_id: &ListId) -> Option<usize> {
        self.lists.iter().position(|l| &l.id == list_id)
    }

    /// Locates a card, returning `(list index, card index)`.
    pub fn find_card(&self, card_id: &CardId) -> Option<(usize, usize)> {
        self.lists
            .iter()
            .enumerate()
            .find_map(|(li, list)| list.position_of(card_id).map(|ci| (li, ci)))
    }

    /// Looks up a card by identity anywhere on the board.
    pub fn card(&self, card_id: &CardId) -> Option<&Arc<Card>> {
        self.find_card(card_id)
            .and_then(|(li, ci)| self.lists.get(li).and_then(|l| l.cards.get(ci)))
    }

    /// List ids in positional order.
    pub fn list_ids(&self) -> Vec<ListId> {
        self.lists.iter().map(|l| l.id.clone()).collect()
    }

    /// Total number of cards across all lists.
    pub fn card_count(&self) -> usize {
        self.lists.iter().map(|l| l.cards.len()).sum()
    }
}

/// Fields for a card that does not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCard {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: CardStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<UserId>,
    /// Requested position. The server clamps it to the list length.
    #[serde(default)]
    pub order: Order,
}

impl NewCard {
    pub fn new(title: impl Into<String>) -> Self {
        NewCard {
            title: title.into(),
            ..NewCard::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: CardStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_assignee(mut self, user: impl Into<UserId>) -> Self {
        self.assignees.push(user.into());
        self
    }
}

/// Partial update of a card's content fields.
///
/// `None` leaves a field alone. For clearable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CardStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<UserId>>,
}

impl CardPatch {
    /// True when the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.completed.is_none()
            && self.status.is_none()
            && self.assignees.is_none()
    }

    /// Applies the patch to a card and stamps `updated_at`.
    pub fn apply_to(&self, card: &mut Card, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            card.title = title.clone();
        }
        if let Some(description) = &self.description {
            card.description = description.clone();
        }
        if let Some(due_date) = self.due_date {
            card.due_date = due_date;
        }
        if let Some(completed) = self.completed {
            card.completed = completed;
        }
        if let Some(status) = self.status {
            card.status = status;
        }
        if let Some(assignees) = &self.assignees {
            card.assignees = assignees.clone();
        }
        card.updated_at = now;
    }
}

/// Partial update of a list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ListPatch {
    pub fn title(title: impl Into<String>) -> Self {
        ListPatch {
            title: Some(title.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
    }
}

/// Distinguishes an explicit `null` (clear) from an absent field (keep).
fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
