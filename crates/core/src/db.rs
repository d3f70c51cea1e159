// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed board storage for the server.
//!
//! The [`Database`] is the final arbiter of ordering. Every write that changes
//! membership of a parent rewrites the `position` column of all siblings
//! inside the same transaction, so lists and cards read back with dense
//! zero-based orders no matter what the client sent.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{
    Board, BoardId, Card, CardId, CardPatch, List, ListId, ListPatch, NewCard, Order, UserId,
};
use crate::protocol::{BoardReply, BoardRequest};

/// SQL schema for the board database.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS boards (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lists (
    id TEXT PRIMARY KEY,
    board_id TEXT NOT NULL,
    title TEXT NOT NULL,
    position INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (board_id) REFERENCES boards(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS cards (
    id TEXT PRIMARY KEY,
    list_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    due_date TEXT,
    completed INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'backlog',
    position INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (list_id) REFERENCES lists(id) ON DELETE CASCADE
);

-- Weak user references, kept in assignment order
CREATE TABLE IF NOT EXISTS card_assignees (
    card_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    PRIMARY KEY (card_id, user_id),
    FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_lists_board ON lists(board_id, position);
CREATE INDEX IF NOT EXISTS idx_cards_list ON cards(list_id, position);
"#;

const CARD_COLUMNS: &str = "id, list_id, title, description, due_date, completed, status, \
                            position, created_at, updated_at";

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate an entity ID from prefix, title, timestamp and a sequence number.
/// Format: {prefix}-{hash} where hash is the first 8 hex chars of the SHA-256.
pub fn generate_id(prefix: &str, title: &str, created_at: &DateTime<Utc>, seq: u64) -> String {
    let input = format!("{}{}{}", title, created_at.to_rfc3339(), seq);
    let hash = Sha256::digest(input.as_bytes());
    format!("{}-{}", prefix, hex::encode(&hash[..4]))
}

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

fn card_from_row(row: &Row<'_>) -> std::result::Result<Card, rusqlite::Error> {
    let due_date: Option<String> = row.get(4)?;
    let status: String = row.get(6)?;
    let created: String = row.get(8)?;
    let updated: String = row.get(9)?;

    Ok(Card {
        id: CardId::new(row.get::<_, String>(0)?),
        list_id: ListId::new(row.get::<_, String>(1)?),
        title: row.get(2)?,
        description: row.get(3)?,
        due_date: due_date
            .map(|d| parse_timestamp(&d, "due_date"))
            .transpose()?,
        completed: row.get(5)?,
        status: parse_db(&status, "status")?,
        order: row.get(7)?,
        assignees: Vec::new(),
        created_at: parse_timestamp(&created, "created_at")?,
        updated_at: parse_timestamp(&updated, "updated_at")?,
    })
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::Validation("title must not be empty".to_string()));
    }
    Ok(())
}

fn exists(conn: &Connection, table: &'static str, id: &str) -> Result<bool> {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE id = ?1");
    let count: i64 = conn.query_row(&sql, params![id], |row| row.get(0))?;
    Ok(count > 0)
}

/// Picks a fresh id for `table`, retrying on the (unlikely) collision.
fn unique_id(
    conn: &Connection,
    table: &'static str,
    prefix: &str,
    title: &str,
    created_at: &DateTime<Utc>,
) -> Result<String> {
    loop {
        let seq = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let id = generate_id(prefix, title, created_at, seq);
        if !exists(conn, table, &id)? {
            return Ok(id);
        }
    }
}

fn list_ids_of(conn: &Connection, board_id: &str) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare_cached("SELECT id FROM lists WHERE board_id = ?1 ORDER BY position, rowid")?;
    let ids = stmt
        .query_map(params![board_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(ids)
}

fn card_ids_of(conn: &Connection, list_id: &str) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare_cached("SELECT id FROM cards WHERE list_id = ?1 ORDER BY position, rowid")?;
    let ids = stmt
        .query_map(params![list_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(ids)
}

/// Rewrites list positions to match `ids`.
fn write_list_positions(conn: &Connection, ids: &[String]) -> Result<()> {
    let mut stmt = conn.prepare_cached("UPDATE lists SET position = ?1 WHERE id = ?2")?;
    for (position, id) in ids.iter().enumerate() {
        stmt.execute(params![position as i64, id])?;
    }
    Ok(())
}

/// Places `ids` in `list_id` with dense positions.
fn write_card_positions(conn: &Connection, list_id: &str, ids: &[String]) -> Result<()> {
    let mut stmt =
        conn.prepare_cached("UPDATE cards SET list_id = ?1, position = ?2 WHERE id = ?3")?;
    for (position, id) in ids.iter().enumerate() {
        stmt.execute(params![list_id, position as i64, id])?;
    }
    Ok(())
}

fn assignees_of(conn: &Connection, card_id: &str) -> Result<Vec<UserId>> {
    let mut stmt = conn
        .prepare_cached("SELECT user_id FROM card_assignees WHERE card_id = ?1 ORDER BY rowid")?;
    let users = stmt
        .query_map(params![card_id], |row| row.get::<_, String>(0))?
        .map(|user| user.map(UserId::new))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(users)
}

fn set_assignees(conn: &Connection, card_id: &str, users: &[UserId]) -> Result<()> {
    conn.execute(
        "DELETE FROM card_assignees WHERE card_id = ?1",
        params![card_id],
    )?;
    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO card_assignees (card_id, user_id) VALUES (?1, ?2)",
    )?;
    for user in users {
        stmt.execute(params![card_id, user.as_str()])?;
    }
    Ok(())
}

fn load_card(conn: &Connection, card_id: &str) -> Result<Card> {
    let sql = format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1");
    let card = conn
        .query_row(&sql, params![card_id], card_from_row)
        .optional()?;
    let mut card = card.ok_or_else(|| Error::CardNotFound(card_id.to_string()))?;
    card.assignees = assignees_of(conn, card_id)?;
    Ok(card)
}

fn load_cards(conn: &Connection, list_id: &str) -> Result<Vec<Arc<Card>>> {
    let sql = format!("SELECT {CARD_COLUMNS} FROM cards WHERE list_id = ?1 ORDER BY position, rowid");
    let mut stmt = conn.prepare_cached(&sql)?;
    let cards = stmt
        .query_map(params![list_id], card_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    cards
        .into_iter()
        .map(|mut card| -> Result<Arc<Card>> {
            card.assignees = assignees_of(conn, card.id.as_str())?;
            Ok(Arc::new(card))
        })
        .collect()
}

fn load_list(conn: &Connection, list_id: &str) -> Result<List> {
    let row = conn
        .query_row(
            "SELECT board_id, title, position FROM lists WHERE id = ?1",
            params![list_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Order>(2)?,
                ))
            },
        )
        .optional()?;
    let (board_id, title, order) = row.ok_or_else(|| Error::ListNotFound(list_id.to_string()))?;
    let mut list = List::new(list_id, board_id, title, order);
    list.cards = load_cards(conn, list_id)?;
    Ok(list)
}

fn board_of_list(conn: &Connection, list_id: &str) -> Result<Option<String>> {
    let board_id = conn
        .query_row(
            "SELECT board_id FROM lists WHERE id = ?1",
            params![list_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(board_id)
}

fn list_of_card(conn: &Connection, card_id: &str) -> Result<Option<String>> {
    let list_id = conn
        .query_row(
            "SELECT list_id FROM cards WHERE id = ?1",
            params![card_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(list_id)
}

/// SQLite database connection with board operations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open a database connection at the given path, creating the schema if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(Database { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Database { conn })
    }

    /// Execute one protocol request against the database.
    pub fn execute(&mut self, request: BoardRequest) -> Result<BoardReply> {
        match request {
            BoardRequest::FetchBoard { board_id } => {
                self.fetch_board(&board_id).map(BoardReply::Board)
            }
            BoardRequest::CreateBoard { title } => {
                self.create_board(&title).map(BoardReply::Board)
            }
            BoardRequest::CreateList { board_id, title } => {
                self.create_list(&board_id, &title).map(BoardReply::List)
            }
            BoardRequest::UpdateList { list_id, patch } => {
                self.update_list(&list_id, &patch).map(BoardReply::List)
            }
            BoardRequest::DeleteList { list_id } => {
                self.delete_list(&list_id).map(|()| BoardReply::Done)
            }
            BoardRequest::ReorderLists { board_id, list_ids } => self
                .reorder_lists(&board_id, &list_ids)
                .map(|()| BoardReply::Done),
            BoardRequest::CreateCard { list_id, card } => {
                self.create_card(&list_id, &card).map(BoardReply::Card)
            }
            BoardRequest::UpdateCard { card_id, patch } => {
                self.update_card(&card_id, &patch).map(BoardReply::Card)
            }
            BoardRequest::DeleteCard { card_id } => {
                self.delete_card(&card_id).map(|()| BoardReply::Done)
            }
            BoardRequest::MoveCard {
                card_id,
                list_id,
                order,
            } => self
                .move_card(&card_id, &list_id, order)
                .map(BoardReply::Card),
        }
    }

    /// Fetch a board with its lists and cards in position order.
    pub fn fetch_board(&self, board_id: &BoardId) -> Result<Board> {
        let title: Option<String> = self
            .conn
            .query_row(
                "SELECT title FROM boards WHERE id = ?1",
                params![board_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let title = title.ok_or_else(|| Error::BoardNotFound(board_id.to_string()))?;

        let mut board = Board::new(board_id.clone(), title);
        for list_id in list_ids_of(&self.conn, board_id.as_str())? {
            board.lists.push(Arc::new(load_list(&self.conn, &list_id)?));
        }
        Ok(board)
    }

    /// All boards as `(id, title)` pairs, oldest first.
    pub fn list_boards(&self) -> Result<Vec<(BoardId, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title FROM boards ORDER BY created_at, rowid")?;
        let boards = stmt
            .query_map([], |row| {
                Ok((BoardId::new(row.get::<_, String>(0)?), row.get(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(boards)
    }

    /// Create an empty board.
    pub fn create_board(&mut self, title: &str) -> Result<Board> {
        validate_title(title)?;
        let now = Utc::now();
        let id = unique_id(&self.conn, "boards", "board", title, &now)?;
        self.conn.execute(
            "INSERT INTO boards (id, title, created_at) VALUES (?1, ?2, ?3)",
            params![id, title, now.to_rfc3339()],
        )?;
        debug!(board_id = %id, "board created");
        Ok(Board::new(id, title))
    }

    /// Delete a board with all its lists and cards.
    pub fn delete_board(&mut self, board_id: &BoardId) -> Result<()> {
        let affected = self.conn.execute(
            "DELETE FROM boards WHERE id = ?1",
            params![board_id.as_str()],
        )?;
        if affected == 0 {
            return Err(Error::BoardNotFound(board_id.to_string()));
        }
        Ok(())
    }

    /// Append a new list to a board.
    pub fn create_list(&mut self, board_id: &BoardId, title: &str) -> Result<List> {
        validate_title(title)?;
        let tx = self.conn.transaction()?;
        if !exists(&tx, "boards", board_id.as_str())? {
            return Err(Error::BoardNotFound(board_id.to_string()));
        }

        let now = Utc::now();
        let position = list_ids_of(&tx, board_id.as_str())?.len();
        let id = unique_id(&tx, "lists", "list", title, &now)?;
        tx.execute(
            "INSERT INTO lists (id, board_id, title, position, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, board_id.as_str(), title, position as i64, now.to_rfc3339()],
        )?;
        tx.commit()?;

        debug!(list_id = %id, %board_id, position, "list created");
        Ok(List::new(id, board_id.clone(), title, position as Order))
    }

    /// Apply a partial update to a list.
    pub fn update_list(&mut self, list_id: &ListId, patch: &ListPatch) -> Result<List> {
        if let Some(title) = &patch.title {
            validate_title(title)?;
            let affected = self.conn.execute(
                "UPDATE lists SET title = ?1 WHERE id = ?2",
                params![title, list_id.as_str()],
            )?;
            if affected == 0 {
                return Err(Error::ListNotFound(list_id.to_string()));
            }
        }
        load_list(&self.conn, list_id.as_str())
    }

    /// Delete a list with its cards and close the gap in the board.
    pub fn delete_list(&mut self, list_id: &ListId) -> Result<()> {
        let tx = self.conn.transaction()?;
        let board_id = board_of_list(&tx, list_id.as_str())?
            .ok_or_else(|| Error::ListNotFound(list_id.to_string()))?;

        tx.execute("DELETE FROM lists WHERE id = ?1", params![list_id.as_str()])?;
        let remaining = list_ids_of(&tx, &board_id)?;
        write_list_positions(&tx, &remaining)?;
        tx.commit()?;
        Ok(())
    }

    /// Replace the list order of a board.
    ///
    /// `list_ids` must name exactly the lists currently on the board, otherwise
    /// the request is stale and rejected with [`Error::Conflict`].
    pub fn reorder_lists(&mut self, board_id: &BoardId, list_ids: &[ListId]) -> Result<()> {
        let tx = self.conn.transaction()?;
        if !exists(&tx, "boards", board_id.as_str())? {
            return Err(Error::BoardNotFound(board_id.to_string()));
        }

        let mut current = list_ids_of(&tx, board_id.as_str())?;
        let requested: Vec<String> = list_ids.iter().map(|id| id.as_str().to_string()).collect();
        let mut sorted = requested.clone();
        current.sort();
        sorted.sort();
        if current != sorted {
            return Err(Error::Conflict(format!(
                "list order for board {board_id} does not match its lists"
            )));
        }

        write_list_positions(&tx, &requested)?;
        tx.commit()?;
        Ok(())
    }

    /// Create a card at the requested order, clamped to the list length.
    pub fn create_card(&mut self, list_id: &ListId, card: &NewCard) -> Result<Card> {
        validate_title(&card.title)?;
        let tx = self.conn.transaction()?;
        if !exists(&tx, "lists", list_id.as_str())? {
            return Err(Error::ListNotFound(list_id.to_string()));
        }

        let now = Utc::now();
        let mut siblings = card_ids_of(&tx, list_id.as_str())?;
        let at = (card.order as usize).min(siblings.len());
        let id = unique_id(&tx, "cards", "card", &card.title, &now)?;
        tx.execute(
            &format!(
                "INSERT INTO cards ({CARD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                id,
                list_id.as_str(),
                card.title,
                card.description,
                card.due_date.map(|d| d.to_rfc3339()),
                false,
                card.status.as_str(),
                at as i64,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;
        set_assignees(&tx, &id, &card.assignees)?;
        siblings.insert(at, id.clone());
        write_card_positions(&tx, list_id.as_str(), &siblings)?;

        let created = load_card(&tx, &id)?;
        tx.commit()?;
        debug!(card_id = %id, %list_id, order = at, "card created");
        Ok(created)
    }

    /// Apply a partial update to a card's content fields.
    pub fn update_card(&mut self, card_id: &CardId, patch: &CardPatch) -> Result<Card> {
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }
        let tx = self.conn.transaction()?;
        let mut card = load_card(&tx, card_id.as_str())?;
        patch.apply_to(&mut card, Utc::now());

        tx.execute(
            "UPDATE cards SET title = ?1, description = ?2, due_date = ?3, completed = ?4,
                              status = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                card.title,
                card.description,
                card.due_date.map(|d| d.to_rfc3339()),
                card.completed,
                card.status.as_str(),
                card.updated_at.to_rfc3339(),
                card_id.as_str(),
            ],
        )?;
        if let Some(assignees) = &patch.assignees {
            set_assignees(&tx, card_id.as_str(), assignees)?;
        }
        tx.commit()?;
        Ok(card)
    }

    /// Delete a card and close the gap in its list.
    pub fn delete_card(&mut self, card_id: &CardId) -> Result<()> {
        let tx = self.conn.transaction()?;
        let list_id = list_of_card(&tx, card_id.as_str())?
            .ok_or_else(|| Error::CardNotFound(card_id.to_string()))?;

        tx.execute("DELETE FROM cards WHERE id = ?1", params![card_id.as_str()])?;
        let remaining = card_ids_of(&tx, &list_id)?;
        write_card_positions(&tx, &list_id, &remaining)?;
        tx.commit()?;
        Ok(())
    }

    /// Move a card to `order` in `list_id`, clamping past-the-end positions.
    ///
    /// A card or list that no longer exists is a [`Error::Conflict`]: the
    /// client moved something another actor removed.
    pub fn move_card(&mut self, card_id: &CardId, list_id: &ListId, order: Order) -> Result<Card> {
        let tx = self.conn.transaction()?;
        let source = list_of_card(&tx, card_id.as_str())?
            .ok_or_else(|| Error::Conflict(format!("card {card_id} no longer exists")))?;
        let Some(target_board) = board_of_list(&tx, list_id.as_str())? else {
            return Err(Error::Conflict(format!("list {list_id} no longer exists")));
        };
        // Cards never leave their board.
        if board_of_list(&tx, &source)?.as_deref() != Some(target_board.as_str()) {
            return Err(Error::Conflict(format!(
                "list {list_id} is on another board than card {card_id}"
            )));
        }

        let mut source_ids = card_ids_of(&tx, &source)?;
        source_ids.retain(|id| id != card_id.as_str());
        if source != list_id.as_str() {
            write_card_positions(&tx, &source, &source_ids)?;
            source_ids = card_ids_of(&tx, list_id.as_str())?;
        }
        let at = (order as usize).min(source_ids.len());
        source_ids.insert(at, card_id.as_str().to_string());
        write_card_positions(&tx, list_id.as_str(), &source_ids)?;

        tx.execute(
            "UPDATE cards SET updated_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), card_id.as_str()],
        )?;
        let moved = load_card(&tx, card_id.as_str())?;
        tx.commit()?;
        debug!(%card_id, from = %source, to = %list_id, order = at, "card moved");
        Ok(moved)
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
