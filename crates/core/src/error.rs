// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for cb-core operations.

use thiserror::Error;

use crate::invariant::InvariantViolation;

/// All possible errors that can occur in cb-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("board not found: {0}")]
    BoardNotFound(String),

    #[error("list not found: {0}")]
    ListNotFound(String),

    #[error("card not found: {0}")]
    CardNotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("invalid status: '{0}'\n  hint: valid statuses are: backlog, todo, in_progress, in_review, done")]
    InvalidStatus(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(#[from] InvariantViolation),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

impl Error {
    /// Returns true for errors caused by a referenced entity that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::BoardNotFound(_) | Error::ListNotFound(_) | Error::CardNotFound(_)
        )
    }
}

/// A specialized Result type for cb-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
