// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync client configuration.
//!
//! Stored as TOML. Every key is optional:
//!
//! ```toml
//! url = "ws://localhost:7890"
//! max_retries = 10
//! initial_delay_ms = 100
//! max_delay_secs = 30
//! request_timeout_ms = 10000   # 0 disables the timeout
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::{SyncError, SyncResult};

/// Configuration for the remote client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// URL of the board server.
    pub url: String,
    /// Maximum connection attempts.
    pub max_retries: u32,
    /// Initial delay for exponential backoff (milliseconds).
    pub initial_delay_ms: u64,
    /// Maximum delay between connection attempts (seconds).
    pub max_delay_secs: u64,
    /// Time to wait for a response (milliseconds). 0 = wait forever.
    pub request_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            url: "ws://localhost:7890".to_string(),
            max_retries: 10,
            initial_delay_ms: 100,
            max_delay_secs: 30,
            request_timeout_ms: 10_000,
        }
    }
}

impl SyncConfig {
    /// Config pointing at `url` with default tuning.
    pub fn for_url(url: impl Into<String>) -> Self {
        SyncConfig {
            url: url.into(),
            ..SyncConfig::default()
        }
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("failed to read config: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> SyncResult<Self> {
        toml::from_str(content)
            .map_err(|e| SyncError::Config(format!("failed to parse config: {}", e)))
    }

    /// The request timeout, or `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    /// Delay before the next connection attempt, given the previous delay.
    pub(crate) fn next_delay(&self, previous: Duration) -> Duration {
        let cap = Duration::from_secs(self.max_delay_secs);
        std::cmp::min(previous.saturating_mul(2), cap)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
