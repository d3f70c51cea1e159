// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[test]
fn defaults() {
    let config = SyncConfig::default();
    assert_eq!(config.url, "ws://localhost:7890");
    assert_eq!(config.max_retries, 10);
    assert_eq!(config.request_timeout(), Some(Duration::from_secs(10)));
}

#[test]
fn missing_keys_take_defaults() {
    let config = SyncConfig::from_toml_str("url = \"ws://board.example:9000\"\n").unwrap();

    assert_eq!(
        config,
        SyncConfig {
            url: "ws://board.example:9000".to_string(),
            ..SyncConfig::default()
        }
    );
}

#[test]
fn zero_timeout_disables_it() {
    let config = SyncConfig::from_toml_str("request_timeout_ms = 0").unwrap();
    assert_eq!(config.request_timeout(), None);
}

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sync.toml");
    std::fs::write(&path, "max_retries = 3\ninitial_delay_ms = 5\n").unwrap();

    let config = SyncConfig::load(&path).unwrap();

    assert_eq!(config.max_retries, 3);
    assert_eq!(config.initial_delay_ms, 5);
}

#[parameterized(
    missing_file = { None },
    bad_type = { Some("max_retries = \"many\"") },
    bad_syntax = { Some("url = ") },
)]
fn invalid_config_is_config_error(content: Option<&str>) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sync.toml");
    if let Some(content) = content {
        std::fs::write(&path, content).unwrap();
    }

    assert!(matches!(SyncConfig::load(&path), Err(SyncError::Config(_))));
}

#[test]
fn backoff_doubles_up_to_cap() {
    let config = SyncConfig {
        max_delay_secs: 1,
        ..SyncConfig::default()
    };

    assert_eq!(
        config.next_delay(Duration::from_millis(100)),
        Duration::from_millis(200)
    );
    assert_eq!(
        config.next_delay(Duration::from_millis(800)),
        Duration::from_secs(1)
    );
}
