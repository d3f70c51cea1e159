// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cb-sync: Keeps a client board in step with the board server
//!
//! Moves are applied locally first and persisted in the background by the
//! [`Reconciler`]; any failed write resynchronizes the whole board.
//! [`BoardSession`] ties the pieces together for one open board.

pub mod client;
pub mod config;
pub mod lifecycle;
pub mod notify;
pub mod reconciler;
pub mod remote;
pub mod session;
pub mod transport;

#[cfg(test)]
mod test_helpers;

pub use client::{BoardSyncClient, BoxFuture, SyncError, SyncResult};
pub use config::SyncConfig;
pub use lifecycle::{CardManager, ListManager};
pub use notify::{ChannelNotifier, Level, Notification, Notifier, TracingNotifier};
pub use reconciler::{Reconciler, Reconciliation};
pub use remote::RemoteClient;
pub use session::BoardSession;
pub use transport::{Transport, TransportError, TransportFuture, TransportResult, WebSocketTransport};
