// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cb-remote: Reference board server for corkboard.
//!
//! Holds the canonical boards in SQLite and answers board requests over
//! WebSocket. Every write renumbers the affected list or board densely, so
//! clients can always trust the orders it returns.

mod server;
#[cfg(test)]
mod server_tests;
mod state;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// cb-remote: Board server for corkboard
#[derive(Parser, Debug)]
#[command(name = "cb-remote")]
#[command(about = "WebSocket board server for corkboard")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:7890")]
    bind: SocketAddr,

    /// Directory for database storage
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Create a board with this title at startup
    #[arg(long, value_name = "TITLE")]
    seed_board: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting cb-remote server");
    info!("  Bind address: {}", args.bind);
    info!("  Data directory: {}", args.data.display());

    let state = state::ServerState::new(&args.data)?;

    if let Some(title) = &args.seed_board {
        let board = state.create_board(title).await?;
        info!("  Seeded board: {} ({})", board.id, board.title);
    }
    for (id, title) in state.boards().await? {
        info!("  Board: {} ({})", id, title);
    }

    // Run server
    server::run(args.bind, state).await?;

    Ok(())
}
