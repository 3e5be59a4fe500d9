//! Command handlers.

use anyhow::{Context, Result};
use gemchat_core::config::paths;
use gemchat_core::db::{Database, seed};
use tracing::warn;

pub mod chat;
pub mod config;
pub mod data;
pub mod history;

/// Opens the store for a non-TUI subcommand.
///
/// Mirrors the startup sequence: a database failure is fatal, a seeding
/// failure only warns.
pub fn open_store() -> Result<Database> {
    let db = Database::open(&paths::db_path()).context("Database initialization failed")?;
    if let Err(err) = seed::ensure_seed_data(&db) {
        warn!(error = %format!("{err:#}"), "sample data seeding failed");
    }
    Ok(db)
}
