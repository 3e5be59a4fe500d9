//! Chat command handler: the full startup sequence, then the TUI.
//!
//! Bootstrap order and failure policy:
//! 1. file logging        - never blocks startup
//! 2. metrics resources   - warning, metrics degrade
//! 3. database            - fatal, halts before any page dispatch
//! 4. seed data           - warning
//! 5. model handle        - cached once per process; failure disables chat
//!    but leaves the other pages usable

use anyhow::{Context, Result};
use gemchat_core::config::{Config, paths};
use gemchat_core::db::{Database, seed};
use gemchat_core::llm::{self, ModelStatus};
use gemchat_core::{logging, metrics};
use gemchat_tui::Notice;

pub async fn run(config: Config) -> Result<()> {
    // Keep the guard alive so buffered log lines flush on exit.
    let _log_guard = match logging::init_file_logging(&paths::logs_dir()) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: file logging disabled: {err:#}");
            None
        }
    };

    let mut notices = Vec::new();

    if let Err(err) = metrics::initialize(&paths::data_dir()) {
        notices.push(Notice::warning(format!(
            "Metrics initialization failed: {err:#}"
        )));
    }

    let db = Database::open(&paths::db_path()).context("Database initialization failed")?;

    match seed::ensure_seed_data(&db) {
        Ok(0) => {}
        Ok(count) => notices.push(Notice::success(format!(
            "Seeded {count} sample Q/A pairs"
        ))),
        Err(err) => notices.push(Notice::warning(format!(
            "Sample data seeding failed: {err:#}"
        ))),
    }

    let status = llm::load_cached(&config).await;
    match status {
        ModelStatus::Ready(handle) => notices.push(Notice::success(format!(
            "Model '{}' ready (device: {}, server {})",
            handle.model,
            handle.device.label(),
            handle.server_version
        ))),
        ModelStatus::Failed(reason) => {
            notices.push(Notice::error(format!("Model load failed: {reason}")));
            notices.push(Notice::warning(
                "Chat is disabled. Check the model server, the model name, and connectivity.",
            ));
        }
    }

    gemchat_tui::run_chat_ui(config, db, status, notices).await
}
