//! Full-screen TUI for GemChat.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod nav;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, Write, stderr};

use anyhow::Result;
use gemchat_core::config::Config;
use gemchat_core::db::Database;
use gemchat_core::llm::ModelStatus;
use gemchat_core::session::SessionState;
pub use runtime::TuiRuntime;
pub use state::{Notice, Severity};

/// Runs the interactive chat UI until the user quits.
///
/// Must run inside a tokio runtime: generation requests are spawned as
/// tasks while the event loop occupies the calling thread.
pub async fn run_chat_ui(
    config: Config,
    db: Database,
    model: &'static ModelStatus,
    startup_notices: Vec<Notice>,
) -> Result<()> {
    // The UI needs a real terminal to own.
    if !stderr().is_terminal() {
        anyhow::bail!(
            "Chat mode requires a terminal.\n\
             Use `gemchat history list` or `gemchat data list` for non-interactive access."
        );
    }

    // Pre-TUI info to stderr; the alternate screen replaces it.
    let mut err = stderr();
    writeln!(err, "GemChat")?;
    writeln!(err, "Model: {}", config.model)?;
    for notice in &startup_notices {
        writeln!(err, "{} {}", notice.severity.symbol(), notice.message)?;
    }
    err.flush()?;

    let session = SessionState::load();
    let mut runtime = TuiRuntime::new(config, session, db, model, startup_notices)?;
    runtime.run()?;
    drop(runtime);

    writeln!(stderr(), "Goodbye!")?;
    Ok(())
}
