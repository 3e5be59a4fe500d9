//! Application state composition.
//!
//! ```text
//! AppState
//! ├── page: Page                (Session Navigator current page)
//! ├── session: SessionState     (persisted context the navigator mutates)
//! ├── focus: Focus              (sidebar selector vs page content)
//! ├── chat / history / samples  (per-page feature state)
//! ├── notices                   (severity-tagged status messages)
//! └── model_ready / model_error (one-time model construction outcome)
//! ```
//!
//! The model handle itself stays with the runtime, which is the only part
//! that talks to the server; the reducer and views only need the outcome.

use gemchat_core::config::Config;
use gemchat_core::session::SessionState;
use ratatui::style::{Color, Style};

use crate::features::chat::ChatState;
use crate::features::history::HistoryState;
use crate::features::samples::SamplesState;
use crate::nav::{self, Page};

/// Which pane receives non-global keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Content,
}

/// Severity tag for user-visible notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn style(self) -> Style {
        match self {
            Severity::Success => Style::default().fg(Color::Green),
            Severity::Warning => Style::default().fg(Color::Yellow),
            Severity::Error => Style::default().fg(Color::Red),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Severity::Success => "✔",
            Severity::Warning => "⚠",
            Severity::Error => "✖",
        }
    }
}

/// A user-visible, severity-tagged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Top-level TUI state.
pub struct AppState {
    pub should_quit: bool,
    /// Current page (Session Navigator state).
    pub page: Page,
    /// Persisted session context; the navigator mutates it explicitly.
    pub session: SessionState,
    pub focus: Focus,
    /// Selector row highlighted in the sidebar.
    pub sidebar_cursor: usize,
    /// Whether the one-time model construction succeeded.
    pub model_ready: bool,
    /// Failure reason when it did not.
    pub model_error: Option<String>,
    pub config: Config,
    /// Most recent notices, newest last. Bounded.
    pub notices: Vec<Notice>,
    pub chat: ChatState,
    pub history: HistoryState,
    pub samples: SamplesState,
}

/// Notices kept in the sidebar before old ones fall off.
const MAX_NOTICES: usize = 4;

impl AppState {
    pub fn new(
        config: Config,
        mut session: SessionState,
        model_ready: bool,
        model_error: Option<String>,
        startup_notices: Vec<Notice>,
    ) -> Self {
        let page = nav::resolve(&mut session);

        let mut state = Self {
            should_quit: false,
            page,
            session,
            focus: Focus::Content,
            sidebar_cursor: page.index(),
            model_ready,
            model_error,
            config,
            notices: Vec::new(),
            chat: ChatState::default(),
            history: HistoryState::default(),
            samples: SamplesState::default(),
        };

        for notice in startup_notices {
            state.push_notice(notice);
        }
        state
    }

    /// Records a notice in the sidebar and mirrors it into the transcript.
    pub fn push_notice(&mut self, notice: Notice) {
        self.chat.push_system(notice.clone());
        self.notices.push(notice);
        if self.notices.len() > MAX_NOTICES {
            self.notices.remove(0);
        }
    }
}

#[cfg(test)]
pub mod test_support {
    //! Constructors for reducer tests.

    use super::*;

    pub fn app_with_page(page: &str, model_ready: bool) -> AppState {
        AppState::new(
            Config::default(),
            SessionState {
                page: page.to_string(),
            },
            model_ready,
            (!model_ready).then(|| "model unavailable".to_string()),
            Vec::new(),
        )
    }
}
