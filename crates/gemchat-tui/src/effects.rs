//! UI effect types.
//!
//! Effects are commands returned by the reducer for the runtime to execute.
//! They cover I/O and task spawning only; the reducer itself never touches
//! the terminal, the store, or the network.

use gemchat_core::db::Feedback;

/// Effects returned by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Restart the rendering pass immediately, without waiting for the next
    /// tick. Emitted exactly once per page change.
    Redraw,

    /// Persist the session context (current page) to disk. Best effort.
    PersistSession,

    /// Spawn a generation task for a submitted question.
    StartGeneration { question: String },

    /// Store a rating (and optional correction) for a recorded interaction
    /// and recompute its metrics.
    SubmitFeedback {
        record_id: i64,
        feedback: Feedback,
        correction: Option<String>,
    },

    /// Reload the history page from the store.
    LoadHistory,

    /// Delete one history record, then reload.
    DeleteHistory { id: i64 },

    /// Reload the samples page from the store.
    LoadSamples,

    /// Insert a user-provided sample pair, then reload.
    AddSample { question: String, answer: String },

    /// Delete one sample row, then reload.
    DeleteSample { id: i64 },

    /// Replace all samples with the built-in set, then reload.
    ResetSamples,
}
