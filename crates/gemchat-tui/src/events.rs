//! UI event types.
//!
//! Events are inputs to the reducer: terminal input, the tick clock, and
//! results of work the runtime performed (generation tasks, store queries).
//! Errors arrive pre-rendered as strings so events stay `Send + 'static`.

use gemchat_core::db::{ChatRecord, Feedback, SampleRecord};

use crate::state::Notice;

/// A finished generation, already recorded to the store when possible.
#[derive(Debug, Clone)]
pub struct ReplyOutcome {
    pub answer: String,
    /// Seconds the generation request took.
    pub response_time: f64,
    /// Row id of the recorded interaction; None when recording failed.
    pub record_id: Option<i64>,
    /// Present when the reply arrived but recording it failed.
    pub save_error: Option<String>,
}

#[derive(Debug)]
pub enum UiEvent {
    /// Periodic clock for animations and batched rendering.
    Tick,

    /// Raw terminal input.
    Terminal(crossterm::event::Event),

    /// A generation task finished (successfully or not).
    ReplyReady { outcome: Result<ReplyOutcome, String> },

    /// Feedback was written to the store (or failed to).
    FeedbackSaved {
        record_id: i64,
        feedback: Feedback,
        result: Result<(), String>,
    },

    /// History page data arrived.
    HistoryLoaded { result: Result<Vec<ChatRecord>, String> },

    /// Samples page data arrived.
    SamplesLoaded { result: Result<Vec<SampleRecord>, String> },

    /// A severity-tagged message for the notice area.
    Notice(Notice),
}
