//! TUI runtime - owns the terminal, runs the event loop, executes effects.
//!
//! The reducer stays pure and produces effects; all I/O happens here. Async
//! results (generation replies) arrive through an inbox channel drained each
//! frame; store operations are fast and run inline, feeding their results
//! straight back through the reducer.

use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use gemchat_core::config::Config;
use gemchat_core::db::{Database, Feedback, seed};
use gemchat_core::llm::ModelStatus;
use gemchat_core::metrics;
use gemchat_core::session::SessionState;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tracing::warn;

use crate::effects::UiEffect;
use crate::events::{ReplyOutcome, UiEvent};
use crate::state::{AppState, Notice};
use crate::{nav, render, terminal, update};

/// Frame cadence while a generation is streaming in.
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Poll cadence when idle.
const IDLE_POLL_DURATION: Duration = Duration::from_millis(150);

/// Completed Q/A pairs carried as context per generation.
const CONTEXT_TURNS: usize = 8;

/// Full-screen TUI runtime.
///
/// Terminal state is restored on drop, panic, and quit.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    db: Database,
    /// Process-wide model construction outcome; the handle inside is the
    /// only route to the server.
    model: &'static ModelStatus,
    inbox_tx: mpsc::UnboundedSender<UiEvent>,
    inbox_rx: mpsc::UnboundedReceiver<UiEvent>,
    last_tick: Instant,
    dirty: bool,
}

impl TuiRuntime {
    /// Creates the runtime: panic hook, raw mode, alternate screen, state.
    pub fn new(
        config: Config,
        session: SessionState,
        db: Database,
        model: &'static ModelStatus,
        startup_notices: Vec<Notice>,
    ) -> Result<Self> {
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let state = AppState::new(
            config,
            session,
            model.is_ready(),
            model.error().map(str::to_string),
            startup_notices,
        );

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        Ok(Self {
            terminal,
            state,
            db,
            model,
            inbox_tx,
            inbox_rx,
            last_tick: Instant::now(),
            dirty: true,
        })
    }

    /// Runs the event loop until quit.
    pub fn run(&mut self) -> Result<()> {
        // On-entry load for the page restored from the session.
        self.execute_effects(nav::initial_effects(self.state.page));
        self.event_loop()
    }

    fn event_loop(&mut self) -> Result<()> {
        while !self.state.should_quit {
            for event in self.collect_events()? {
                let marks_dirty = matches!(&event, UiEvent::Tick | UiEvent::Terminal(_));
                let effects = update::update(&mut self.state, event);
                if marks_dirty {
                    self.dirty = true;
                }
                self.execute_effects(effects);
            }

            if self.dirty {
                self.terminal
                    .draw(|frame| render::render(&self.state, frame))?;
                self.dirty = false;
            }
        }
        Ok(())
    }

    /// Collects pending events: inbox results, terminal input, and the tick.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        let tick_interval = if self.state.chat.generating {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        // Block until the next tick is due unless there is already work.
        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    /// Feeds a runtime-produced event back through the reducer.
    fn dispatch_event(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.state, event);
        self.dirty = true;
        self.execute_effects(effects);
    }

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => self.state.should_quit = true,
            UiEffect::Redraw => self.dirty = true,
            UiEffect::PersistSession => {
                // Best effort; a read-only home should not break navigation.
                if let Err(err) = self.state.session.save() {
                    warn!(error = %format!("{err:#}"), "failed to persist session");
                }
            }
            UiEffect::StartGeneration { question } => self.spawn_generation(question),
            UiEffect::SubmitFeedback {
                record_id,
                feedback,
                correction,
            } => {
                let result = store_feedback(&self.db, record_id, feedback, correction.as_deref())
                    .map_err(|err| format!("{err:#}"));
                self.dispatch_event(UiEvent::FeedbackSaved {
                    record_id,
                    feedback,
                    result,
                });
            }
            UiEffect::LoadHistory => {
                let result = self
                    .db
                    .list_history(self.state.config.history_limit, false)
                    .map_err(|err| format!("{err:#}"));
                self.dispatch_event(UiEvent::HistoryLoaded { result });
            }
            UiEffect::DeleteHistory { id } => {
                let notice = match self.db.delete_chat(id) {
                    Ok(true) => Notice::success(format!("Deleted record #{id}")),
                    Ok(false) => Notice::warning(format!("Record #{id} was already gone")),
                    Err(err) => Notice::error(format!("Failed to delete record #{id}: {err:#}")),
                };
                self.dispatch_event(UiEvent::Notice(notice));
                self.execute_effect(UiEffect::LoadHistory);
            }
            UiEffect::LoadSamples => {
                let result = self.db.list_samples().map_err(|err| format!("{err:#}"));
                self.dispatch_event(UiEvent::SamplesLoaded { result });
            }
            UiEffect::AddSample { question, answer } => {
                let notice = match self.db.add_sample(&question, &answer, "user") {
                    Ok(id) => Notice::success(format!("Added sample #{id}")),
                    Err(err) => Notice::error(format!("Failed to add sample: {err:#}")),
                };
                self.dispatch_event(UiEvent::Notice(notice));
                self.execute_effect(UiEffect::LoadSamples);
            }
            UiEffect::DeleteSample { id } => {
                let notice = match self.db.delete_sample(id) {
                    Ok(true) => Notice::success(format!("Deleted sample #{id}")),
                    Ok(false) => Notice::warning(format!("Sample #{id} was already gone")),
                    Err(err) => Notice::error(format!("Failed to delete sample #{id}: {err:#}")),
                };
                self.dispatch_event(UiEvent::Notice(notice));
                self.execute_effect(UiEffect::LoadSamples);
            }
            UiEffect::ResetSamples => {
                let notice = match seed::reset_samples(&self.db) {
                    Ok(count) => Notice::success(format!("Restored {count} built-in samples")),
                    Err(err) => Notice::error(format!("Failed to reset samples: {err:#}")),
                };
                self.dispatch_event(UiEvent::Notice(notice));
                self.execute_effect(UiEffect::LoadSamples);
            }
        }
    }

    /// Spawns a generation task; the reply comes back through the inbox.
    fn spawn_generation(&mut self, question: String) {
        let Some(handle) = self.model.handle() else {
            // Unreachable through the UI: chat input is disabled without a
            // model. Degrade to an error reply anyway.
            self.dispatch_event(UiEvent::ReplyReady {
                outcome: Err("model unavailable".to_string()),
            });
            return;
        };

        let turns = self.state.chat.context_turns(CONTEXT_TURNS);
        let db = self.db.clone();
        let tx = self.inbox_tx.clone();

        tokio::spawn(async move {
            let outcome = match handle.generate(&question, &turns).await {
                Ok(reply) => {
                    let (record_id, save_error) =
                        match db.insert_chat(&question, &reply.content, reply.response_time) {
                            Ok(id) => (Some(id), None),
                            Err(err) => (None, Some(format!("{err:#}"))),
                        };
                    Ok(ReplyOutcome {
                        answer: reply.content,
                        response_time: reply.response_time,
                        record_id,
                        save_error,
                    })
                }
                Err(err) => Err(format!("{err:#}")),
            };
            let _ = tx.send(UiEvent::ReplyReady { outcome });
        });
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        let _ = terminal::restore_terminal();
    }
}

/// Recomputes metrics and writes the rating.
///
/// Reference preference: the correction supplied now, then a correction
/// stored earlier, then the matching sample answer.
fn store_feedback(
    db: &Database,
    record_id: i64,
    feedback: Feedback,
    correction: Option<&str>,
) -> Result<()> {
    let record = db
        .get_chat(record_id)?
        .with_context(|| format!("No chat record with id {record_id}"))?;

    let stored_correction = correction
        .map(str::to_string)
        .or_else(|| record.correct_answer.clone());
    let reference = match &stored_correction {
        Some(text) => Some(text.clone()),
        None => db.reference_answer_for(&record.question)?,
    };

    let scores = metrics::evaluate(&record.question, &record.answer, reference.as_deref());
    db.update_feedback(record_id, feedback, stored_correction.as_deref(), &scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_feedback_uses_correction_as_reference() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_chat("q", "rust is a language", 0.1).unwrap();

        store_feedback(&db, id, Feedback::Bad, Some("rust is a language")).unwrap();

        let record = db.get_chat(id).unwrap().unwrap();
        assert_eq!(record.feedback, Some(Feedback::Bad));
        assert_eq!(record.correct_answer.as_deref(), Some("rust is a language"));
        // Answer equals the correction, so reference scores are perfect.
        assert!(record.bleu_score.unwrap() > 0.99);
    }

    #[test]
    fn test_store_feedback_falls_back_to_sample_reference() {
        let db = Database::open_in_memory().unwrap();
        db.add_sample("what is rust?", "rust is a systems language", "seed")
            .unwrap();
        let id = db
            .insert_chat("what is rust?", "rust is a systems language", 0.1)
            .unwrap();

        store_feedback(&db, id, Feedback::Good, None).unwrap();

        let record = db.get_chat(id).unwrap().unwrap();
        assert_eq!(record.correct_answer, None);
        assert!(record.bleu_score.unwrap() > 0.99);
    }

    #[test]
    fn test_store_feedback_without_reference_zeroes_scores() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_chat("unmatched", "free-form answer", 0.1).unwrap();

        store_feedback(&db, id, Feedback::Good, None).unwrap();

        let record = db.get_chat(id).unwrap().unwrap();
        assert_eq!(record.bleu_score, Some(0.0));
        assert_eq!(record.similarity_score, Some(0.0));
    }

    #[test]
    fn test_store_feedback_keeps_earlier_correction() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_chat("q", "answer", 0.1).unwrap();

        store_feedback(&db, id, Feedback::Bad, Some("corrected")).unwrap();
        // Re-rating without a new correction keeps the stored one.
        store_feedback(&db, id, Feedback::Good, None).unwrap();

        let record = db.get_chat(id).unwrap().unwrap();
        assert_eq!(record.feedback, Some(Feedback::Good));
        assert_eq!(record.correct_answer.as_deref(), Some("corrected"));
    }

    #[test]
    fn test_store_feedback_missing_record() {
        let db = Database::open_in_memory().unwrap();
        assert!(store_feedback(&db, 42, Feedback::Good, None).is_err());
    }
}
