//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(state, event)`
//! and executes the returned effects. Keys route by focus: the sidebar owns
//! navigation, the content pane delegates to the current page's feature
//! slice — and only when the Session Navigator's dispatch target says that
//! page is usable.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::features::{chat, history, samples};
use crate::nav::{self, Page, RenderTarget};
use crate::state::{AppState, Focus, Notice};

/// The main reducer function.
pub fn update(state: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            if state.chat.generating {
                state.chat.spinner_frame = state.chat.spinner_frame.wrapping_add(1);
            }
            Vec::new()
        }
        UiEvent::Terminal(event) => handle_terminal_event(state, &event),
        UiEvent::ReplyReady { outcome } => {
            chat::on_reply(&mut state.chat, outcome);
            Vec::new()
        }
        UiEvent::FeedbackSaved {
            record_id,
            feedback,
            result,
        } => {
            match result {
                Ok(()) => {
                    state.chat.apply_feedback(record_id, feedback);
                    state.push_notice(Notice::success(format!(
                        "Feedback recorded ({})",
                        feedback.label()
                    )));
                }
                Err(error) => {
                    state.push_notice(Notice::error(format!("Failed to save feedback: {error}")));
                }
            }
            Vec::new()
        }
        UiEvent::HistoryLoaded { result } => {
            match result {
                Ok(rows) => state.history.set_rows(rows),
                Err(error) => {
                    state.push_notice(Notice::error(format!("Failed to load history: {error}")));
                }
            }
            Vec::new()
        }
        UiEvent::SamplesLoaded { result } => {
            match result {
                Ok(rows) => state.samples.set_rows(rows),
                Err(error) => {
                    state.push_notice(Notice::error(format!("Failed to load samples: {error}")));
                }
            }
            Vec::new()
        }
        UiEvent::Notice(notice) => {
            state.push_notice(notice);
            Vec::new()
        }
    }
}

fn handle_terminal_event(state: &mut AppState, event: &Event) -> Vec<UiEffect> {
    let Event::Key(key) = event else {
        return Vec::new();
    };
    if key.kind != KeyEventKind::Press {
        return Vec::new();
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c' | 'q') if ctrl => return vec![UiEffect::Quit],
        KeyCode::Tab => {
            state.focus = match state.focus {
                Focus::Sidebar => Focus::Content,
                Focus::Content => {
                    state.sidebar_cursor = state.page.index();
                    Focus::Sidebar
                }
            };
            return Vec::new();
        }
        _ => {}
    }

    match state.focus {
        Focus::Sidebar => handle_sidebar_key(state, *key),
        Focus::Content => handle_content_key(state, *key),
    }
}

fn handle_sidebar_key(state: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            state.sidebar_cursor = state.sidebar_cursor.saturating_sub(1);
            Vec::new()
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.sidebar_cursor + 1 < Page::ALL.len() {
                state.sidebar_cursor += 1;
            }
            Vec::new()
        }
        KeyCode::Enter => select_page(state, Page::ALL[state.sidebar_cursor]),
        KeyCode::Char(c @ '1'..='3') => {
            let index = c as usize - '1' as usize;
            state.sidebar_cursor = index;
            select_page(state, Page::ALL[index])
        }
        KeyCode::Esc => {
            state.focus = Focus::Content;
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn select_page(state: &mut AppState, selected: Page) -> Vec<UiEffect> {
    let effects = nav::select(&mut state.page, &mut state.session, selected);
    if !effects.is_empty() {
        state.focus = Focus::Content;
    }
    effects
}

fn handle_content_key(state: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    match nav::render_target(state.page, state.model_ready) {
        RenderTarget::Chat => chat::handle_key(&mut state.chat, key),
        // The failure notice takes no input; navigation stays available.
        RenderTarget::ChatUnavailable => Vec::new(),
        RenderTarget::History => history::handle_key(&mut state.history, key),
        RenderTarget::Samples => samples::handle_key(&mut state.samples, key),
    }
}
