//! Chat page: prompt, transcript, feedback capture.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use gemchat_core::db::Feedback;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::common::wrap_text;
use crate::effects::UiEffect;
use crate::events::ReplyOutcome;
use crate::features::input::InputState;
use crate::state::{Notice, Severity};

/// Spinner frames shown while a generation is in flight.
pub const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

/// One transcript entry.
#[derive(Debug)]
pub enum ChatCell {
    User(String),
    Assistant {
        text: String,
        /// Store row id; None when recording the interaction failed.
        record_id: Option<i64>,
        response_time: f64,
        feedback: Option<Feedback>,
    },
    System(Notice),
}

/// Correction prompt opened by a negative rating.
#[derive(Debug)]
pub struct CorrectionPrompt {
    pub record_id: i64,
    pub input: InputState,
}

#[derive(Debug, Default)]
pub struct ChatState {
    pub input: InputState,
    pub cells: Vec<ChatCell>,
    pub generating: bool,
    pub spinner_frame: usize,
    /// Lines scrolled up from the bottom of the transcript.
    pub scroll_offset: usize,
    pub correction: Option<CorrectionPrompt>,
}

impl ChatState {
    pub fn push_system(&mut self, notice: Notice) {
        self.cells.push(ChatCell::System(notice));
    }

    /// Latest answer that was recorded and can take a rating.
    fn last_ratable(&self) -> Option<i64> {
        self.cells.iter().rev().find_map(|cell| match cell {
            ChatCell::Assistant {
                record_id: Some(id),
                ..
            } => Some(*id),
            _ => None,
        })
    }

    /// Marks the rating on the matching transcript cell.
    pub fn apply_feedback(&mut self, record_id: i64, feedback: Feedback) {
        for cell in &mut self.cells {
            if let ChatCell::Assistant {
                record_id: Some(id),
                feedback: slot,
                ..
            } = cell
                && *id == record_id
            {
                *slot = Some(feedback);
            }
        }
    }

    /// Conversation context for the next generation: completed Q/A pairs.
    pub fn context_turns(&self, limit: usize) -> Vec<gemchat_core::llm::ChatTurn> {
        let mut turns = Vec::new();
        let mut pending_question: Option<&str> = None;
        for cell in &self.cells {
            match cell {
                ChatCell::User(q) => pending_question = Some(q),
                ChatCell::Assistant { text, .. } => {
                    if let Some(question) = pending_question.take() {
                        turns.push(gemchat_core::llm::ChatTurn {
                            question: question.to_string(),
                            answer: text.clone(),
                        });
                    }
                }
                ChatCell::System(_) => {}
            }
        }
        let skip = turns.len().saturating_sub(limit);
        turns.split_off(skip)
    }
}

// ----------------------------------------------------------------------
// Update
// ----------------------------------------------------------------------

/// Handles a key on the chat page. Only called when the model is usable;
/// with a failed model the page renders a notice and takes no input.
pub fn handle_key(state: &mut ChatState, key: KeyEvent) -> Vec<UiEffect> {
    if state.correction.is_some() {
        return handle_correction_key(state, key);
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => {
            if state.generating {
                return Vec::new();
            }
            let Some(question) = state.input.submit() else {
                return Vec::new();
            };
            state.cells.push(ChatCell::User(question.clone()));
            state.generating = true;
            state.scroll_offset = 0;
            vec![UiEffect::StartGeneration { question }]
        }
        KeyCode::Char('g') if ctrl => rate(state, Feedback::Good),
        KeyCode::Char('b') if ctrl => {
            // Negative ratings may carry a corrected answer; open the prompt.
            if let Some(record_id) = state.last_ratable() {
                state.correction = Some(CorrectionPrompt {
                    record_id,
                    input: InputState::new(),
                });
            }
            Vec::new()
        }
        KeyCode::Up => {
            state.input.recall_prev();
            Vec::new()
        }
        KeyCode::Down => {
            state.input.recall_next();
            Vec::new()
        }
        KeyCode::PageUp => {
            state.scroll_offset = state.scroll_offset.saturating_add(5);
            Vec::new()
        }
        KeyCode::PageDown => {
            state.scroll_offset = state.scroll_offset.saturating_sub(5);
            Vec::new()
        }
        KeyCode::Backspace => {
            state.input.delete_back();
            Vec::new()
        }
        KeyCode::Delete => {
            state.input.delete_forward();
            Vec::new()
        }
        KeyCode::Left => {
            state.input.move_left();
            Vec::new()
        }
        KeyCode::Right => {
            state.input.move_right();
            Vec::new()
        }
        KeyCode::Home => {
            state.input.move_home();
            Vec::new()
        }
        KeyCode::End => {
            state.input.move_end();
            Vec::new()
        }
        KeyCode::Char(c) if !ctrl => {
            state.input.insert_char(c);
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn handle_correction_key(state: &mut ChatState, key: KeyEvent) -> Vec<UiEffect> {
    let Some(prompt) = state.correction.as_mut() else {
        return Vec::new();
    };

    match key.code {
        KeyCode::Esc => {
            // Abandons the rating entirely.
            state.correction = None;
            Vec::new()
        }
        KeyCode::Enter => {
            let record_id = prompt.record_id;
            let correction = prompt.input.submit();
            state.correction = None;
            vec![UiEffect::SubmitFeedback {
                record_id,
                feedback: Feedback::Bad,
                correction,
            }]
        }
        KeyCode::Backspace => {
            prompt.input.delete_back();
            Vec::new()
        }
        KeyCode::Left => {
            prompt.input.move_left();
            Vec::new()
        }
        KeyCode::Right => {
            prompt.input.move_right();
            Vec::new()
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            prompt.input.insert_char(c);
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn rate(state: &mut ChatState, feedback: Feedback) -> Vec<UiEffect> {
    match state.last_ratable() {
        Some(record_id) => vec![UiEffect::SubmitFeedback {
            record_id,
            feedback,
            correction: None,
        }],
        None => Vec::new(),
    }
}

/// Applies a finished generation to the transcript.
pub fn on_reply(state: &mut ChatState, outcome: Result<ReplyOutcome, String>) {
    state.generating = false;
    state.scroll_offset = 0;

    match outcome {
        Ok(reply) => {
            state.cells.push(ChatCell::Assistant {
                text: reply.answer,
                record_id: reply.record_id,
                response_time: reply.response_time,
                feedback: None,
            });
            if let Some(save_error) = reply.save_error {
                state.push_system(Notice::warning(format!(
                    "Reply shown but not recorded: {save_error}"
                )));
            }
        }
        Err(error) => {
            state.push_system(Notice::error(format!("Generation failed: {error}")));
        }
    }
}

// ----------------------------------------------------------------------
// Render
// ----------------------------------------------------------------------

pub fn render(frame: &mut Frame, area: Rect, state: &ChatState) {
    let input_title = if state.correction.is_some() {
        "Correct answer (Enter to save, Esc to discard)"
    } else {
        "Ask (Enter to send)"
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    render_transcript(frame, chunks[0], state);

    let active_input = state
        .correction
        .as_ref()
        .map_or(&state.input, |prompt| &prompt.input);

    let input_line = Line::from(vec![
        Span::styled("❯ ", Style::default().fg(Color::Cyan)),
        Span::raw(active_input.value().to_string()),
    ]);
    let input_widget = Paragraph::new(input_line)
        .block(Block::default().borders(Borders::ALL).title(input_title));
    frame.render_widget(input_widget, chunks[1]);

    // Place the cursor inside the input box.
    let cursor_x = chunks[1].x + 3 + active_input.cursor() as u16;
    let max_x = chunks[1].x + chunks[1].width.saturating_sub(2);
    frame.set_cursor_position((cursor_x.min(max_x), chunks[1].y + 1));
}

fn render_transcript(frame: &mut Frame, area: Rect, state: &ChatState) {
    let width = area.width.saturating_sub(2).max(1) as usize;
    let mut lines: Vec<Line<'static>> = Vec::new();

    for cell in &state.cells {
        match cell {
            ChatCell::User(text) => {
                push_wrapped(
                    &mut lines,
                    "you    ",
                    text,
                    width,
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    Style::default(),
                );
            }
            ChatCell::Assistant {
                text,
                response_time,
                feedback,
                ..
            } => {
                push_wrapped(
                    &mut lines,
                    "gemma  ",
                    text,
                    width,
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    Style::default(),
                );
                lines.push(meta_line(*response_time, *feedback));
            }
            ChatCell::System(notice) => {
                push_wrapped(
                    &mut lines,
                    "•      ",
                    &notice.message,
                    width,
                    notice.severity.style(),
                    notice.severity.style(),
                );
            }
        }
        lines.push(Line::default());
    }

    if state.generating {
        let spinner = SPINNER_FRAMES[state.spinner_frame % SPINNER_FRAMES.len()];
        lines.push(Line::from(Span::styled(
            format!("{spinner} thinking…"),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let height = area.height.saturating_sub(2) as usize;
    let max_offset = lines.len().saturating_sub(height);
    let offset = max_offset.saturating_sub(state.scroll_offset.min(max_offset));
    let visible: Vec<Line<'static>> = lines.into_iter().skip(offset).take(height).collect();

    let widget = Paragraph::new(visible)
        .block(Block::default().borders(Borders::ALL).title("Transcript"));
    frame.render_widget(widget, area);
}

fn push_wrapped(
    lines: &mut Vec<Line<'static>>,
    prefix: &str,
    text: &str,
    width: usize,
    prefix_style: Style,
    body_style: Style,
) {
    let body_width = width.saturating_sub(prefix.len()).max(1);
    for (i, wrapped) in wrap_text(text, body_width).into_iter().enumerate() {
        let lead = if i == 0 {
            Span::styled(prefix.to_string(), prefix_style)
        } else {
            Span::raw(" ".repeat(prefix.len()))
        };
        lines.push(Line::from(vec![lead, Span::styled(wrapped, body_style)]));
    }
}

fn meta_line(response_time: f64, feedback: Option<Feedback>) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("       {response_time:.1}s"),
        Style::default().fg(Color::DarkGray),
    )];
    match feedback {
        Some(Feedback::Good) => spans.push(Span::styled(
            "  ✔ good",
            Style::default().fg(Color::Green),
        )),
        Some(Feedback::Bad) => spans.push(Span::styled("  ✘ bad", Style::default().fg(Color::Red))),
        None => spans.push(Span::styled(
            "  rate: ctrl+g / ctrl+b",
            Style::default().fg(Color::DarkGray),
        )),
    }
    Line::from(spans)
}

/// Failure notice shown instead of the chat view when the model is missing.
pub fn render_unavailable(frame: &mut Frame, area: Rect, reason: Option<&str>) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Chat is unavailable: the model failed to load.",
            Severity::Error.style(),
        )),
        Line::default(),
    ];
    if let Some(reason) = reason {
        for wrapped in wrap_text(reason, area.width.saturating_sub(4).max(1) as usize) {
            lines.push(Line::from(Span::raw(wrapped)));
        }
        lines.push(Line::default());
    }
    lines.push(Line::from(Span::styled(
        "History and sample data remain available from the sidebar.",
        Style::default().fg(Color::DarkGray),
    )));

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Chat"));
    frame.render_widget(widget, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    fn state_with_reply(record_id: Option<i64>) -> ChatState {
        let mut state = ChatState::default();
        state.cells.push(ChatCell::User("q".to_string()));
        state.cells.push(ChatCell::Assistant {
            text: "a".to_string(),
            record_id,
            response_time: 0.1,
            feedback: None,
        });
        state
    }

    #[test]
    fn test_enter_submits_question() {
        let mut state = ChatState::default();
        for c in "hello".chars() {
            handle_key(&mut state, key(KeyCode::Char(c)));
        }
        let effects = handle_key(&mut state, key(KeyCode::Enter));

        assert_eq!(
            effects,
            vec![UiEffect::StartGeneration {
                question: "hello".to_string()
            }]
        );
        assert!(state.generating);
        assert!(matches!(&state.cells[0], ChatCell::User(q) if q == "hello"));
    }

    #[test]
    fn test_enter_ignored_while_generating() {
        let mut state = ChatState::default();
        state.generating = true;
        handle_key(&mut state, key(KeyCode::Char('x')));
        let effects = handle_key(&mut state, key(KeyCode::Enter));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_blank_enter_is_ignored() {
        let mut state = ChatState::default();
        let effects = handle_key(&mut state, key(KeyCode::Enter));
        assert!(effects.is_empty());
        assert!(state.cells.is_empty());
    }

    #[test]
    fn test_good_rating_targets_last_recorded_reply() {
        let mut state = state_with_reply(Some(7));
        let effects = handle_key(&mut state, ctrl('g'));
        assert_eq!(
            effects,
            vec![UiEffect::SubmitFeedback {
                record_id: 7,
                feedback: Feedback::Good,
                correction: None,
            }]
        );
    }

    #[test]
    fn test_rating_without_recorded_reply_is_a_no_op() {
        let mut state = state_with_reply(None);
        assert!(handle_key(&mut state, ctrl('g')).is_empty());
        assert!(handle_key(&mut state, ctrl('b')).is_empty());
        assert!(state.correction.is_none());
    }

    #[test]
    fn test_bad_rating_opens_correction_prompt() {
        let mut state = state_with_reply(Some(3));
        handle_key(&mut state, ctrl('b'));
        assert_eq!(state.correction.as_ref().map(|p| p.record_id), Some(3));

        for c in "better".chars() {
            handle_key(&mut state, key(KeyCode::Char(c)));
        }
        let effects = handle_key(&mut state, key(KeyCode::Enter));
        assert_eq!(
            effects,
            vec![UiEffect::SubmitFeedback {
                record_id: 3,
                feedback: Feedback::Bad,
                correction: Some("better".to_string()),
            }]
        );
        assert!(state.correction.is_none());
    }

    #[test]
    fn test_empty_correction_submits_rating_only() {
        let mut state = state_with_reply(Some(3));
        handle_key(&mut state, ctrl('b'));
        let effects = handle_key(&mut state, key(KeyCode::Enter));
        assert_eq!(
            effects,
            vec![UiEffect::SubmitFeedback {
                record_id: 3,
                feedback: Feedback::Bad,
                correction: None,
            }]
        );
    }

    #[test]
    fn test_escape_abandons_rating() {
        let mut state = state_with_reply(Some(3));
        handle_key(&mut state, ctrl('b'));
        let effects = handle_key(&mut state, key(KeyCode::Esc));
        assert!(effects.is_empty());
        assert!(state.correction.is_none());
    }

    #[test]
    fn test_reply_success_appends_assistant_cell() {
        let mut state = ChatState::default();
        state.generating = true;
        on_reply(
            &mut state,
            Ok(ReplyOutcome {
                answer: "an answer".to_string(),
                response_time: 1.5,
                record_id: Some(1),
                save_error: None,
            }),
        );
        assert!(!state.generating);
        assert!(matches!(
            state.cells.last(),
            Some(ChatCell::Assistant { record_id: Some(1), .. })
        ));
    }

    #[test]
    fn test_reply_failure_appends_error_notice() {
        let mut state = ChatState::default();
        state.generating = true;
        on_reply(&mut state, Err("boom".to_string()));
        assert!(!state.generating);
        assert!(matches!(
            state.cells.last(),
            Some(ChatCell::System(notice)) if notice.severity == Severity::Error
        ));
    }

    #[test]
    fn test_feedback_marks_matching_cell() {
        let mut state = state_with_reply(Some(5));
        state.apply_feedback(5, Feedback::Good);
        assert!(matches!(
            state.cells.last(),
            Some(ChatCell::Assistant { feedback: Some(Feedback::Good), .. })
        ));
    }

    #[test]
    fn test_context_turns_pairs_and_limits() {
        let mut state = ChatState::default();
        for i in 0..3 {
            state.cells.push(ChatCell::User(format!("q{i}")));
            state.cells.push(ChatCell::Assistant {
                text: format!("a{i}"),
                record_id: None,
                response_time: 0.0,
                feedback: None,
            });
        }
        // Unanswered trailing question is not context.
        state.cells.push(ChatCell::User("pending".to_string()));

        let turns = state.context_turns(2);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].question, "q1");
        assert_eq!(turns[1].question, "q2");
    }
}
