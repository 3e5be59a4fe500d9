//! Sample-data page: manage the Q/A pairs used as metric references.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use gemchat_core::db::SampleRecord;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::common::truncate_with_ellipsis;
use crate::effects::UiEffect;
use crate::features::input::InputState;

/// Two-step entry flow for a new sample pair.
#[derive(Debug)]
pub enum AddFlow {
    Question { input: InputState },
    Answer { question: String, input: InputState },
}

#[derive(Debug, Default)]
pub struct SamplesState {
    pub rows: Vec<SampleRecord>,
    pub cursor: usize,
    pub adding: Option<AddFlow>,
    pub loaded: bool,
}

impl SamplesState {
    pub fn set_rows(&mut self, rows: Vec<SampleRecord>) {
        self.rows = rows;
        self.loaded = true;
        self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
    }

    pub fn selected(&self) -> Option<&SampleRecord> {
        self.rows.get(self.cursor)
    }
}

pub fn handle_key(state: &mut SamplesState, key: KeyEvent) -> Vec<UiEffect> {
    if state.adding.is_some() {
        return handle_add_key(state, key);
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            state.cursor = state.cursor.saturating_sub(1);
            Vec::new()
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.cursor + 1 < state.rows.len() {
                state.cursor += 1;
            }
            Vec::new()
        }
        KeyCode::Char('a') => {
            state.adding = Some(AddFlow::Question {
                input: InputState::new(),
            });
            Vec::new()
        }
        KeyCode::Char('d') => match state.selected() {
            Some(sample) => vec![UiEffect::DeleteSample { id: sample.id }],
            None => Vec::new(),
        },
        KeyCode::Char('r') if ctrl => vec![UiEffect::ResetSamples],
        KeyCode::Char('r') => vec![UiEffect::LoadSamples],
        _ => Vec::new(),
    }
}

fn handle_add_key(state: &mut SamplesState, key: KeyEvent) -> Vec<UiEffect> {
    let Some(flow) = state.adding.as_mut() else {
        return Vec::new();
    };

    let input = match flow {
        AddFlow::Question { input } | AddFlow::Answer { input, .. } => input,
    };

    match key.code {
        KeyCode::Esc => {
            state.adding = None;
            Vec::new()
        }
        KeyCode::Enter => {
            let Some(text) = input.submit() else {
                return Vec::new();
            };
            match flow {
                AddFlow::Question { .. } => {
                    *flow = AddFlow::Answer {
                        question: text,
                        input: InputState::new(),
                    };
                    Vec::new()
                }
                AddFlow::Answer { question, .. } => {
                    let question = question.clone();
                    state.adding = None;
                    vec![UiEffect::AddSample {
                        question,
                        answer: text,
                    }]
                }
            }
        }
        KeyCode::Backspace => {
            input.delete_back();
            Vec::new()
        }
        KeyCode::Left => {
            input.move_left();
            Vec::new()
        }
        KeyCode::Right => {
            input.move_right();
            Vec::new()
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            input.insert_char(c);
            Vec::new()
        }
        _ => Vec::new(),
    }
}

pub fn render(frame: &mut Frame, area: Rect, state: &SamplesState) {
    let (list_area, entry_area) = if state.adding.is_some() {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(area);
        (chunks[0], Some(chunks[1]))
    } else {
        (area, None)
    };

    render_list(frame, list_area, state);

    if let (Some(entry_area), Some(flow)) = (entry_area, state.adding.as_ref()) {
        let (title, input) = match flow {
            AddFlow::Question { input } => ("New sample: question (Enter to continue)", input),
            AddFlow::Answer { input, .. } => ("New sample: answer (Enter to save)", input),
        };
        let line = Line::from(vec![
            Span::styled("❯ ", Style::default().fg(Color::Cyan)),
            Span::raw(input.value().to_string()),
        ]);
        let widget =
            Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(widget, entry_area);

        let cursor_x = entry_area.x + 3 + input.cursor() as u16;
        let max_x = entry_area.x + entry_area.width.saturating_sub(2);
        frame.set_cursor_position((cursor_x.min(max_x), entry_area.y + 1));
    }
}

fn render_list(frame: &mut Frame, area: Rect, state: &SamplesState) {
    let width = area.width.saturating_sub(2) as usize;
    let mut lines: Vec<Line<'static>> = Vec::new();

    if state.rows.is_empty() {
        let message = if state.loaded {
            "No samples. Press 'a' to add one or ctrl+r to restore built-ins."
        } else {
            "Loading…"
        };
        lines.push(Line::from(Span::styled(
            message,
            Style::default().fg(Color::DarkGray),
        )));
    }

    let height = area.height.saturating_sub(2) as usize;
    let first = state.cursor.saturating_sub(height.saturating_sub(1));
    for (i, sample) in state.rows.iter().enumerate().skip(first).take(height.max(1)) {
        let marker = if i == state.cursor { "▸ " } else { "  " };
        let mut style = Style::default();
        if i == state.cursor {
            style = style.add_modifier(Modifier::BOLD);
        }

        let half = width.saturating_sub(16).max(16) / 2;
        lines.push(Line::from(vec![
            Span::styled(marker.to_string(), style),
            Span::styled(
                format!("#{:<4} ", sample.id),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                format!("{:<6} ", sample.source),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                format!("{} ", truncate_with_ellipsis(&sample.question, half)),
                style,
            ),
            Span::styled(
                truncate_with_ellipsis(&sample.answer, half),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    let title = format!("Sample data ({} pairs)", state.rows.len());
    let widget =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(widget, area);
}
