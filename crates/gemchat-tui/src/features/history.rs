//! History page: browse, inspect, and delete recorded interactions.

use crossterm::event::{KeyCode, KeyEvent};
use gemchat_core::db::{ChatRecord, Feedback};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::common::{format_timestamp, truncate_with_ellipsis, wrap_text};
use crate::effects::UiEffect;

#[derive(Debug, Default)]
pub struct HistoryState {
    pub rows: Vec<ChatRecord>,
    pub cursor: usize,
    /// Show the full record for the selected row.
    pub expanded: bool,
    /// False until the first load completes.
    pub loaded: bool,
}

impl HistoryState {
    pub fn set_rows(&mut self, rows: Vec<ChatRecord>) {
        self.rows = rows;
        self.loaded = true;
        self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
    }

    pub fn selected(&self) -> Option<&ChatRecord> {
        self.rows.get(self.cursor)
    }
}

pub fn handle_key(state: &mut HistoryState, key: KeyEvent) -> Vec<UiEffect> {
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
        KeyCode::Enter => {
            if state.selected().is_some() {
                state.expanded = !state.expanded;
            }
            Vec::new()
        }
        KeyCode::Esc => {
            state.expanded = false;
            Vec::new()
        }
        KeyCode::Char('d') => match state.selected() {
            Some(record) => vec![UiEffect::DeleteHistory { id: record.id }],
            None => Vec::new(),
        },
        KeyCode::Char('r') => vec![UiEffect::LoadHistory],
        _ => Vec::new(),
    }
}

pub fn render(frame: &mut Frame, area: Rect, state: &HistoryState) {
    if state.expanded && state.selected().is_some() {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);
        render_list(frame, chunks[0], state);
        render_detail(frame, chunks[1], state);
    } else {
        render_list(frame, area, state);
    }
}

fn render_list(frame: &mut Frame, area: Rect, state: &HistoryState) {
    let width = area.width.saturating_sub(2) as usize;
    let mut lines: Vec<Line<'static>> = Vec::new();

    if state.rows.is_empty() {
        let message = if state.loaded {
            "No interactions recorded yet."
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
    for (i, record) in state.rows.iter().enumerate().skip(first).take(height.max(1)) {
        let marker = if i == state.cursor { "▸ " } else { "  " };
        let feedback = match record.feedback {
            Some(Feedback::Good) => Span::styled("✔", Style::default().fg(Color::Green)),
            Some(Feedback::Bad) => Span::styled("✘", Style::default().fg(Color::Red)),
            None => Span::styled("·", Style::default().fg(Color::DarkGray)),
        };

        let question_width = width.saturating_sub(30).max(8);
        let mut style = Style::default();
        if i == state.cursor {
            style = style.add_modifier(Modifier::BOLD);
        }

        lines.push(Line::from(vec![
            Span::styled(marker.to_string(), style),
            Span::styled(
                format!("#{:<4} ", record.id),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                format!("{} ", format_timestamp(&record.timestamp)),
                Style::default().fg(Color::DarkGray),
            ),
            feedback,
            Span::styled(
                format!(" {}", truncate_with_ellipsis(&record.question, question_width)),
                style,
            ),
        ]));
    }

    let title = format!("History ({} shown)", state.rows.len());
    let widget =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(widget, area);
}

fn render_detail(frame: &mut Frame, area: Rect, state: &HistoryState) {
    let Some(record) = state.selected() else {
        return;
    };
    let width = area.width.saturating_sub(2).max(1) as usize;
    let mut lines: Vec<Line<'static>> = Vec::new();

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    lines.push(Line::from(Span::styled("Question", label)));
    for l in wrap_text(&record.question, width) {
        lines.push(Line::from(l));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Answer", label)));
    for l in wrap_text(&record.answer, width) {
        lines.push(Line::from(l));
    }

    if let Some(correct) = &record.correct_answer {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Corrected answer", label)));
        for l in wrap_text(correct, width) {
            lines.push(Line::from(l));
        }
    }

    lines.push(Line::default());
    let mut meta = format!(
        "response: {:.1}s   feedback: {}",
        record.response_time,
        record
            .feedback
            .map_or("unrated", gemchat_core::db::Feedback::label)
    );
    if let (Some(bleu), Some(similarity), Some(relevance)) = (
        record.bleu_score,
        record.similarity_score,
        record.relevance_score,
    ) {
        meta.push_str(&format!(
            "   bleu: {bleu:.2}   similarity: {similarity:.2}   relevance: {relevance:.2}"
        ));
    }
    lines.push(Line::from(Span::styled(
        meta,
        Style::default().fg(Color::DarkGray),
    )));

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Record #{}", record.id)),
    );
    frame.render_widget(widget, area);
}
