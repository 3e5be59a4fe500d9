//! Pure view functions for the TUI.
//!
//! Functions here take `&AppState`, draw to a ratatui frame, and never
//! mutate state or return effects. The page dispatch matches exhaustively
//! on the navigator's render target, so an unhandled page is a compile
//! error.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::common::truncate_with_ellipsis;
use crate::features::{chat, history, samples};
use crate::nav::{Page, RenderTarget, render_target};
use crate::state::{AppState, Focus};

/// Sidebar width, selector plus status.
const SIDEBAR_WIDTH: u16 = 28;

/// Height of the hint line below the content.
const STATUS_HEIGHT: u16 = 1;

/// Renders the entire TUI to the frame.
pub fn render(state: &AppState, frame: &mut Frame) {
    let area = frame.area();

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(area);

    render_sidebar(frame, columns[0], state);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(STATUS_HEIGHT)])
        .split(columns[1]);

    render_page(frame, rows[0], state);
    render_status_line(frame, rows[1], state);
}

/// Exhaustive page dispatch. Chat renders only with a usable model; the
/// failure notice path never calls into the chat view.
fn render_page(frame: &mut Frame, area: Rect, state: &AppState) {
    match render_target(state.page, state.model_ready) {
        RenderTarget::Chat => chat::render(frame, area, &state.chat),
        RenderTarget::ChatUnavailable => {
            chat::render_unavailable(frame, area, state.model_error.as_deref());
        }
        RenderTarget::History => history::render(frame, area, &state.history),
        RenderTarget::Samples => samples::render(frame, area, &state.samples),
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, state: &AppState) {
    let inner_width = area.width.saturating_sub(2) as usize;
    let mut lines: Vec<Line<'static>> = Vec::new();

    lines.push(Line::from(Span::styled(
        "GemChat",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(divider(inner_width));

    for (i, page) in Page::ALL.iter().enumerate() {
        let is_current = *page == state.page;
        let is_highlighted = state.focus == Focus::Sidebar && i == state.sidebar_cursor;

        let mut style = Style::default();
        if is_current {
            style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
        }
        if is_highlighted {
            style = style.add_modifier(Modifier::REVERSED);
        }

        lines.push(Line::from(Span::styled(
            format!(
                "{} {} {} {}",
                if is_current { "▸" } else { " " },
                i + 1,
                page.icon(),
                page.title()
            ),
            style,
        )));
    }

    lines.push(divider(inner_width));

    // Model status (the one-time construction outcome).
    if state.model_ready {
        lines.push(Line::from(Span::styled(
            "✔ Model ready",
            Style::default().fg(Color::Green),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "✖ Model unavailable",
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(Span::styled(
        truncate_with_ellipsis(&state.config.model, inner_width),
        Style::default().fg(Color::DarkGray),
    )));

    if !state.notices.is_empty() {
        lines.push(divider(inner_width));
        for notice in &state.notices {
            lines.push(Line::from(Span::styled(
                truncate_with_ellipsis(
                    &format!("{} {}", notice.severity.symbol(), notice.message),
                    inner_width,
                ),
                notice.severity.style(),
            )));
        }
    }

    lines.push(divider(inner_width));
    lines.push(Line::from(Span::styled(
        "tab: pages  ctrl+c: quit",
        Style::default().fg(Color::DarkGray),
    )));

    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn render_status_line(frame: &mut Frame, area: Rect, state: &AppState) {
    let hint = match state.focus {
        Focus::Sidebar => "↑/↓ choose page · enter open · 1-3 jump · esc back",
        Focus::Content => match render_target(state.page, state.model_ready) {
            RenderTarget::Chat => {
                "enter send · ↑/↓ prompt history · ctrl+g/ctrl+b rate · pgup/pgdn scroll"
            }
            RenderTarget::ChatUnavailable => "chat disabled · tab to switch pages",
            RenderTarget::History => "↑/↓ select · enter detail · d delete · r reload",
            RenderTarget::Samples => "a add · d delete · r reload · ctrl+r restore built-ins",
        },
    };

    let widget = Paragraph::new(Line::from(Span::styled(
        hint,
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(widget, area);
}

fn divider(width: usize) -> Line<'static> {
    Line::from(Span::styled(
        "─".repeat(width.max(1)),
        Style::default().fg(Color::DarkGray),
    ))
}
