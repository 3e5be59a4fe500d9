//! Session Navigator: the page-selection state machine.
//!
//! One page is current at any time. The persisted value lives in the session
//! context (a string, so stale or hand-edited files can hold anything);
//! resolution fails open to the first page instead of surfacing an error.
//! Page changes flow through [`select`], which produces the effects the host
//! loop executes: persist, exactly one redraw, and the target page's
//! on-entry load. Re-selecting the current page is a no-op.

use gemchat_core::session::SessionState;

use crate::effects::UiEffect;

/// A top-level view. The selector presents these in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Chat,
    History,
    Samples,
}

impl Page {
    /// Ordered list backing the sidebar selector.
    pub const ALL: [Page; 3] = [Page::Chat, Page::History, Page::Samples];

    /// Stable name used in the persisted session.
    pub fn name(self) -> &'static str {
        match self {
            Page::Chat => "chat",
            Page::History => "history",
            Page::Samples => "samples",
        }
    }

    /// Display title.
    pub fn title(self) -> &'static str {
        match self {
            Page::Chat => "Chat",
            Page::History => "History",
            Page::Samples => "Sample data",
        }
    }

    /// Fixed selector icon.
    pub fn icon(self) -> &'static str {
        match self {
            Page::Chat => "◆",
            Page::History => "◎",
            Page::Samples => "▤",
        }
    }

    /// Position in [`Page::ALL`].
    pub fn index(self) -> usize {
        Page::ALL
            .iter()
            .position(|p| *p == self)
            .unwrap_or_default()
    }

    fn from_name(name: &str) -> Option<Page> {
        Page::ALL.iter().copied().find(|p| p.name() == name)
    }
}

/// Resolves the persisted page, failing open to the first page.
///
/// An unrecognized stored value is corrected in place so the session file
/// converges back to a valid state on the next save. Never errors.
pub fn resolve(session: &mut SessionState) -> Page {
    match Page::from_name(&session.page) {
        Some(page) => page,
        None => {
            let fallback = Page::ALL[0];
            session.page = fallback.name().to_string();
            fallback
        }
    }
}

/// Reconciles a selection against the current page.
///
/// A self-transition produces no effects (and so no redraw). A change
/// overwrites both the live page and the session context, then asks the
/// host for one immediate redraw plus the selected page's on-entry load.
pub fn select(current: &mut Page, session: &mut SessionState, selected: Page) -> Vec<UiEffect> {
    if selected == *current {
        return Vec::new();
    }

    *current = selected;
    session.page = selected.name().to_string();

    let mut effects = vec![UiEffect::PersistSession, UiEffect::Redraw];
    if let Some(load) = on_entry_effect(selected) {
        effects.push(load);
    }
    effects
}

/// Effects for the first pass of a session, after the page is resolved.
/// The restored page gets its on-entry load just like a selected one.
pub fn initial_effects(page: Page) -> Vec<UiEffect> {
    on_entry_effect(page).into_iter().collect()
}

/// Data pages refresh from the store when entered; chat keeps its transcript.
fn on_entry_effect(page: Page) -> Option<UiEffect> {
    match page {
        Page::Chat => None,
        Page::History => Some(UiEffect::LoadHistory),
        Page::Samples => Some(UiEffect::LoadSamples),
    }
}

/// What the main area shows for a page.
///
/// The chat view requires a usable model handle; without one the page shows
/// a failure notice and the chat widgets are not drawn at all. The other
/// pages are independent of model state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    Chat,
    ChatUnavailable,
    History,
    Samples,
}

pub fn render_target(page: Page, model_ready: bool) -> RenderTarget {
    match page {
        Page::Chat => {
            if model_ready {
                RenderTarget::Chat
            } else {
                RenderTarget::ChatUnavailable
            }
        }
        Page::History => RenderTarget::History,
        Page::Samples => RenderTarget::Samples,
    }
}
