//! TUI application state and event handling

use crate::dashboard::{Dashboard, DashboardMsg};
use crate::presentation::{PlatformIntent, PresentationState};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const PAGE: usize = 10;

/// TUI application state
pub struct TuiApp {
    pub dashboard: Dashboard,
    pub backend_url: String,
    pub selected_index: usize,
    pub detail_scroll: u16,
    pub should_quit: bool,
}

impl TuiApp {
    pub fn new(dashboard: Dashboard, backend_url: String) -> Self {
        Self {
            dashboard,
            backend_url,
            selected_index: 0,
            detail_scroll: 0,
            should_quit: false,
        }
    }

    pub fn is_focused(&self) -> bool {
        matches!(self.dashboard.presentation(), PresentationState::Focused(_))
    }

    /// Feed a message to the dashboard, keeping the list selection on the
    /// same request when newer ones are prepended above it.
    pub fn apply(&mut self, msg: DashboardMsg) -> Vec<PlatformIntent> {
        let selected = self.dashboard.feed().key_at(self.selected_index);
        let follow_head = self.selected_index == 0;
        let was_focused = self.is_focused();

        let keeps_selection = matches!(msg, DashboardMsg::LiveRequest(_));
        let intents = self.dashboard.update(msg);

        if keeps_selection && !follow_head {
            if let Some(position) = selected.and_then(|key| self.dashboard.feed().position_of(key)) {
                self.selected_index = position;
            }
        }
        self.clamp_selection();

        if was_focused != self.is_focused() {
            self.detail_scroll = 0;
        }

        intents
    }

    /// Close request for a focused card whose request left the feed
    pub fn reconcile_focus(&self) -> Option<DashboardMsg> {
        if self.is_focused() && self.dashboard.focused_entry().is_none() {
            Some(DashboardMsg::ExitRequested)
        } else {
            None
        }
    }

    fn clamp_selection(&mut self) {
        let last = self.dashboard.feed().len().saturating_sub(1);
        self.selected_index = self.selected_index.min(last);
    }

    /// Handle key events the platform did not consume
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<DashboardMsg> {
        if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
            self.should_quit = true;
            return None;
        }

        if self.is_focused() {
            self.handle_card_key(key)
        } else {
            self.handle_list_key(key)
        }
    }

    fn handle_card_key(&mut self, key: KeyEvent) -> Option<DashboardMsg> {
        match key.code {
            KeyCode::Char('x') | KeyCode::Char('q') => return Some(DashboardMsg::ExitRequested),
            KeyCode::Up | KeyCode::Char('k') => {
                self.detail_scroll = self.detail_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.detail_scroll = self.detail_scroll.saturating_add(1);
            }
            KeyCode::PageUp => {
                self.detail_scroll = self.detail_scroll.saturating_sub(PAGE as u16);
            }
            KeyCode::PageDown => {
                self.detail_scroll = self.detail_scroll.saturating_add(PAGE as u16);
            }
            KeyCode::Home => self.detail_scroll = 0,
            // Escape belongs to the platform
            _ => {}
        }
        None
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Option<DashboardMsg> {
        let last = self.dashboard.feed().len().saturating_sub(1);

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Enter | KeyCode::Char('f') => {
                if !self.dashboard.feed().is_empty() {
                    return Some(DashboardMsg::FocusRequested(self.selected_index));
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_index = self.selected_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_index = (self.selected_index + 1).min(last);
            }
            KeyCode::PageUp => {
                self.selected_index = self.selected_index.saturating_sub(PAGE);
            }
            KeyCode::PageDown => {
                self.selected_index = (self.selected_index + PAGE).min(last);
            }
            KeyCode::Home => self.selected_index = 0,
            KeyCode::End => self.selected_index = last,
            _ => {}
        }
        None
    }
}
