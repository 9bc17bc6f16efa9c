//! Fullscreen presentation controller
//!
//! Holds which single feed item, if any, is shown fullscreen. Requests coming
//! from the UI are intents: they change the state optimistically and return
//! `PlatformIntent`s for the event loop to carry out. Platform notifications
//! are the only source of truth for whether fullscreen is active, so an exit
//! the app never asked for (Escape handled by the platform) still lands here.

use crate::feed::EntryKey;

/// Render surface of a feed item; the item's feed key
pub type SurfaceId = EntryKey;

/// Which item, if any, is focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationState {
    Idle,
    /// Feed index at the moment focus was requested
    Focused(usize),
}

/// Work the event loop must hand to the fullscreen platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformIntent {
    /// Issue after the frame containing the surface has been drawn
    EnterFullscreen(SurfaceId),
    ExitFullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Focus {
    index: usize,
    surface: SurfaceId,
}

#[derive(Debug, Default)]
pub struct PresentationController {
    focus: Option<Focus>,
    /// Last fullscreen element reported by the platform
    platform_active: Option<SurfaceId>,
    exit_pending: bool,
}

impl PresentationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PresentationState {
        match self.focus {
            Some(focus) => PresentationState::Focused(focus.index),
            None => PresentationState::Idle,
        }
    }

    pub fn focused_surface(&self) -> Option<SurfaceId> {
        self.focus.map(|f| f.surface)
    }

    /// Whether the platform last reported an active fullscreen element
    pub fn platform_active(&self) -> Option<SurfaceId> {
        self.platform_active
    }

    /// Focus item `index`. The caller guarantees the index is rendered.
    ///
    /// While another item is focused this is a no-op: focus has to be
    /// released before it can move.
    pub fn request_focus(&mut self, index: usize, surface: SurfaceId) -> Vec<PlatformIntent> {
        if let Some(current) = self.focus {
            tracing::debug!(
                "Ignoring focus request for item {} while item {} is focused",
                index,
                current.index
            );
            return Vec::new();
        }

        self.focus = Some(Focus { index, surface });
        vec![PlatformIntent::EnterFullscreen(surface)]
    }

    /// Leave fullscreen. Never fails, whatever the current state.
    pub fn request_exit(&mut self) -> Vec<PlatformIntent> {
        self.focus = None;

        if self.platform_active.is_some() && !self.exit_pending {
            self.exit_pending = true;
            vec![PlatformIntent::ExitFullscreen]
        } else {
            Vec::new()
        }
    }

    /// Platform reported a change of fullscreen element
    pub fn on_fullscreen_change(&mut self, active: Option<SurfaceId>) -> Vec<PlatformIntent> {
        self.platform_active = active;

        match active {
            None => {
                self.exit_pending = false;
                if let Some(focus) = self.focus.take() {
                    tracing::debug!("Fullscreen ended by the platform, unfocusing item {}", focus.index);
                }
                Vec::new()
            }
            Some(surface) if self.focused_surface() == Some(surface) => Vec::new(),
            Some(surface) => {
                // Fullscreen is showing something nobody asked for anymore
                if self.exit_pending {
                    return Vec::new();
                }
                tracing::debug!("Stray fullscreen surface {:?}, exiting", surface);
                self.exit_pending = true;
                vec![PlatformIntent::ExitFullscreen]
            }
        }
    }

    /// Platform refused to enter fullscreen for `surface`
    pub fn on_fullscreen_error(&mut self, surface: SurfaceId, reason: &str) {
        if self.focused_surface() == Some(surface) {
            tracing::warn!("Fullscreen request rejected: {}", reason);
            self.focus = None;
        } else {
            tracing::debug!("Ignoring stale fullscreen rejection for {:?}", surface);
        }
    }

    /// Key presses are observed only; Escape is left to the platform
    pub fn on_key(&self, key: &str) {
        tracing::trace!("Key observed: {}", key);
    }
}
