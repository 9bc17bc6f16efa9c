//! Fullscreen platform capability
//!
//! The platform owns the real fullscreen state. Requests are fire-and-forget;
//! their outcome arrives later as a `PlatformEvent` on the notification channel
//! handed out when the platform is created.

use crate::presentation::SurfaceId;
use crossterm::event::{KeyCode, KeyEvent};
use thiserror::Error;
use tokio::sync::mpsc;

/// Smallest terminal that can host a fullscreen card
pub const MIN_FULLSCREEN_WIDTH: u16 = 40;
pub const MIN_FULLSCREEN_HEIGHT: u16 = 12;

/// Notifications posted by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    /// Active fullscreen element changed, possibly to none
    FullscreenChanged(Option<SurfaceId>),
    /// An enter request was refused
    FullscreenError { surface: SurfaceId, reason: String },
    /// Informational key-press notification
    KeyPressed(String),
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("terminal is {width}x{height}, fullscreen needs at least {min_width}x{min_height}")]
    TooSmall {
        width: u16,
        height: u16,
        min_width: u16,
        min_height: u16,
    },
}

/// Browser-like fullscreen API
pub trait FullscreenPlatform {
    /// Ask for `surface` to go fullscreen. Outcome is notified later.
    fn request_fullscreen(&mut self, surface: SurfaceId);

    /// Ask to leave fullscreen. Outcome is notified later.
    fn exit_fullscreen(&mut self);

    /// Element currently in fullscreen
    fn fullscreen_element(&self) -> Option<SurfaceId>;
}

/// Fullscreen for the terminal dashboard: one card takes the whole screen
///
/// Escape is handled here, below the application: while a card is fullscreen
/// the platform swallows Escape and leaves fullscreen on its own, so the app
/// only learns about it through `FullscreenChanged(None)`.
pub struct TerminalFullscreen {
    active: Option<SurfaceId>,
    width: u16,
    height: u16,
    notify: mpsc::UnboundedSender<PlatformEvent>,
}

impl TerminalFullscreen {
    /// Create the platform and its notification listener
    pub fn new(width: u16, height: u16) -> (Self, mpsc::UnboundedReceiver<PlatformEvent>) {
        let (notify, listener) = mpsc::unbounded_channel();
        (
            Self {
                active: None,
                width,
                height,
                notify,
            },
            listener,
        )
    }

    /// Track the terminal size after a resize or draw
    pub fn set_area(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    fn post(&self, event: PlatformEvent) {
        if self.notify.send(event).is_err() {
            tracing::debug!("Fullscreen listener released, dropping notification");
        }
    }

    /// Offer a raw key to the platform before the app sees it.
    ///
    /// Returns `true` when the platform consumed the key.
    pub fn intercept_key(&mut self, key: &KeyEvent) -> bool {
        self.post(PlatformEvent::KeyPressed(format!("{:?}", key.code)));

        if key.code == KeyCode::Esc && self.active.is_some() {
            self.exit_fullscreen();
            return true;
        }
        false
    }
}

impl FullscreenPlatform for TerminalFullscreen {
    fn request_fullscreen(&mut self, surface: SurfaceId) {
        if self.width < MIN_FULLSCREEN_WIDTH || self.height < MIN_FULLSCREEN_HEIGHT {
            let error = PlatformError::TooSmall {
                width: self.width,
                height: self.height,
                min_width: MIN_FULLSCREEN_WIDTH,
                min_height: MIN_FULLSCREEN_HEIGHT,
            };
            self.post(PlatformEvent::FullscreenError {
                surface,
                reason: error.to_string(),
            });
            return;
        }

        if self.active != Some(surface) {
            self.active = Some(surface);
            self.post(PlatformEvent::FullscreenChanged(Some(surface)));
        }
    }

    fn exit_fullscreen(&mut self) {
        if self.active.take().is_some() {
            self.post(PlatformEvent::FullscreenChanged(None));
        }
    }

    fn fullscreen_element(&self) -> Option<SurfaceId> {
        self.active
    }
}
