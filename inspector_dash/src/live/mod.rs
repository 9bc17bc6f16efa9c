//! Live stream of captured requests from the backend's Socket.IO endpoint

mod backoff;
mod client;

pub use backoff::Backoff;
pub use client::spawn_subscriber;

/// Live stream connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Connecting,
    Online,
    Reconnecting,
    Offline,
}

impl StreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamStatus::Connecting => "connecting",
            StreamStatus::Online => "online",
            StreamStatus::Reconnecting => "reconnecting",
            StreamStatus::Offline => "offline",
        }
    }
}
