//! Inspector Common - Shared model and protocol library for the request inspector
//!
//! This crate contains the captured request record published by the inspection
//! backend and the Engine.IO / Socket.IO framing used by its live stream.

mod protocol;
mod record;

use thiserror::Error;

pub use protocol::{EnginePacket, OpenHandshake, ServerEvent, SocketPacket};
pub use record::{CapturedRequest, TIMESTAMP_FORMAT};

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Empty packet")]
    Empty,

    #[error("Unknown packet type: {0:?}")]
    UnknownPacketType(char),

    #[error("Invalid JSON payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Unsupported packet: {0}")]
    Unsupported(&'static str),

    #[error("Invalid message format")]
    InvalidFormat,
}

/// Constants for the backend contract
pub mod constants {
    /// Backend used when nothing else is configured
    pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

    /// Snapshot endpoint, returns every stored request newest-first
    pub const SNAPSHOT_PATH: &str = "/requests";

    /// Socket.IO endpoint path
    pub const SOCKET_PATH: &str = "/socket.io/";

    /// Engine.IO protocol revision spoken by the backend
    pub const ENGINE_IO_VERSION: u8 = 4;

    /// Event carrying one freshly captured request
    pub const NEW_REQUEST_EVENT: &str = "new_request";

    /// Default namespace
    pub const DEFAULT_NAMESPACE: &str = "/";
}
