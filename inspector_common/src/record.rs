//! Captured request record
//!
//! The schema is owned by the inspection backend. Every field is optional so a
//! record from a newer or older backend still decodes; unknown keys are kept in
//! `extra`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Timestamp format used by the backend (e.g. `17-Oct-2026 03:04:05 PM`)
pub const TIMESTAMP_FORMAT: &str = "%d-%b-%Y %I:%M:%S %p";

/// One HTTP request captured by the inspection backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapturedRequest {
    pub timestamp: Option<String>,
    pub method: Option<String>,
    pub scheme: Option<String>,
    pub path: Option<String>,
    pub full_url: Option<String>,
    pub host: Option<String>,

    /// Raw `Host` header as received (the backend substitutes a marker when absent)
    #[serde(rename = "Host_header")]
    pub host_header: Option<String>,

    #[serde(default)]
    pub headers: Map<String, Value>,

    /// Query parameters
    #[serde(default)]
    pub args: Map<String, Value>,

    #[serde(rename = "json-data")]
    pub json_data: Option<Value>,

    #[serde(rename = "form-data", default)]
    pub form_data: Map<String, Value>,

    #[serde(rename = "raw-data")]
    pub raw_data: Option<String>,

    #[serde(default)]
    pub cookies: Map<String, Value>,

    pub authorization: Option<String>,
    pub origin: Option<String>,

    #[serde(rename = "client-ip")]
    pub client_ip: Option<String>,

    /// Fields this client does not know about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CapturedRequest {
    /// HTTP method, or `?` if the backend did not send one
    pub fn method_str(&self) -> &str {
        self.method.as_deref().unwrap_or("?")
    }

    /// Request path, or `/` if the backend did not send one
    pub fn path_str(&self) -> &str {
        self.path.as_deref().unwrap_or("/")
    }

    /// Short `METHOD /path` label
    pub fn summary(&self) -> String {
        format!("{} {}", self.method_str(), self.path_str())
    }

    /// Parse the backend timestamp
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        let raw = self.timestamp.as_deref()?;
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok()
    }

    /// Compact `HH:MM:SS` time for list views, falling back to the raw text
    pub fn display_time(&self) -> String {
        match self.parsed_timestamp() {
            Some(ts) => ts.format("%H:%M:%S").to_string(),
            None => self.timestamp.clone().unwrap_or_default(),
        }
    }
}
