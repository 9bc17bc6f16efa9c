//! Request card view model shared by the TUI and plain output

use inspector_common::CapturedRequest;
use serde_json::Value;

/// Single `label: value` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardField {
    pub label: &'static str,
    pub value: String,
}

/// Labelled JSON (or raw text) block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonBlock {
    pub label: &'static str,
    pub text: String,
}

/// Everything a card shows for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub fields: Vec<CardField>,
    pub blocks: Vec<JsonBlock>,
}

impl Card {
    pub fn from_request(req: &CapturedRequest) -> Self {
        let field = |label: &'static str, value: &Option<String>| CardField {
            label,
            value: value.clone().unwrap_or_else(|| "-".to_string()),
        };

        let fields = vec![
            field("Timestamp", &req.timestamp),
            field("Scheme", &req.scheme),
            field("Full URL", &req.full_url),
            field("Host", &req.host),
            field("Host Header", &req.host_header),
            field("Origin", &req.origin),
            field("Client IP", &req.client_ip),
        ];

        let text_value = |value: &Option<String>| match value {
            Some(text) => Value::String(text.clone()),
            None => Value::Null,
        };

        let blocks = [
            json_block("Authorization", &text_value(&req.authorization)),
            json_block("Cookies", &Value::Object(req.cookies.clone())),
            json_block("Query Params", &Value::Object(req.args.clone())),
            json_block("JSON Payload", req.json_data.as_ref().unwrap_or(&Value::Null)),
            json_block("Form Data", &Value::Object(req.form_data.clone())),
            json_block("Raw Body", &text_value(&req.raw_data)),
            json_block("Headers", &Value::Object(req.headers.clone())),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self {
            title: req.summary(),
            fields,
            blocks,
        }
    }
}

/// Build a block, or `None` when there is nothing worth showing.
///
/// Null, blank strings, empty objects and empty arrays are hidden. Bare
/// numbers and booleans are hidden as well.
pub fn json_block(label: &'static str, content: &Value) -> Option<JsonBlock> {
    let text = match content {
        Value::String(text) if !text.trim().is_empty() => text.clone(),
        Value::Object(map) if !map.is_empty() => serde_json::to_string_pretty(content).ok()?,
        Value::Array(items) if !items.is_empty() => serde_json::to_string_pretty(content).ok()?,
        _ => return None,
    };

    Some(JsonBlock { label, text })
}
