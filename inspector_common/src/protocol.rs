//! Engine.IO v4 / Socket.IO v5 text framing
//!
//! Only the subset the live stream needs is covered: text packets on a
//! websocket transport. Binary attachments are rejected.

use crate::constants::{DEFAULT_NAMESPACE, NEW_REQUEST_EVENT};
use crate::{CapturedRequest, ProtocolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Payload of the Engine.IO open packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

impl OpenHandshake {
    /// How long the connection may stay silent before it is considered dead
    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_interval + self.ping_timeout)
    }
}

/// Engine.IO packet (transport layer)
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenHandshake),
    Close,
    Ping(String),
    Pong(String),
    /// Carries an encoded Socket.IO packet
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    /// Decode a websocket text frame
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let kind = text.chars().next().ok_or(ProtocolError::Empty)?;
        let data = &text[kind.len_utf8()..];

        match kind {
            '0' => Ok(EnginePacket::Open(serde_json::from_str(data)?)),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(data.to_string())),
            '3' => Ok(EnginePacket::Pong(data.to_string())),
            '4' => Ok(EnginePacket::Message(data.to_string())),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(ProtocolError::UnknownPacketType(other)),
        }
    }

    /// Encode as a websocket text frame
    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(handshake) => {
                // OpenHandshake only holds strings and integers
                format!("0{}", serde_json::to_string(handshake).unwrap_or_default())
            }
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{}", data),
            EnginePacket::Pong(data) => format!("3{}", data),
            EnginePacket::Message(data) => format!("4{}", data),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }

    /// Wrap a Socket.IO packet for sending
    pub fn message(packet: &SocketPacket) -> Self {
        EnginePacket::Message(packet.encode())
    }
}

/// Socket.IO packet (application layer, carried inside `EnginePacket::Message`)
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        payload: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        payload: Option<Value>,
    },
}

impl SocketPacket {
    /// Connect request for the default namespace
    pub fn connect() -> Self {
        SocketPacket::Connect {
            namespace: DEFAULT_NAMESPACE.to_string(),
            payload: None,
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::Ack { namespace, .. }
            | SocketPacket::ConnectError { namespace, .. } => namespace,
        }
    }

    fn type_char(&self) -> char {
        match self {
            SocketPacket::Connect { .. } => '0',
            SocketPacket::Disconnect { .. } => '1',
            SocketPacket::Event { .. } => '2',
            SocketPacket::Ack { .. } => '3',
            SocketPacket::ConnectError { .. } => '4',
        }
    }

    /// Decode `<type>[<namespace>,][<ack id>][<json>]`
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let kind = text.chars().next().ok_or(ProtocolError::Empty)?;
        if matches!(kind, '5' | '6') {
            return Err(ProtocolError::Unsupported("binary attachments"));
        }
        let mut rest = &text[kind.len_utf8()..];

        let namespace = if rest.starts_with('/') {
            match rest.find(',') {
                Some(end) => {
                    let namespace = rest[..end].to_string();
                    rest = &rest[end + 1..];
                    namespace
                }
                None => {
                    let namespace = rest.to_string();
                    rest = "";
                    namespace
                }
            }
        } else {
            DEFAULT_NAMESPACE.to_string()
        };

        let digits = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
        let id = if digits > 0 {
            Some(
                rest[..digits]
                    .parse::<u64>()
                    .map_err(|_| ProtocolError::InvalidFormat)?,
            )
        } else {
            None
        };
        rest = &rest[digits..];

        let payload: Option<Value> = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str(rest)?)
        };

        match kind {
            '0' => Ok(SocketPacket::Connect { namespace, payload }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let mut items = match payload {
                    Some(Value::Array(items)) if !items.is_empty() => items,
                    _ => return Err(ProtocolError::InvalidFormat),
                };
                let name = match items.remove(0) {
                    Value::String(name) => name,
                    _ => return Err(ProtocolError::InvalidFormat),
                };
                Ok(SocketPacket::Event {
                    namespace,
                    id,
                    name,
                    args: items,
                })
            }
            '3' => {
                let args = match payload {
                    Some(Value::Array(items)) => items,
                    None => Vec::new(),
                    _ => return Err(ProtocolError::InvalidFormat),
                };
                Ok(SocketPacket::Ack {
                    namespace,
                    id: id.ok_or(ProtocolError::InvalidFormat)?,
                    args,
                })
            }
            '4' => Ok(SocketPacket::ConnectError { namespace, payload }),
            other => Err(ProtocolError::UnknownPacketType(other)),
        }
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push(self.type_char());

        let namespace = self.namespace();
        if namespace != DEFAULT_NAMESPACE {
            out.push_str(namespace);
            out.push(',');
        }

        match self {
            SocketPacket::Connect { payload, .. } | SocketPacket::ConnectError { payload, .. } => {
                if let Some(payload) = payload {
                    out.push_str(&payload.to_string());
                }
            }
            SocketPacket::Disconnect { .. } => {}
            SocketPacket::Event { id, name, args, .. } => {
                if let Some(id) = id {
                    out.push_str(&id.to_string());
                }
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                out.push_str(&Value::Array(items).to_string());
            }
            SocketPacket::Ack { id, args, .. } => {
                out.push_str(&id.to_string());
                out.push_str(&Value::Array(args.clone()).to_string());
            }
        }

        out
    }

    /// Human readable reason carried by a CONNECT_ERROR packet
    pub fn error_message(&self) -> Option<String> {
        match self {
            SocketPacket::ConnectError { payload, .. } => Some(match payload {
                Some(Value::Object(map)) => map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("connection refused")
                    .to_string(),
                Some(Value::String(message)) => message.clone(),
                _ => "connection refused".to_string(),
            }),
            _ => None,
        }
    }
}

/// Application-level event emitted by the backend
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A request was just captured
    NewRequest(Box<CapturedRequest>),
    /// Any event this client does not consume
    Other { name: String },
}

impl ServerEvent {
    /// Interpret a decoded Socket.IO event
    pub fn from_event(name: &str, args: Vec<Value>) -> Result<Self, ProtocolError> {
        if name != NEW_REQUEST_EVENT {
            return Ok(ServerEvent::Other {
                name: name.to_string(),
            });
        }

        let record = args.into_iter().next().ok_or(ProtocolError::InvalidFormat)?;
        Ok(ServerEvent::NewRequest(Box::new(serde_json::from_value(record)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_open_handshake_decode() {
        let frame = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

        match EnginePacket::decode(frame).unwrap() {
            EnginePacket::Open(handshake) => {
                assert_eq!(handshake.sid, "abc");
                assert_eq!(handshake.liveness_timeout(), Duration::from_millis(45000));
                assert_eq!(handshake.max_payload, Some(1_000_000));
            }
            other => panic!("Wrong packet type: {:?}", other),
        }
    }

    #[test]
    fn test_engine_ping_pong() {
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping(String::new()));
        assert_eq!(EnginePacket::Pong(String::new()).encode(), "3");
        assert_eq!(EnginePacket::Pong("probe".to_string()).encode(), "3probe");
    }

    #[test]
    fn test_engine_rejects_garbage() {
        assert!(matches!(EnginePacket::decode(""), Err(ProtocolError::Empty)));
        assert!(matches!(
            EnginePacket::decode("9hello"),
            Err(ProtocolError::UnknownPacketType('9'))
        ));
    }

    #[test]
    fn test_connect_encodes_as_forty() {
        assert_eq!(EnginePacket::message(&SocketPacket::connect()).encode(), "40");
    }

    #[test]
    fn test_connect_ack_decode() {
        let packet = SocketPacket::decode(r#"0{"sid":"xyz"}"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Connect {
                namespace: "/".to_string(),
                payload: Some(json!({"sid": "xyz"})),
            }
        );
    }

    #[test]
    fn test_event_decode_with_namespace_and_id() {
        let packet = SocketPacket::decode(r#"2/admin,12["new_request",{"method":"GET"}]"#).unwrap();

        match packet {
            SocketPacket::Event {
                namespace,
                id,
                name,
                args,
            } => {
                assert_eq!(namespace, "/admin");
                assert_eq!(id, Some(12));
                assert_eq!(name, "new_request");
                assert_eq!(args, vec![json!({"method": "GET"})]);
            }
            other => panic!("Wrong packet type: {:?}", other),
        }
    }

    #[test]
    fn test_event_encode_matches_decode() {
        let packet = SocketPacket::Event {
            namespace: "/".to_string(),
            id: None,
            name: "new_request".to_string(),
            args: vec![json!({"path": "/a"})],
        };

        assert_eq!(packet.encode(), r#"2["new_request",{"path":"/a"}]"#);
        assert_eq!(SocketPacket::decode(&packet.encode()).unwrap(), packet);
    }

    #[test]
    fn test_event_without_name_is_invalid() {
        assert!(matches!(
            SocketPacket::decode("2[]"),
            Err(ProtocolError::InvalidFormat)
        ));
        assert!(matches!(
            SocketPacket::decode("2[42]"),
            Err(ProtocolError::InvalidFormat)
        ));
    }

    #[test]
    fn test_binary_event_unsupported() {
        assert!(matches!(
            SocketPacket::decode(r#"51-["upload",{"_placeholder":true,"num":0}]"#),
            Err(ProtocolError::Unsupported(_))
        ));
    }

    #[test]
    fn test_connect_error_message() {
        let packet = SocketPacket::decode(r#"4{"message":"Connection rejected by server"}"#).unwrap();
        assert_eq!(
            packet.error_message().as_deref(),
            Some("Connection rejected by server")
        );
        assert!(SocketPacket::connect().error_message().is_none());
    }

    #[test]
    fn test_server_event_new_request() {
        let event = ServerEvent::from_event(
            NEW_REQUEST_EVENT,
            vec![json!({"method": "DELETE", "path": "/items/1"})],
        )
        .unwrap();

        match event {
            ServerEvent::NewRequest(record) => assert_eq!(record.summary(), "DELETE /items/1"),
            other => panic!("Wrong event: {:?}", other),
        }
    }

    #[test]
    fn test_server_event_other_and_missing_payload() {
        assert_eq!(
            ServerEvent::from_event("status", vec![]).unwrap(),
            ServerEvent::Other {
                name: "status".to_string()
            }
        );
        assert!(ServerEvent::from_event(NEW_REQUEST_EVENT, vec![]).is_err());
    }
}
