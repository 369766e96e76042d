//! Text packet codec for Socket.IO v5 running over Engine.IO v4.
//!
//! Only the WebSocket transport is spoken, so every WebSocket text frame is
//! exactly one Engine.IO packet: a single type digit followed by its data.
//! Engine.IO `message` packets carry a Socket.IO packet:
//!
//! ```text
//! <type>[<attachments>-][<namespace>,][<ack id>][<json>]
//! ```

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PacketError {
    #[error("empty packet")]
    Empty,
    #[error("unknown engine.io packet type {0:?}")]
    UnknownEngineType(char),
    #[error("unknown socket.io packet type {0:?}")]
    UnknownSocketType(char),
    #[error("malformed handshake: {0}")]
    Handshake(#[source] serde_json::Error),
    #[error("malformed payload: {0}")]
    Payload(#[source] serde_json::Error),
    #[error("event packet without an event name")]
    MissingEventName,
    #[error("binary packets are not supported")]
    Binary,
}

/// Session parameters the server announces in the OPEN packet.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, PacketError> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        let data = chars.as_str();
        match kind {
            '0' => serde_json::from_str(data)
                .map(EnginePacket::Open)
                .map_err(PacketError::Handshake),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(data.to_string())),
            '3' => Ok(EnginePacket::Pong(data.to_string())),
            '4' => Ok(EnginePacket::Message(data.to_string())),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(PacketError::UnknownEngineType(other)),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            // Clients never send OPEN; encode it as a bare type for completeness
            EnginePacket::Open(_) => "0".to_string(),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{}", data),
            EnginePacket::Pong(data) => format!("3{}", data),
            EnginePacket::Message(data) => format!("4{}", data),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
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
        id: Option<u64>,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        message: String,
    },
}

impl SocketPacket {
    /// Decode the body of an Engine.IO message packet.
    pub fn decode(body: &str) -> Result<Self, PacketError> {
        let mut chars = body.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        if kind == '5' || kind == '6' {
            return Err(PacketError::Binary);
        }
        let rest = chars.as_str();

        let (namespace, rest) = match rest.strip_prefix('/') {
            Some(_) => match rest.find(',') {
                Some(idx) => (rest[..idx].to_string(), &rest[idx + 1..]),
                None => (rest.to_string(), ""),
            },
            None => ("/".to_string(), rest),
        };

        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        let id = rest[..digits].parse::<u64>().ok();
        let json = &rest[digits..];

        let payload: Option<Value> = if json.is_empty() {
            None
        } else {
            Some(serde_json::from_str(json).map_err(PacketError::Payload)?)
        };

        match kind {
            '0' => Ok(SocketPacket::Connect {
                namespace,
                data: payload,
            }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let mut args = match payload {
                    Some(Value::Array(items)) => items,
                    _ => return Err(PacketError::MissingEventName),
                };
                if args.is_empty() {
                    return Err(PacketError::MissingEventName);
                }
                let name = match args.remove(0) {
                    Value::String(name) => name,
                    _ => return Err(PacketError::MissingEventName),
                };
                Ok(SocketPacket::Event {
                    namespace,
                    id,
                    name,
                    args,
                })
            }
            '3' => Ok(SocketPacket::Ack {
                namespace,
                id,
                args: match payload {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                },
            }),
            '4' => {
                let message = match payload {
                    Some(Value::Object(map)) => map
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    Some(Value::String(s)) => s,
                    _ => String::new(),
                };
                Ok(SocketPacket::ConnectError { namespace, message })
            }
            other => Err(PacketError::UnknownSocketType(other)),
        }
    }

    /// Encode as the body of an Engine.IO message packet.
    pub fn encode(&self) -> String {
        match self {
            SocketPacket::Connect { namespace, data } => {
                let mut out = format!("0{}", namespace_prefix(namespace));
                if let Some(data) = data {
                    out.push_str(&data.to_string());
                }
                out
            }
            SocketPacket::Disconnect { namespace } => {
                format!("1{}", namespace_prefix(namespace))
            }
            SocketPacket::Event {
                namespace,
                id,
                name,
                args,
            } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                format!(
                    "2{}{}{}",
                    namespace_prefix(namespace),
                    id.map(|i| i.to_string()).unwrap_or_default(),
                    Value::Array(items)
                )
            }
            SocketPacket::Ack {
                namespace,
                id,
                args,
            } => format!(
                "3{}{}{}",
                namespace_prefix(namespace),
                id.map(|i| i.to_string()).unwrap_or_default(),
                Value::Array(args.clone())
            ),
            SocketPacket::ConnectError { namespace, message } => format!(
                "4{}{}",
                namespace_prefix(namespace),
                serde_json::json!({ "message": message })
            ),
        }
    }
}

fn namespace_prefix(namespace: &str) -> String {
    if namespace == "/" {
        String::new()
    } else {
        format!("{},", namespace)
    }
}

/// The frame a client sends to join a namespace.
pub fn connect_frame(namespace: &str) -> String {
    EnginePacket::Message(
        SocketPacket::Connect {
            namespace: namespace.to_string(),
            data: None,
        }
        .encode(),
    )
    .encode()
}
