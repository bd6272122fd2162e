//! Text framing for Socket.IO v5 carried over Engine.IO v4.
//!
//! Only the packets a telemetry client needs are understood: the engine
//! handshake and heartbeat, namespace connect/disconnect, events and
//! connect errors. Binary attachments are rejected.

use crate::{ChannelEvent, ConnectionError, FallAlert};
use serde_json::Value;

pub const PONG: &str = "3";

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Value),
    Close,
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

#[derive(Debug, Clone, PartialEq)]
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
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
    },
    ConnectError {
        namespace: String,
        data: Option<Value>,
    },
}

impl SocketPacket {
    pub fn namespace(&self) -> &str {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::Ack { namespace }
            | SocketPacket::ConnectError { namespace, .. } => namespace,
        }
    }
}

pub fn decode(text: &str) -> Result<EnginePacket, ConnectionError> {
    let mut chars = text.chars();
    let kind = chars
        .next()
        .ok_or_else(|| ConnectionError::Protocol("empty engine packet".to_string()))?;
    let body = chars.as_str();
    match kind {
        '0' => {
            let handshake = serde_json::from_str(body)
                .map_err(|err| ConnectionError::Protocol(format!("bad handshake: {err}")))?;
            Ok(EnginePacket::Open(handshake))
        }
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping(body.to_string())),
        '3' => Ok(EnginePacket::Pong(body.to_string())),
        '4' => decode_socket(body).map(EnginePacket::Message),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        other => Err(ConnectionError::Protocol(format!(
            "unknown engine packet type '{other}'"
        ))),
    }
}

fn decode_socket(body: &str) -> Result<SocketPacket, ConnectionError> {
    let mut chars = body.chars();
    let kind = chars
        .next()
        .ok_or_else(|| ConnectionError::Protocol("empty socket packet".to_string()))?;
    let mut rest = chars.as_str();

    if matches!(kind, '5' | '6') {
        return Err(ConnectionError::Protocol(
            "binary packets are not supported".to_string(),
        ));
    }

    let namespace = if rest.starts_with('/') {
        match rest.find(',') {
            Some(idx) => {
                let namespace = rest[..idx].to_string();
                rest = &rest[idx + 1..];
                namespace
            }
            None => {
                let namespace = rest.to_string();
                rest = "";
                namespace
            }
        }
    } else {
        "/".to_string()
    };

    let ack_len = rest.chars().take_while(char::is_ascii_digit).count();
    let rest = &rest[ack_len..];

    let data = if rest.is_empty() {
        None
    } else {
        Some(
            serde_json::from_str::<Value>(rest)
                .map_err(|err| ConnectionError::Protocol(format!("bad packet payload: {err}")))?,
        )
    };

    match kind {
        '0' => Ok(SocketPacket::Connect { namespace, data }),
        '1' => Ok(SocketPacket::Disconnect { namespace }),
        '2' => {
            let mut args = match data {
                Some(Value::Array(args)) => args,
                _ => {
                    return Err(ConnectionError::Protocol(
                        "event payload must be an array".to_string(),
                    ))
                }
            };
            if args.is_empty() {
                return Err(ConnectionError::Protocol("event without a name".to_string()));
            }
            let name = match args.remove(0) {
                Value::String(name) => name,
                _ => {
                    return Err(ConnectionError::Protocol(
                        "event name must be a string".to_string(),
                    ))
                }
            };
            Ok(SocketPacket::Event {
                namespace,
                name,
                args,
            })
        }
        '3' => Ok(SocketPacket::Ack { namespace }),
        '4' => Ok(SocketPacket::ConnectError { namespace, data }),
        other => Err(ConnectionError::Protocol(format!(
            "unknown socket packet type '{other}'"
        ))),
    }
}

fn namespace_prefix(namespace: &str) -> String {
    if namespace == "/" || namespace.is_empty() {
        String::new()
    } else {
        format!("{namespace},")
    }
}

pub fn encode_connect(namespace: &str) -> String {
    format!("40{}", namespace_prefix(namespace))
}

pub fn encode_disconnect(namespace: &str) -> String {
    format!("41{}", namespace_prefix(namespace))
}

pub fn encode_event(namespace: &str, name: &str, payload: Value) -> String {
    let body = Value::Array(vec![Value::String(name.to_string()), payload]);
    format!("42{}{}", namespace_prefix(namespace), body)
}

pub fn encode_pong(probe: &str) -> String {
    format!("{PONG}{probe}")
}

/// Maps a socket packet addressed to `namespace` onto a channel event.
///
/// Packets for other namespaces, acks and unknown event names yield `None`.
pub fn channel_event(packet: SocketPacket, namespace: &str) -> Option<ChannelEvent> {
    if packet.namespace() != namespace {
        return None;
    }
    match packet {
        SocketPacket::Connect { .. } => Some(ChannelEvent::Connected),
        SocketPacket::Disconnect { .. } => {
            Some(ChannelEvent::Disconnected("io server disconnect".to_string()))
        }
        SocketPacket::ConnectError { data, .. } => Some(ChannelEvent::ConnectError(
            message_of(data.as_ref()).unwrap_or_else(|| "connection refused".to_string()),
        )),
        SocketPacket::Ack { .. } => None,
        SocketPacket::Event { name, args, .. } => {
            let payload = args.into_iter().next().unwrap_or(Value::Null);
            match name.as_str() {
                "sensor_update" => Some(ChannelEvent::SensorUpdate(payload)),
                "sensor_snapshot" => Some(ChannelEvent::SensorSnapshot(payload)),
                "fall_detected" => Some(ChannelEvent::FallDetected(FallAlert::from_value(
                    &payload,
                ))),
                "connected" => message_of(Some(&payload)).map(ChannelEvent::Greeting),
                "error" => Some(ChannelEvent::ServerError(
                    message_of(Some(&payload)).unwrap_or_else(|| "server error".to_string()),
                )),
                _ => None,
            }
        }
    }
}

fn message_of(data: Option<&Value>) -> Option<String> {
    match data? {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
