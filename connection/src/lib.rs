use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub mod endpoint;
pub mod in_process;
pub mod socketio;
pub mod supervisor;
pub mod websocket;

pub use endpoint::{normalize_namespace, Endpoint, DEFAULT_NAMESPACE};
pub use in_process::{InProcessConnector, InProcessProbe};
pub use supervisor::{ConnectionSupervisor, EMPTY_ENDPOINT_PROMPT};
pub use websocket::SocketIoConnector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    SocketIo,
    InProcess,
}

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub kind: ConnectionKind,
    /// Namespace joined when the endpoint URL carries no path.
    pub default_namespace: String,
    /// In-process only: report `connect` as soon as a channel opens.
    pub auto_connect: bool,
    /// In-process only: bounce every outbound `sensor_update` back inbound.
    pub echo: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            kind: ConnectionKind::SocketIo,
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            auto_connect: true,
            echo: true,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConnectionError {
    #[error("no endpoint configured")]
    EmptyEndpoint,
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),
    #[error("unsupported endpoint scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("send failed")]
    SendFailed,
    #[error("channel is closed")]
    ChannelClosed,
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// Identity of one opened channel. Every open gets a fresh id so callbacks
/// from a superseded channel can be told apart and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallAlert {
    pub message: String,
    pub timestamp: Option<String>,
    pub acceleration: Option<f64>,
}

impl FallAlert {
    pub fn from_value(value: &Value) -> Self {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Fall detected")
            .to_string();
        let timestamp = match value.get("timestamp") {
            Some(Value::String(text)) => Some(text.clone()),
            Some(Value::Number(number)) => Some(number.to_string()),
            _ => None,
        };
        let acceleration = value
            .get("acceleration")
            .and_then(Value::as_f64)
            .filter(|a| a.is_finite());
        Self {
            message,
            timestamp,
            acceleration,
        }
    }
}

/// Everything a channel can report back to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The namespace was joined (`connect`).
    Connected,
    /// Greeting text the collector sends after joining (`connected`).
    Greeting(String),
    /// Channel-level failure before or after establishment (`connect_error`).
    ConnectError(String),
    /// Application error reported by the collector (`error`).
    ServerError(String),
    /// Remote-initiated close (`disconnect`), with its reason.
    Disconnected(String),
    /// Envelope pushed by the collector (`sensor_update`).
    SensorUpdate(Value),
    /// One-shot snapshot broadcast by the collector (`sensor_snapshot`).
    SensorSnapshot(Value),
    FallDetected(FallAlert),
}

/// Callback through which channels deliver their events.
pub type EventSink = Arc<dyn Fn(ChannelId, ChannelEvent) + Send + Sync>;

/// An open duplex channel. Closing is idempotent and asynchronous.
pub trait Channel: Send {
    fn emit(&mut self, event: &str, payload: Value) -> Result<(), ConnectionError>;
    fn close(&mut self);
}

/// Opens channels; the returned channel reports through `events`.
pub trait Connector: Send {
    fn open(
        &mut self,
        id: ChannelId,
        endpoint: &Endpoint,
        events: EventSink,
    ) -> Result<Box<dyn Channel>, ConnectionError>;
}

pub struct ConnectionFactory;

impl ConnectionFactory {
    pub fn create(config: &ConnectionConfig) -> Box<dyn Connector> {
        match config.kind {
            ConnectionKind::SocketIo => Box::new(SocketIoConnector::default()),
            ConnectionKind::InProcess => {
                Box::new(InProcessConnector::new(config.auto_connect, config.echo))
            }
        }
    }
}
