pub mod message_handler;
pub mod runtime;
pub mod sensors;
pub mod service;
pub mod session;
pub mod state;

pub use message_handler::{SessionMessage, SessionSettings};
pub use runtime::spawn_session;
pub use sensors::{
    now_millis, ReadingSink, SensorCapability, SensorChannel, SensorError, SensorEvent,
    SimulatedSensors, SubscriptionHandle,
};
pub use service::SessionHandle;
pub use session::SessionController;
pub use state::{ChannelSummary, EchoSummary, SessionState};

#[derive(thiserror::Error, Debug)]
pub enum RuntimeError {
    #[error("failed to spawn session thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("session is no longer running")]
    Closed,
}
