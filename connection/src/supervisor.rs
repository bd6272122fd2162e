use crate::endpoint::Endpoint;
use crate::{
    Channel, ChannelEvent, ChannelId, ConnectionStatus, Connector, EventSink, FallAlert,
};
use telemetry::{EchoSample, Envelope};

pub const EMPTY_ENDPOINT_PROMPT: &str = "Enter a collector endpoint to stream live data.";

struct ActiveChannel {
    id: ChannelId,
    channel: Box<dyn Channel>,
}

/// Owns the duplex channel to the collector and its status.
///
/// At most one channel is open at a time; opening always tears the previous
/// one down first, and dropping the supervisor closes whatever is open.
/// Events are applied only when they come from the currently active channel.
pub struct ConnectionSupervisor {
    connector: Box<dyn Connector>,
    events: EventSink,
    default_namespace: String,
    active: Option<ActiveChannel>,
    next_channel: u64,
    status: ConnectionStatus,
    message: Option<String>,
}

impl ConnectionSupervisor {
    pub fn new(connector: Box<dyn Connector>, events: EventSink, default_namespace: &str) -> Self {
        Self {
            connector,
            events,
            default_namespace: default_namespace.to_string(),
            active: None,
            next_channel: 1,
            status: ConnectionStatus::Disconnected,
            message: None,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Human-readable detail for the current status, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn active_channel(&self) -> Option<ChannelId> {
        self.active.as_ref().map(|active| active.id)
    }

    /// Reconciles the channel with the tracking flag and endpoint: tears down
    /// when not tracking, otherwise (re)opens against `endpoint`.
    pub fn sync(&mut self, tracking: bool, endpoint: &str) {
        if tracking {
            self.open(endpoint);
        } else {
            self.teardown();
        }
    }

    /// Tears down any open channel, then opens a new one for `endpoint`.
    ///
    /// An empty endpoint leaves the supervisor `disconnected` with a prompt
    /// and opens nothing.
    pub fn open(&mut self, endpoint: &str) {
        self.teardown();

        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            log::info!("no collector endpoint configured");
            self.message = Some(EMPTY_ENDPOINT_PROMPT.to_string());
            return;
        }

        let id = ChannelId(self.next_channel);
        self.next_channel += 1;
        self.status = ConnectionStatus::Connecting;
        self.message = None;

        let resolved = match Endpoint::parse(endpoint, &self.default_namespace) {
            Ok(resolved) => resolved,
            Err(err) => {
                self.fail(err.to_string());
                return;
            }
        };
        log::info!(
            "opening channel {id} to {} (namespace {})",
            resolved.raw,
            resolved.namespace
        );
        match self.connector.open(id, &resolved, self.events.clone()) {
            Ok(channel) => self.active = Some(ActiveChannel { id, channel }),
            Err(err) => self.fail(err.to_string()),
        }
    }

    /// Closes the channel unconditionally and returns to `disconnected`.
    /// Safe to call any number of times.
    pub fn teardown(&mut self) {
        if let Some(mut active) = self.active.take() {
            log::info!("closing channel {}", active.id);
            active.channel.close();
        }
        self.status = ConnectionStatus::Disconnected;
        self.message = None;
    }

    /// Emits `sensor_update` with `envelope` when connected. Returns whether
    /// the envelope was handed to the channel.
    pub fn publish(&mut self, envelope: &Envelope) -> bool {
        if self.status != ConnectionStatus::Connected {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        match active.channel.emit("sensor_update", envelope.to_value()) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("publish on channel {} failed: {err}", active.id);
                self.fail(err.to_string());
                false
            }
        }
    }

    /// Applies an event reported by channel `id`.
    ///
    /// Events from any channel other than the active one are ignored. Echoed
    /// envelopes are projected and handed to `on_echo`; a fall alert received
    /// while connected is returned for the caller to surface.
    pub fn handle_event(
        &mut self,
        id: ChannelId,
        event: ChannelEvent,
        mut on_echo: impl FnMut(EchoSample),
    ) -> Option<FallAlert> {
        if self.active_channel() != Some(id) {
            log::debug!("ignoring event from stale channel {id}");
            return None;
        }
        match event {
            ChannelEvent::Connected => {
                if self.status == ConnectionStatus::Connecting {
                    log::info!("channel {id} connected");
                    self.status = ConnectionStatus::Connected;
                    self.message = None;
                }
            }
            ChannelEvent::Greeting(text) => {
                self.message = Some(text);
            }
            ChannelEvent::ConnectError(reason) | ChannelEvent::ServerError(reason) => {
                log::warn!("channel {id} error: {reason}");
                self.fail(reason);
            }
            ChannelEvent::Disconnected(reason) => {
                if self.status != ConnectionStatus::Error {
                    log::info!("channel {id} disconnected: {reason}");
                    self.status = ConnectionStatus::Disconnected;
                    self.message = Some(reason);
                }
            }
            ChannelEvent::SensorUpdate(payload) => {
                if self.status != ConnectionStatus::Connected {
                    return None;
                }
                match EchoSample::from_envelope(&payload) {
                    Some(echo) => on_echo(echo),
                    None => log::warn!("rejected malformed envelope from channel {id}"),
                }
            }
            ChannelEvent::SensorSnapshot(payload) => {
                log::debug!("collector broadcast snapshot: {payload}");
            }
            ChannelEvent::FallDetected(alert) => {
                if self.status == ConnectionStatus::Connected {
                    log::warn!("fall alert: {}", alert.message);
                    return Some(alert);
                }
            }
        }
        None
    }

    fn fail(&mut self, reason: String) {
        self.status = ConnectionStatus::Error;
        self.message = Some(reason);
    }
}

impl Drop for ConnectionSupervisor {
    fn drop(&mut self) {
        self.teardown();
    }
}
