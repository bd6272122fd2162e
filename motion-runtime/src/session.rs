use crate::message_handler::{SessionMessage, SessionSettings};
use crate::sensors::{now_millis, SensorCapability, SensorChannel, SensorEvent, SubscriptionHandle};
use crate::state::{ChannelSummary, EchoSummary, SessionState};
use connection::{ChannelEvent, ChannelId, ConnectionSupervisor, Connector, EventSink, FallAlert};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;
use telemetry::{
    normalize, EchoSample, Envelope, Reading, RollingBuffer, Sample, ECHO_HISTORY_CAPACITY,
    SENSOR_HISTORY_CAPACITY,
};

struct Subscription {
    token: u64,
    handle: SubscriptionHandle,
}

/// Owns all mutable session state: the tracking flag, sensor
/// subscriptions, the three histories and the connection supervisor.
///
/// Sensor and channel callbacks are turned into [`SessionMessage`]s on
/// `mailbox`; whoever drains the mailbox feeds them back through
/// [`SessionController::handle`].
pub struct SessionController {
    settings: SessionSettings,
    sensors: Box<dyn SensorCapability>,
    supervisor: ConnectionSupervisor,
    mailbox: Sender<SessionMessage>,
    tracking: bool,
    subscriptions: Vec<Subscription>,
    next_token: u64,
    latest_accelerometer: Sample,
    latest_gyroscope: Sample,
    accelerometer: RollingBuffer<Sample>,
    gyroscope: RollingBuffer<Sample>,
    echo: RollingBuffer<EchoSample>,
    status_message: Option<String>,
    pending_alerts: Vec<FallAlert>,
    published: u64,
}

impl SessionController {
    pub fn new(
        settings: SessionSettings,
        sensors: Box<dyn SensorCapability>,
        connector: Box<dyn Connector>,
        mailbox: Sender<SessionMessage>,
    ) -> Self {
        let channel_mailbox = mailbox.clone();
        let events: EventSink = Arc::new(move |id, event| {
            let _ = channel_mailbox.send(SessionMessage::Channel(id, event));
        });
        let supervisor = ConnectionSupervisor::new(connector, events, &settings.namespace);
        Self {
            settings,
            sensors,
            supervisor,
            mailbox,
            tracking: false,
            subscriptions: Vec::new(),
            next_token: 1,
            latest_accelerometer: Sample::default(),
            latest_gyroscope: Sample::default(),
            accelerometer: RollingBuffer::new(SENSOR_HISTORY_CAPACITY),
            gyroscope: RollingBuffer::new(SENSOR_HISTORY_CAPACITY),
            echo: RollingBuffer::new(ECHO_HISTORY_CAPACITY),
            status_message: None,
            pending_alerts: Vec::new(),
            published: 0,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn supervisor(&self) -> &ConnectionSupervisor {
        &self.supervisor
    }

    pub fn accelerometer(&self) -> &RollingBuffer<Sample> {
        &self.accelerometer
    }

    pub fn gyroscope(&self) -> &RollingBuffer<Sample> {
        &self.gyroscope
    }

    pub fn echo(&self) -> &RollingBuffer<EchoSample> {
        &self.echo
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Applies one message. Returns `true` when session state changed and a
    /// fresh [`SessionState`] should be published.
    pub fn handle(&mut self, message: SessionMessage) -> bool {
        match message {
            SessionMessage::Start => self.start(),
            SessionMessage::Stop => self.stop(),
            SessionMessage::SetEndpoint(endpoint) => self.set_endpoint(endpoint),
            SessionMessage::SetCadence(cadence) => self.set_cadence(cadence),
            SessionMessage::Sensor {
                token,
                channel,
                event,
            } => self.handle_sensor(token, channel, event),
            SessionMessage::Channel(id, event) => self.handle_channel(id, event),
            SessionMessage::LatestEnvelope(reply) => {
                let _ = reply.send(self.latest_envelope());
                false
            }
            SessionMessage::StatusMessage(text) => {
                self.status_message = Some(text);
                true
            }
            SessionMessage::Shutdown => {
                self.release();
                false
            }
        }
    }

    /// Enables tracking: subscribes both channels at the configured cadence
    /// and opens the collector channel when an endpoint is set.
    pub fn start(&mut self) -> bool {
        if self.tracking {
            return false;
        }
        log::info!("tracking started");
        self.tracking = true;
        self.status_message = None;
        for channel in [SensorChannel::Accelerometer, SensorChannel::Gyroscope] {
            if let Err(err) = self.subscribe(channel) {
                log::error!("{err}");
                self.status_message = Some(err.to_string());
            }
        }
        self.supervisor.sync(true, &self.settings.endpoint);
        true
    }

    /// Disables tracking: releases subscriptions, clears every history,
    /// resets the latest samples and closes the collector channel.
    pub fn stop(&mut self) -> bool {
        if !self.tracking {
            return false;
        }
        log::info!("tracking stopped");
        self.tracking = false;
        self.unsubscribe_all();
        self.accelerometer.clear();
        self.gyroscope.clear();
        self.echo.clear();
        let stopped_at = now_millis();
        self.latest_accelerometer = normalize(&Reading::zero(stopped_at));
        self.latest_gyroscope = normalize(&Reading::zero(stopped_at));
        self.supervisor.sync(false, &self.settings.endpoint);
        true
    }

    /// Stores the endpoint; while tracking, the channel is reopened against it.
    pub fn set_endpoint(&mut self, endpoint: String) -> bool {
        let endpoint = endpoint.trim().to_string();
        if endpoint == self.settings.endpoint {
            return false;
        }
        log::info!("collector endpoint set to '{endpoint}'");
        self.settings.endpoint = endpoint;
        if self.tracking {
            self.echo.clear();
            self.supervisor.sync(true, &self.settings.endpoint);
        }
        true
    }

    pub fn set_cadence(&mut self, cadence: Duration) -> bool {
        if cadence == self.settings.cadence {
            return false;
        }
        log::info!("sampling cadence set to {} ms", cadence.as_millis());
        self.settings.cadence = cadence;
        for subscription in &self.subscriptions {
            self.sensors.set_cadence(subscription.handle.channel, cadence);
        }
        true
    }

    fn handle_sensor(&mut self, token: u64, channel: SensorChannel, event: SensorEvent) -> bool {
        if !self.subscriptions.iter().any(|s| s.token == token) {
            log::debug!("ignoring {channel} event from released subscription {token}");
            return false;
        }
        match event {
            SensorEvent::Reading(reading) => self.accept_reading(channel, &reading),
            SensorEvent::Error(reason) => {
                log::warn!("{channel} error: {reason}");
                self.status_message = Some(format!("{channel} error: {reason}"));
                true
            }
        }
    }

    fn accept_reading(&mut self, channel: SensorChannel, reading: &Reading) -> bool {
        let sample = normalize(reading);
        let accepted = match channel {
            SensorChannel::Accelerometer => {
                self.latest_accelerometer = sample;
                self.accelerometer.append(sample)
            }
            SensorChannel::Gyroscope => {
                self.latest_gyroscope = sample;
                self.gyroscope.append(sample)
            }
        };
        if accepted && channel == SensorChannel::Accelerometer {
            let envelope = Envelope::new(
                sample.timestamp,
                self.latest_accelerometer.reading(),
                self.latest_gyroscope.reading(),
            );
            if self.supervisor.publish(&envelope) {
                self.published += 1;
            }
        }
        accepted
    }

    fn handle_channel(&mut self, id: ChannelId, event: ChannelEvent) -> bool {
        let before = (
            self.supervisor.status(),
            self.supervisor.message().map(str::to_string),
        );
        let mut echoed = false;
        let echo = &mut self.echo;
        let alert = self.supervisor.handle_event(id, event, |sample| {
            echoed |= echo.append(sample);
        });
        if let Some(alert) = alert {
            self.pending_alerts.push(alert);
            return true;
        }
        let after = (
            self.supervisor.status(),
            self.supervisor.message().map(str::to_string),
        );
        echoed || before != after
    }

    /// Current pair of latest samples as an outbound envelope, or `None`
    /// before the first reading.
    pub fn latest_envelope(&self) -> Option<Envelope> {
        let timestamp = self
            .latest_accelerometer
            .timestamp
            .max(self.latest_gyroscope.timestamp);
        if self.accelerometer.is_empty() && self.gyroscope.is_empty() {
            return None;
        }
        Some(Envelope::new(
            timestamp,
            self.latest_accelerometer.reading(),
            self.latest_gyroscope.reading(),
        ))
    }

    /// Builds the published view, handing over any pending fall alerts.
    pub fn snapshot_state(&mut self) -> SessionState {
        let surface = self.settings.surface;
        SessionState {
            tracking: self.tracking,
            cadence_ms: self.settings.cadence.as_millis() as u64,
            endpoint: self.settings.endpoint.clone(),
            status: self.supervisor.status(),
            connection_message: self.supervisor.message().map(str::to_string),
            status_message: self.status_message.clone(),
            accelerometer: ChannelSummary::derive(
                self.latest_accelerometer,
                &self.accelerometer,
                &surface,
            ),
            gyroscope: ChannelSummary::derive(self.latest_gyroscope, &self.gyroscope, &surface),
            echo: EchoSummary::derive(&self.echo, &surface),
            alerts: std::mem::take(&mut self.pending_alerts),
            published: self.published,
        }
    }

    /// Releases subscriptions and the channel without touching the histories.
    pub fn release(&mut self) {
        self.unsubscribe_all();
        self.supervisor.teardown();
        self.tracking = false;
    }

    fn subscribe(&mut self, channel: SensorChannel) -> Result<(), crate::SensorError> {
        let token = self.next_token;
        self.next_token += 1;
        let mailbox = self.mailbox.clone();
        self.sensors.set_cadence(channel, self.settings.cadence);
        let handle = self.sensors.subscribe(
            channel,
            Box::new(move |event| {
                let _ = mailbox.send(SessionMessage::Sensor {
                    token,
                    channel,
                    event,
                });
            }),
        )?;
        self.subscriptions.push(Subscription { token, handle });
        Ok(())
    }

    fn unsubscribe_all(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            self.sensors.unsubscribe(subscription.handle);
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.release();
    }
}
