use crate::sensors::{SensorChannel, SensorEvent};
use connection::{ChannelEvent, ChannelId, DEFAULT_NAMESPACE};
use motion_core::{ChartSurface, DashboardSettings};
use std::sync::mpsc::Sender;
use std::time::Duration;
use telemetry::Envelope;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub cadence: Duration,
    /// Duplex collector endpoint; empty until the user enters one.
    pub endpoint: String,
    pub namespace: String,
    pub surface: ChartSurface,
}

impl SessionSettings {
    pub fn from_dashboard(settings: &DashboardSettings) -> Self {
        Self {
            cadence: settings.sampling.cadence(),
            endpoint: settings.collector.socket_endpoint.clone(),
            namespace: settings.collector.namespace.clone(),
            surface: settings.chart.surface(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cadence: Duration::from_millis(100),
            endpoint: String::new(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            surface: ChartSurface::default(),
        }
    }
}

/// Everything the session actor reacts to, in arrival order.
#[derive(Debug)]
pub enum SessionMessage {
    Start,
    Stop,
    SetEndpoint(String),
    SetCadence(Duration),
    /// Event from the sensor subscription identified by `token`.
    Sensor {
        token: u64,
        channel: SensorChannel,
        event: SensorEvent,
    },
    Channel(ChannelId, ChannelEvent),
    LatestEnvelope(Sender<Option<Envelope>>),
    /// One-shot status text, e.g. the outcome of a snapshot POST.
    StatusMessage(String),
    Shutdown,
}
