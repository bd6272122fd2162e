use connection::{ConnectionStatus, FallAlert};
use motion_core::{echo_trend, sample_trend, ChartSurface, TrendChart};
use serde::Serialize;
use telemetry::{magnitude_stats, window_seconds, EchoSample, MagnitudeStats, RollingBuffer, Sample};

/// Derived view of one local sensor history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub latest: Sample,
    pub len: usize,
    pub stats: Option<MagnitudeStats>,
    pub window_seconds: Option<f64>,
    pub trend: Option<TrendChart>,
}

impl ChannelSummary {
    pub fn derive(latest: Sample, buffer: &RollingBuffer<Sample>, surface: &ChartSurface) -> Self {
        Self {
            latest,
            len: buffer.len(),
            stats: magnitude_stats(buffer),
            window_seconds: window_seconds(buffer),
            trend: sample_trend(buffer, surface),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EchoSummary {
    pub len: usize,
    pub stats: Option<MagnitudeStats>,
    pub window_seconds: Option<f64>,
    pub trend: Option<TrendChart>,
}

impl EchoSummary {
    pub fn derive(buffer: &RollingBuffer<EchoSample>, surface: &ChartSurface) -> Self {
        Self {
            len: buffer.len(),
            stats: magnitude_stats(buffer),
            window_seconds: window_seconds(buffer),
            trend: echo_trend(buffer, surface),
        }
    }
}

/// Snapshot published after every accepted mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub tracking: bool,
    pub cadence_ms: u64,
    pub endpoint: String,
    pub status: ConnectionStatus,
    pub connection_message: Option<String>,
    pub status_message: Option<String>,
    pub accelerometer: ChannelSummary,
    pub gyroscope: ChannelSummary,
    pub echo: EchoSummary,
    /// Fall alerts received since the previous snapshot.
    pub alerts: Vec<FallAlert>,
    /// Envelopes handed to the channel since the session started.
    pub published: u64,
}
