use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod buffer;
pub mod stats;
pub use buffer::{RollingBuffer, ECHO_HISTORY_CAPACITY, SENSOR_HISTORY_CAPACITY};
pub use stats::{magnitude_stats, window_seconds, MagnitudeStats};

/// Raw three-axis datum as delivered by a sensor channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Milliseconds since the Unix epoch. `0` means "no reading yet".
    pub timestamp: i64,
}

impl Reading {
    pub fn new(x: f64, y: f64, z: f64, timestamp: i64) -> Self {
        Self { x, y, z, timestamp }
    }

    /// All-zero reading stamped with `timestamp`.
    pub fn zero(timestamp: i64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            timestamp,
        }
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::zero(0)
    }
}

/// A normalized reading: finite axes plus the derived vector magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub timestamp: i64,
    pub magnitude: f64,
}

impl Sample {
    pub fn reading(&self) -> Reading {
        Reading::new(self.x, self.y, self.z, self.timestamp)
    }
}

impl Default for Sample {
    fn default() -> Self {
        normalize(&Reading::default())
    }
}

/// Reduced projection of an inbound envelope, kept in the server-echo history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EchoSample {
    pub timestamp: f64,
    pub magnitude: f64,
}

impl EchoSample {
    /// Projects a loosely typed inbound envelope.
    ///
    /// Returns `None` when the accelerometer object is absent or when neither
    /// the envelope timestamp nor the nested reading timestamp is a finite
    /// number. Axis values are coerced the same way [`normalize`] does.
    pub fn from_envelope(envelope: &Value) -> Option<Self> {
        let accelerometer = envelope.get("accelerometer")?.as_object()?;
        let timestamp = finite_number(envelope.get("timestamp"))
            .or_else(|| finite_number(accelerometer.get("timestamp")))?;
        let x = coerce_axis(accelerometer.get("x"));
        let y = coerce_axis(accelerometer.get("y"));
        let z = coerce_axis(accelerometer.get("z"));
        Some(Self {
            timestamp,
            magnitude: magnitude(x, y, z),
        })
    }
}

/// The unit exchanged with the remote collector in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub timestamp: i64,
    pub accelerometer: Reading,
    pub gyroscope: Reading,
}

impl Envelope {
    pub fn new(timestamp: i64, accelerometer: Reading, gyroscope: Reading) -> Self {
        Self {
            timestamp,
            accelerometer,
            gyroscope,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "timestamp": self.timestamp,
            "accelerometer": self.accelerometer,
            "gyroscope": self.gyroscope,
        })
    }
}

/// Entries a [`RollingBuffer`] can hold and the aggregator can summarize.
pub trait HistoryEntry {
    fn timestamp_ms(&self) -> f64;
    fn magnitude(&self) -> f64;
}

impl HistoryEntry for Sample {
    fn timestamp_ms(&self) -> f64 {
        self.timestamp as f64
    }

    fn magnitude(&self) -> f64 {
        self.magnitude
    }
}

impl HistoryEntry for EchoSample {
    fn timestamp_ms(&self) -> f64 {
        self.timestamp
    }

    fn magnitude(&self) -> f64 {
        self.magnitude
    }
}

/// Coerces every axis to a finite number (non-finite becomes 0) and derives
/// the Euclidean magnitude. Never fails.
pub fn normalize(reading: &Reading) -> Sample {
    let x = finite_or_zero(reading.x);
    let y = finite_or_zero(reading.y);
    let z = finite_or_zero(reading.z);
    Sample {
        x,
        y,
        z,
        timestamp: reading.timestamp,
        magnitude: magnitude(x, y, z),
    }
}

pub fn magnitude(x: f64, y: f64, z: f64) -> f64 {
    (x * x + y * y + z * z).sqrt()
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn finite_number(value: Option<&Value>) -> Option<f64> {
    value
        .and_then(Value::as_f64)
        .filter(|number| number.is_finite())
}

fn coerce_axis(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.map(finite_or_zero).unwrap_or(0.0)
}

/// Whether an entry stamped `timestamp_ms` may enter a history buffer.
pub fn is_admissible_timestamp(timestamp_ms: f64) -> bool {
    timestamp_ms.is_finite() && timestamp_ms != 0.0
}
