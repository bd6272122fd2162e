use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::TAU;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use telemetry::Reading;

const STANDARD_GRAVITY: f64 = 9.81;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorChannel {
    Accelerometer,
    Gyroscope,
}

impl fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorChannel::Accelerometer => f.write_str("accelerometer"),
            SensorChannel::Gyroscope => f.write_str("gyroscope"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    Reading(Reading),
    Error(String),
}

pub type ReadingSink = Box<dyn Fn(SensorEvent) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    pub id: u64,
    pub channel: SensorChannel,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("{0} is not available on this device")]
    Unavailable(SensorChannel),
    #[error("failed to start {channel} sampling: {reason}")]
    Spawn {
        channel: SensorChannel,
        reason: String,
    },
}

/// Platform sensor driver as seen by the session.
///
/// A subscription delivers events to its sink until it is unsubscribed.
/// Events may still arrive shortly after `unsubscribe`; consumers guard
/// against them.
pub trait SensorCapability: Send {
    fn subscribe(
        &mut self,
        channel: SensorChannel,
        sink: ReadingSink,
    ) -> Result<SubscriptionHandle, SensorError>;
    fn set_cadence(&mut self, channel: SensorChannel, interval: Duration);
    fn unsubscribe(&mut self, handle: SubscriptionHandle);
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

struct Worker {
    channel: SensorChannel,
    stop: Arc<AtomicBool>,
    cadence_ms: Arc<AtomicU64>,
}

/// Synthetic driver for desktop runs: one sampling thread per subscription.
///
/// The accelerometer reports gravity on z with a slow sway on every axis;
/// the gyroscope reports a small rotation rate.
pub struct SimulatedSensors {
    cadence: HashMap<SensorChannel, Duration>,
    workers: HashMap<u64, Worker>,
    next_id: u64,
    epoch: Instant,
}

impl SimulatedSensors {
    pub fn new(cadence: Duration) -> Self {
        let mut by_channel = HashMap::new();
        by_channel.insert(SensorChannel::Accelerometer, cadence);
        by_channel.insert(SensorChannel::Gyroscope, cadence);
        Self {
            cadence: by_channel,
            workers: HashMap::new(),
            next_id: 1,
            epoch: Instant::now(),
        }
    }

    pub fn active_subscriptions(&self) -> usize {
        self.workers.len()
    }

    fn cadence_for(&self, channel: SensorChannel) -> Duration {
        self.cadence
            .get(&channel)
            .copied()
            .unwrap_or(Duration::from_millis(100))
    }
}

impl Default for SimulatedSensors {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

fn simulate(channel: SensorChannel, t: f64) -> (f64, f64, f64) {
    match channel {
        SensorChannel::Accelerometer => (
            0.35 * (TAU * 0.5 * t).sin(),
            0.25 * (TAU * 0.3 * t).cos(),
            STANDARD_GRAVITY + 0.4 * (TAU * 1.8 * t).sin(),
        ),
        SensorChannel::Gyroscope => (
            0.08 * (TAU * 0.7 * t).sin(),
            0.05 * (TAU * 0.4 * t).cos(),
            0.02 * (TAU * 0.2 * t).sin(),
        ),
    }
}

impl SensorCapability for SimulatedSensors {
    fn subscribe(
        &mut self,
        channel: SensorChannel,
        sink: ReadingSink,
    ) -> Result<SubscriptionHandle, SensorError> {
        let id = self.next_id;
        self.next_id += 1;
        let stop = Arc::new(AtomicBool::new(false));
        let cadence_ms = Arc::new(AtomicU64::new(
            self.cadence_for(channel).as_millis().max(1) as u64,
        ));
        let epoch = self.epoch;
        let thread_stop = stop.clone();
        let thread_cadence = cadence_ms.clone();

        thread::Builder::new()
            .name(format!("{channel}-{id}"))
            .spawn(move || {
                while !thread_stop.load(Ordering::Acquire) {
                    let (x, y, z) = simulate(channel, epoch.elapsed().as_secs_f64());
                    sink(SensorEvent::Reading(Reading::new(x, y, z, now_millis())));
                    thread::sleep(Duration::from_millis(
                        thread_cadence.load(Ordering::Relaxed),
                    ));
                }
            })
            .map_err(|err| SensorError::Spawn {
                channel,
                reason: err.to_string(),
            })?;

        log::debug!("{channel} subscription {id} started");
        self.workers.insert(
            id,
            Worker {
                channel,
                stop,
                cadence_ms,
            },
        );
        Ok(SubscriptionHandle { id, channel })
    }

    fn set_cadence(&mut self, channel: SensorChannel, interval: Duration) {
        self.cadence.insert(channel, interval);
        let millis = interval.as_millis().max(1) as u64;
        for worker in self.workers.values().filter(|w| w.channel == channel) {
            worker.cadence_ms.store(millis, Ordering::Relaxed);
        }
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        if let Some(worker) = self.workers.remove(&handle.id) {
            worker.stop.store(true, Ordering::Release);
            log::debug!("{} subscription {} stopped", handle.channel, handle.id);
        }
    }
}

impl Drop for SimulatedSensors {
    fn drop(&mut self) {
        for worker in self.workers.values() {
            worker.stop.store(true, Ordering::Release);
        }
    }
}
