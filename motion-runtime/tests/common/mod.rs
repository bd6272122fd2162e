#![allow(dead_code)]

use motion_runtime::{
    ReadingSink, SensorCapability, SensorChannel, SensorError, SensorEvent, SubscriptionHandle,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use telemetry::Reading;

#[derive(Default)]
struct ManualLog {
    next_id: u64,
    sinks: HashMap<u64, (SensorChannel, ReadingSink)>,
    released: Vec<SubscriptionHandle>,
    subscribed: Vec<SubscriptionHandle>,
    cadence: HashMap<SensorChannel, Duration>,
    unavailable: Vec<SensorChannel>,
}

/// Sensor driver whose readings are pushed by the test.
#[derive(Clone, Default)]
pub struct ManualSensors {
    log: Arc<Mutex<ManualLog>>,
}

impl ManualSensors {
    pub fn mark_unavailable(&self, channel: SensorChannel) {
        self.log.lock().unwrap().unavailable.push(channel);
    }

    /// Delivers `event` to every live subscription on `channel`.
    pub fn push(&self, channel: SensorChannel, event: SensorEvent) -> usize {
        let log = self.log.lock().unwrap();
        let mut delivered = 0;
        for (_, sink) in log.sinks.values().filter(|(c, _)| *c == channel) {
            sink(event.clone());
            delivered += 1;
        }
        delivered
    }

    pub fn reading(&self, channel: SensorChannel, x: f64, y: f64, z: f64, timestamp: i64) {
        self.push(
            channel,
            SensorEvent::Reading(Reading::new(x, y, z, timestamp)),
        );
    }

    pub fn live(&self) -> usize {
        self.log.lock().unwrap().sinks.len()
    }

    pub fn subscribed(&self) -> Vec<SubscriptionHandle> {
        self.log.lock().unwrap().subscribed.clone()
    }

    pub fn released(&self) -> Vec<SubscriptionHandle> {
        self.log.lock().unwrap().released.clone()
    }

    pub fn cadence(&self, channel: SensorChannel) -> Option<Duration> {
        self.log.lock().unwrap().cadence.get(&channel).copied()
    }
}

impl SensorCapability for ManualSensors {
    fn subscribe(
        &mut self,
        channel: SensorChannel,
        sink: ReadingSink,
    ) -> Result<SubscriptionHandle, SensorError> {
        let mut log = self.log.lock().unwrap();
        if log.unavailable.contains(&channel) {
            return Err(SensorError::Unavailable(channel));
        }
        log.next_id += 1;
        let handle = SubscriptionHandle {
            id: log.next_id,
            channel,
        };
        log.sinks.insert(handle.id, (channel, sink));
        log.subscribed.push(handle);
        Ok(handle)
    }

    fn set_cadence(&mut self, channel: SensorChannel, interval: Duration) {
        self.log.lock().unwrap().cadence.insert(channel, interval);
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        let mut log = self.log.lock().unwrap();
        log.sinks.remove(&handle.id);
        log.released.push(handle);
    }
}
