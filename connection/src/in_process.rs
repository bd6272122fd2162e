use crate::endpoint::Endpoint;
use crate::{Channel, ChannelEvent, ChannelId, ConnectionError, Connector, EventSink};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Loopback transport. Channels live entirely in this process and remote
/// events are injected through the [`InProcessProbe`]. Opens, closes and
/// outbound emits are only recorded once a probe has been taken.
pub struct InProcessConnector {
    probe: InProcessProbe,
    auto_connect: bool,
    echo: bool,
}

impl InProcessConnector {
    pub fn new(auto_connect: bool, echo: bool) -> Self {
        Self {
            probe: InProcessProbe::default(),
            auto_connect,
            echo,
        }
    }

    /// Handle for inspecting and driving the channels this connector opens.
    /// Taking one turns on recording.
    pub fn probe(&self) -> InProcessProbe {
        if let Ok(mut log) = self.probe.log.lock() {
            log.recording = true;
        }
        self.probe.clone()
    }
}

impl Connector for InProcessConnector {
    fn open(
        &mut self,
        id: ChannelId,
        endpoint: &Endpoint,
        events: EventSink,
    ) -> Result<Box<dyn Channel>, ConnectionError> {
        if let Some(reason) = self.probe.take_failure() {
            return Err(ConnectionError::Transport(reason));
        }
        self.probe.record_open(id, endpoint, events.clone());
        if self.auto_connect {
            events(id, ChannelEvent::Connected);
        }
        Ok(Box::new(InProcessChannel {
            id,
            events,
            echo: self.echo,
            closed: false,
            probe: self.probe.clone(),
        }))
    }
}

struct InProcessChannel {
    id: ChannelId,
    events: EventSink,
    echo: bool,
    closed: bool,
    probe: InProcessProbe,
}

impl Channel for InProcessChannel {
    fn emit(&mut self, event: &str, payload: Value) -> Result<(), ConnectionError> {
        if self.closed {
            return Err(ConnectionError::ChannelClosed);
        }
        self.probe.record_emit(self.id, event, payload.clone());
        if self.echo && event == "sensor_update" {
            (self.events)(self.id, ChannelEvent::SensorUpdate(payload));
        }
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.probe.record_close(self.id);
        }
    }
}

impl Drop for InProcessChannel {
    fn drop(&mut self) {
        self.close();
    }
}

#[derive(Default)]
struct ProbeLog {
    opened: Vec<(ChannelId, Endpoint)>,
    closed: Vec<ChannelId>,
    emitted: Vec<(ChannelId, String, Value)>,
    sinks: HashMap<ChannelId, EventSink>,
    fail_next_open: Option<String>,
    recording: bool,
}

#[derive(Clone, Default)]
pub struct InProcessProbe {
    log: Arc<Mutex<ProbeLog>>,
}

impl InProcessProbe {
    /// Makes the next `open` fail with `reason`.
    pub fn fail_next_open(&self, reason: &str) {
        if let Ok(mut log) = self.log.lock() {
            log.fail_next_open = Some(reason.to_string());
        }
    }

    /// Delivers `event` as if the remote end of channel `id` had sent it.
    /// Returns `false` when the channel is not open.
    pub fn fire(&self, id: ChannelId, event: ChannelEvent) -> bool {
        let sink = self
            .log
            .lock()
            .ok()
            .and_then(|log| log.sinks.get(&id).cloned());
        match sink {
            Some(sink) => {
                sink(id, event);
                true
            }
            None => false,
        }
    }

    pub fn opened(&self) -> Vec<ChannelId> {
        self.read(|log| log.opened.iter().map(|(id, _)| *id).collect())
    }

    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.read(|log| log.opened.iter().map(|(_, e)| e.clone()).collect())
    }

    pub fn closed(&self) -> Vec<ChannelId> {
        self.read(|log| log.closed.clone())
    }

    pub fn emitted(&self) -> Vec<(ChannelId, String, Value)> {
        self.read(|log| log.emitted.clone())
    }

    pub fn open_channels(&self) -> Vec<ChannelId> {
        self.read(|log| {
            let mut ids: Vec<ChannelId> = log.sinks.keys().copied().collect();
            ids.sort();
            ids
        })
    }

    fn read<R: Default>(&self, f: impl FnOnce(&ProbeLog) -> R) -> R {
        self.log.lock().map(|log| f(&log)).unwrap_or_default()
    }

    fn take_failure(&self) -> Option<String> {
        self.log
            .lock()
            .ok()
            .and_then(|mut log| log.fail_next_open.take())
    }

    fn record_open(&self, id: ChannelId, endpoint: &Endpoint, sink: EventSink) {
        if let Ok(mut log) = self.log.lock() {
            if log.recording {
                log.opened.push((id, endpoint.clone()));
            }
            log.sinks.insert(id, sink);
        }
    }

    fn record_emit(&self, id: ChannelId, event: &str, payload: Value) {
        if let Ok(mut log) = self.log.lock() {
            if log.recording {
                log.emitted.push((id, event.to_string(), payload));
            }
        }
    }

    fn record_close(&self, id: ChannelId) {
        if let Ok(mut log) = self.log.lock() {
            if log.recording {
                log.closed.push(id);
            }
            log.sinks.remove(&id);
        }
    }
}
