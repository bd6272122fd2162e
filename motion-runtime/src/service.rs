use crate::message_handler::SessionMessage;
use crate::state::SessionState;
use crate::RuntimeError;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use telemetry::Envelope;

/// Front end to a running session actor. Dropping it shuts the actor down,
/// which releases sensor subscriptions and closes the collector channel.
pub struct SessionHandle {
    session_tx: Sender<SessionMessage>,
    state_rx: Receiver<SessionState>,
    thread: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub(crate) fn new(
        session_tx: Sender<SessionMessage>,
        state_rx: Receiver<SessionState>,
        thread: JoinHandle<()>,
    ) -> Self {
        Self {
            session_tx,
            state_rx,
            thread: Some(thread),
        }
    }

    pub fn start(&self) {
        let _ = self.session_tx.send(SessionMessage::Start);
    }

    pub fn stop(&self) {
        let _ = self.session_tx.send(SessionMessage::Stop);
    }

    pub fn set_endpoint(&self, endpoint: &str) {
        let _ = self
            .session_tx
            .send(SessionMessage::SetEndpoint(endpoint.to_string()));
    }

    pub fn set_cadence(&self, cadence: Duration) {
        let _ = self.session_tx.send(SessionMessage::SetCadence(cadence));
    }

    /// Records a one-shot status line, e.g. the outcome of a snapshot POST.
    pub fn report_status(&self, message: &str) {
        let _ = self
            .session_tx
            .send(SessionMessage::StatusMessage(message.to_string()));
    }

    /// Asks the actor for the latest accelerometer/gyroscope pair.
    pub fn latest_envelope(&self, timeout: Duration) -> Result<Option<Envelope>, RuntimeError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.session_tx
            .send(SessionMessage::LatestEnvelope(reply_tx))
            .map_err(|_| RuntimeError::Closed)?;
        reply_rx
            .recv_timeout(timeout)
            .map_err(|_| RuntimeError::Closed)
    }

    pub fn poll_state(&self) -> Option<SessionState> {
        self.state_rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next published state.
    pub fn next_state(&self, timeout: Duration) -> Result<Option<SessionState>, RuntimeError> {
        match self.state_rx.recv_timeout(timeout) {
            Ok(state) => Ok(Some(state)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(RuntimeError::Closed),
        }
    }

    /// Waits until a published state satisfies `predicate`, returning it.
    pub fn wait_for(
        &self,
        timeout: Duration,
        mut predicate: impl FnMut(&SessionState) -> bool,
    ) -> Result<Option<SessionState>, RuntimeError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            if let Some(state) = self.next_state(remaining)? {
                if predicate(&state) {
                    return Ok(Some(state));
                }
            }
        }
    }

    pub fn shutdown(&mut self) {
        let _ = self.session_tx.send(SessionMessage::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("session actor panicked");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
