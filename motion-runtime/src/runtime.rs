use crate::message_handler::{SessionMessage, SessionSettings};
use crate::sensors::SensorCapability;
use crate::service::SessionHandle;
use crate::session::SessionController;
use crate::state::SessionState;
use crate::RuntimeError;
use connection::Connector;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

/// Starts the session actor on its own thread.
///
/// The actor owns the [`SessionController`]; sensor and channel callbacks
/// share its single mailbox, so every input is applied in arrival order.
/// One [`SessionState`] is published per message that changed the session.
pub fn spawn_session(
    settings: SessionSettings,
    sensors: Box<dyn SensorCapability>,
    connector: Box<dyn Connector>,
) -> Result<SessionHandle, RuntimeError> {
    let (session_tx, session_rx) = mpsc::channel::<SessionMessage>();
    let (state_tx, state_rx) = mpsc::channel::<SessionState>();

    let mailbox = session_tx.clone();
    let thread = thread::Builder::new()
        .name("motion-session".to_string())
        .spawn(move || {
            let controller = SessionController::new(settings, sensors, connector, mailbox);
            run_session(controller, session_rx, state_tx);
        })
        .map_err(RuntimeError::Spawn)?;

    Ok(SessionHandle::new(session_tx, state_rx, thread))
}

fn run_session(
    mut controller: SessionController,
    session_rx: Receiver<SessionMessage>,
    state_tx: Sender<SessionState>,
) {
    while let Ok(message) = session_rx.recv() {
        let shutdown = matches!(message, SessionMessage::Shutdown);
        if controller.handle(message) {
            let _ = state_tx.send(controller.snapshot_state());
        }
        if shutdown {
            break;
        }
    }
    log::info!("session actor exiting");
}
