use crate::endpoint::Endpoint;
use crate::socketio::{self, EnginePacket, SocketPacket};
use crate::{Channel, ChannelEvent, ChannelId, ConnectionError, Connector, EventSink};
use serde_json::Value;
use std::io::ErrorKind;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Opens Socket.IO channels over a WebSocket, one worker thread per channel.
#[derive(Debug, Clone)]
pub struct SocketIoConnector {
    /// How long a worker blocks on the socket before servicing outbound
    /// emits, the close flag and the heartbeat deadline.
    pub poll_interval: Duration,
    /// Bound on the TCP connect and the WebSocket handshake.
    pub connect_timeout: Duration,
    /// How long `close` waits for the worker to say goodbye to the server.
    pub close_grace: Duration,
}

impl Default for SocketIoConnector {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(20),
            connect_timeout: Duration::from_secs(5),
            close_grace: Duration::from_millis(250),
        }
    }
}

impl Connector for SocketIoConnector {
    fn open(
        &mut self,
        id: ChannelId,
        endpoint: &Endpoint,
        events: EventSink,
    ) -> Result<Box<dyn Channel>, ConnectionError> {
        let (outbound_tx, outbound_rx) = mpsc::channel();
        let (finished_tx, finished_rx) = mpsc::channel();
        let closed = Arc::new(AtomicBool::new(false));
        let worker = ChannelWorker {
            id,
            endpoint: endpoint.clone(),
            events,
            outbound: outbound_rx,
            closed: closed.clone(),
            poll_interval: self.poll_interval,
            connect_timeout: self.connect_timeout,
            _finished: finished_tx,
        };
        thread::Builder::new()
            .name(format!("socketio-{}", id.0))
            .spawn(move || worker.run())
            .map_err(|err| ConnectionError::Transport(err.to_string()))?;
        log::debug!("channel {id} dialing {}", endpoint.socket_url);
        Ok(Box::new(SocketIoChannel {
            id,
            namespace: endpoint.namespace.clone(),
            outbound: outbound_tx,
            closed,
            finished: finished_rx,
            close_grace: self.close_grace,
        }))
    }
}

pub struct SocketIoChannel {
    id: ChannelId,
    namespace: String,
    outbound: Sender<String>,
    closed: Arc<AtomicBool>,
    /// Disconnects once the worker thread has exited.
    finished: Receiver<()>,
    close_grace: Duration,
}

impl Channel for SocketIoChannel {
    fn emit(&mut self, event: &str, payload: Value) -> Result<(), ConnectionError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ConnectionError::ChannelClosed);
        }
        self.outbound
            .send(socketio::encode_event(&self.namespace, event, payload))
            .map_err(|_| ConnectionError::SendFailed)
    }

    fn close(&mut self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        log::debug!("channel {} closing", self.id);
        if let Err(RecvTimeoutError::Timeout) = self.finished.recv_timeout(self.close_grace) {
            log::warn!("channel {} worker still busy after close", self.id);
        }
    }
}

impl Drop for SocketIoChannel {
    fn drop(&mut self) {
        self.close();
    }
}

enum Flow {
    Continue,
    Stop,
}

/// Per-connection engine bookkeeping: namespace membership and heartbeat.
struct EngineState {
    joined: bool,
    /// `pingInterval + pingTimeout` from the handshake.
    ping_window: Option<Duration>,
    last_ping: Instant,
}

impl EngineState {
    fn new() -> Self {
        Self {
            joined: false,
            ping_window: None,
            last_ping: Instant::now(),
        }
    }

    fn on_open(&mut self, handshake: &Value) {
        let interval = handshake.get("pingInterval").and_then(Value::as_u64);
        let timeout = handshake.get("pingTimeout").and_then(Value::as_u64);
        if let (Some(interval), Some(timeout)) = (interval, timeout) {
            self.ping_window = Some(Duration::from_millis(interval + timeout));
        }
        self.last_ping = Instant::now();
    }

    fn on_ping(&mut self) {
        self.last_ping = Instant::now();
    }

    fn heartbeat_expired(&self) -> bool {
        self.ping_window
            .is_some_and(|window| self.last_ping.elapsed() > window)
    }
}

struct ChannelWorker {
    id: ChannelId,
    endpoint: Endpoint,
    events: EventSink,
    outbound: Receiver<String>,
    closed: Arc<AtomicBool>,
    poll_interval: Duration,
    connect_timeout: Duration,
    _finished: Sender<()>,
}

impl ChannelWorker {
    fn run(self) {
        let mut socket = match self.connect() {
            Ok(socket) => socket,
            Err(reason) => {
                log::error!("channel {} failed to connect: {reason}", self.id);
                self.notify(ChannelEvent::ConnectError(reason));
                return;
            }
        };

        let mut engine = EngineState::new();
        loop {
            if self.is_closed() {
                self.shutdown(&mut socket, engine.joined);
                return;
            }
            if let Flow::Stop = self.flush_outbound(&mut socket) {
                self.shutdown(&mut socket, engine.joined);
                return;
            }
            match socket.read() {
                Ok(Message::Text(text)) => match self.handle_text(&mut socket, &text, &mut engine) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Stop) => return,
                    Err(err) => log::warn!("channel {} dropped packet: {err}", self.id),
                },
                Ok(Message::Close(_)) => {
                    self.notify(ChannelEvent::Disconnected("transport close".to_string()));
                    return;
                }
                Ok(_) => {}
                Err(tungstenite::Error::Io(err))
                    if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    self.notify(ChannelEvent::Disconnected("transport close".to_string()));
                    return;
                }
                Err(err) => {
                    log::error!("channel {} transport error: {err}", self.id);
                    self.notify(ChannelEvent::ConnectError(err.to_string()));
                    return;
                }
            }
            if engine.heartbeat_expired() {
                log::error!("channel {} missed the server heartbeat", self.id);
                self.notify(ChannelEvent::ConnectError("ping timeout".to_string()));
                return;
            }
        }
    }

    fn connect(&self) -> Result<Socket, String> {
        if self.endpoint.secure {
            return Err(format!(
                "cannot dial {}: TLS transport is not available",
                self.endpoint.socket_url
            ));
        }
        let target = self.endpoint.socket_addr();
        let addrs = target
            .to_socket_addrs()
            .map_err(|err| format!("cannot resolve {target}: {err}"))?;
        let mut last_error = format!("no address for {target}");
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(connected) => {
                    stream = Some(connected);
                    break;
                }
                Err(err) => last_error = format!("cannot reach {addr}: {err}"),
            }
        }
        let stream = stream.ok_or(last_error)?;
        stream
            .set_read_timeout(Some(self.connect_timeout))
            .map_err(|err| err.to_string())?;

        let (mut socket, _response) =
            tungstenite::client(self.endpoint.socket_url.as_str(), MaybeTlsStream::Plain(stream))
                .map_err(|err| err.to_string())?;
        if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
            if let Err(err) = stream.set_read_timeout(Some(self.poll_interval)) {
                log::warn!("channel {} cannot set read timeout: {err}", self.id);
            }
        }
        Ok(socket)
    }

    fn handle_text(
        &self,
        socket: &mut Socket,
        text: &str,
        engine: &mut EngineState,
    ) -> Result<Flow, ConnectionError> {
        match socketio::decode(text)? {
            EnginePacket::Open(handshake) => {
                engine.on_open(&handshake);
                self.send(socket, socketio::encode_connect(&self.endpoint.namespace))?;
            }
            EnginePacket::Ping(payload) => {
                engine.on_ping();
                self.send(socket, socketio::encode_pong(&payload))?;
            }
            EnginePacket::Close => {
                self.notify(ChannelEvent::Disconnected("transport close".to_string()));
                return Ok(Flow::Stop);
            }
            EnginePacket::Message(packet) => {
                if matches!(packet, SocketPacket::Connect { .. })
                    && packet.namespace() == self.endpoint.namespace
                {
                    engine.joined = true;
                }
                let stop = matches!(packet, SocketPacket::Disconnect { .. })
                    && packet.namespace() == self.endpoint.namespace;
                if let Some(event) = socketio::channel_event(packet, &self.endpoint.namespace) {
                    self.notify(event);
                }
                if stop {
                    return Ok(Flow::Stop);
                }
            }
            EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => {}
        }
        Ok(Flow::Continue)
    }

    fn flush_outbound(&self, socket: &mut Socket) -> Flow {
        loop {
            match self.outbound.try_recv() {
                Ok(text) => {
                    if let Err(err) = self.send(socket, text) {
                        log::error!("channel {} write failed: {err}", self.id);
                        self.notify(ChannelEvent::ConnectError(err.to_string()));
                        return Flow::Stop;
                    }
                }
                Err(TryRecvError::Empty) => return Flow::Continue,
                Err(TryRecvError::Disconnected) => return Flow::Stop,
            }
        }
    }

    fn send(&self, socket: &mut Socket, text: String) -> Result<(), ConnectionError> {
        socket
            .send(Message::Text(text))
            .map_err(|err| ConnectionError::Transport(err.to_string()))
    }

    fn shutdown(&self, socket: &mut Socket, joined: bool) {
        if joined {
            let _ = self.send(socket, socketio::encode_disconnect(&self.endpoint.namespace));
        }
        let _ = socket.close(None);
        let _ = socket.flush();
        log::debug!("channel {} closed", self.id);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Events are only delivered while the owner still holds the channel.
    fn notify(&self, event: ChannelEvent) {
        if !self.is_closed() {
            (self.events)(self.id, event);
        }
    }
}
