use connection::{
    Channel, ChannelEvent, ChannelId, Connector, Endpoint, EventSink, SocketIoConnector,
};
use serde_json::json;
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tungstenite::{Message, WebSocket};

const WAIT: Duration = Duration::from_secs(3);
const HANDSHAKE: &str =
    r#"0{"sid":"s1","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

type Server = WebSocket<TcpStream>;

/// Accepts one WebSocket client on a fresh port and runs `script` against it.
fn serve<T, F>(script: F) -> (String, JoinHandle<T>)
where
    T: Send + 'static,
    F: FnOnce(&mut Server) -> T + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}/stream", listener.local_addr().expect("addr"));
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut server = tungstenite::accept(stream).expect("websocket handshake");
        script(&mut server)
    });
    (url, handle)
}

fn send(server: &mut Server, text: &str) {
    server
        .send(Message::Text(text.to_string()))
        .expect("server send");
}

/// Next text frame from the client, or `None` once it closed.
fn read_text(server: &mut Server) -> Option<String> {
    loop {
        match server.read() {
            Ok(Message::Text(text)) => return Some(text),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

fn connector() -> SocketIoConnector {
    SocketIoConnector {
        close_grace: WAIT,
        ..SocketIoConnector::default()
    }
}

fn open(url: &str) -> (Box<dyn Channel>, Receiver<ChannelEvent>) {
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let sink: EventSink = Arc::new(move |id, event| {
        assert_eq!(id, ChannelId(1));
        let _ = tx.lock().unwrap().send(event);
    });
    let endpoint = Endpoint::parse(url, "/stream").expect("endpoint");
    let channel = connector()
        .open(ChannelId(1), &endpoint, sink)
        .expect("open channel");
    (channel, rx)
}

#[test]
fn joins_namespace_answers_pings_and_exchanges_events() {
    let (url, server) = serve(|server| {
        let mut received = Vec::new();
        send(server, HANDSHAKE);
        received.push(read_text(server));
        send(server, r#"40/stream,{"sid":"n1"}"#);
        send(server, "2");
        received.push(read_text(server));
        send(
            server,
            r#"42/stream,["sensor_update",{"timestamp":5,"accelerometer":{"z":9.8}}]"#,
        );
        received.push(read_text(server));
        received.push(read_text(server));
        received
    });

    let (mut channel, events) = open(&url);
    assert_eq!(events.recv_timeout(WAIT).expect("connected"), ChannelEvent::Connected);
    match events.recv_timeout(WAIT).expect("sensor update") {
        ChannelEvent::SensorUpdate(payload) => {
            assert_eq!(payload["timestamp"], 5);
            assert_eq!(payload["accelerometer"]["z"], 9.8);
        }
        other => panic!("unexpected event {other:?}"),
    }

    channel
        .emit("sensor_update", json!({"timestamp": 9}))
        .expect("emit");
    thread::sleep(Duration::from_millis(100));
    channel.close();

    let received = server.join().expect("server");
    assert_eq!(
        received,
        vec![
            Some("40/stream,".to_string()),
            Some("3".to_string()),
            Some(r#"42/stream,["sensor_update",{"timestamp":9}]"#.to_string()),
            Some("41/stream,".to_string()),
        ]
    );
    assert!(channel.emit("sensor_update", json!({})).is_err());
}

#[test]
fn silent_server_trips_heartbeat_deadline() {
    let (url, server) = serve(|server| {
        send(
            server,
            r#"0{"sid":"s2","upgrades":[],"pingInterval":100,"pingTimeout":100}"#,
        );
        let join = read_text(server);
        send(server, "40/stream,");
        // Never ping; wait for the client to give up.
        while read_text(server).is_some() {}
        join
    });

    let (_channel, events) = open(&url);
    assert_eq!(events.recv_timeout(WAIT).expect("connected"), ChannelEvent::Connected);
    assert_eq!(
        events.recv_timeout(WAIT).expect("heartbeat failure"),
        ChannelEvent::ConnectError("ping timeout".to_string())
    );
    assert_eq!(server.join().expect("server").as_deref(), Some("40/stream,"));
}

#[test]
fn server_side_close_reports_disconnect() {
    let (url, server) = serve(|server| {
        send(server, HANDSHAKE);
        read_text(server);
        send(server, "40/stream,");
        send(server, "41/stream,");
        while read_text(server).is_some() {}
    });

    let (_channel, events) = open(&url);
    assert_eq!(events.recv_timeout(WAIT).expect("connected"), ChannelEvent::Connected);
    assert_eq!(
        events.recv_timeout(WAIT).expect("disconnect"),
        ChannelEvent::Disconnected("io server disconnect".to_string())
    );
    server.join().expect("server");
}

#[test]
fn unreachable_collector_is_a_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);

    let (_channel, events) = open(&url);
    assert!(matches!(
        events.recv_timeout(WAIT).expect("failure"),
        ChannelEvent::ConnectError(_)
    ));
}

#[test]
fn secure_endpoint_without_tls_fails_fast() {
    let (_channel, events) = open("wss://127.0.0.1:9");
    match events.recv_timeout(WAIT).expect("failure") {
        ChannelEvent::ConnectError(reason) => assert!(reason.contains("TLS")),
        other => panic!("unexpected event {other:?}"),
    }
}
