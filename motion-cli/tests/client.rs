use motion_cli::{
    check_health, fetch_gait_analysis, post_snapshot, snapshot_url, ClientError,
};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use telemetry::{Envelope, Reading};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Serves a single canned response and hands back the raw request.
fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}", listener.local_addr().expect("addr"));
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream);
        let mut head = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("read line");
            if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap_or(0);
            }
            let done = line == "\r\n";
            head.push_str(&line);
            if done {
                break;
            }
        }
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).expect("read body");
        reader
            .get_mut()
            .write_all(response.as_bytes())
            .expect("write response");
        head + &String::from_utf8_lossy(&body)
    });
    (url, handle)
}

fn envelope() -> Envelope {
    Envelope::new(
        1_700_000_000_000,
        Reading::new(0.0, 0.0, 9.8, 1_700_000_000_000),
        Reading::new(0.1, 0.2, 0.3, 1_700_000_000_000),
    )
}

#[test]
fn snapshot_is_posted_as_json() {
    let (url, server) = serve_once("200 OK", r#"{"message":"Snapshot received."}"#);
    let receipt = post_snapshot(&format!("{url}/api/sensors"), &envelope(), TIMEOUT)
        .expect("snapshot accepted");
    assert_eq!(receipt.message.as_deref(), Some("Snapshot received."));

    let request = server.join().expect("server");
    assert!(request.starts_with("POST /api/sensors HTTP/1.1"));
    assert!(request
        .to_ascii_lowercase()
        .contains("content-type: application/json"));
    let body = &request[request.find("\r\n\r\n").expect("body") + 4..];
    let json: serde_json::Value = serde_json::from_str(body).expect("json body");
    assert_eq!(json["timestamp"], 1_700_000_000_000i64);
    assert_eq!(json["accelerometer"]["z"], 9.8);
    assert_eq!(json["gyroscope"]["x"], 0.1);
}

#[test]
fn snapshot_non_2xx_surfaces_status_code() {
    let (url, server) = serve_once(
        "400 Bad Request",
        r#"{"message":"Invalid or missing JSON body."}"#,
    );
    let err = post_snapshot(&url, &envelope(), TIMEOUT).unwrap_err();
    assert_eq!(err, ClientError::Status(400));
    server.join().expect("server");
}

#[test]
fn snapshot_network_failure_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);
    let err = post_snapshot(&url, &envelope(), TIMEOUT).unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

#[test]
fn snapshot_requires_endpoint() {
    assert_eq!(
        post_snapshot("  ", &envelope(), TIMEOUT).unwrap_err(),
        ClientError::MissingEndpoint
    );
}

#[test]
fn snapshot_url_falls_back_to_collector_route() {
    assert_eq!(
        snapshot_url("", "http://localhost:3000/").unwrap(),
        "http://localhost:3000/api/sensors"
    );
    assert_eq!(
        snapshot_url(" http://10.0.0.2:3000/api/sensors ", "http://ignored").unwrap(),
        "http://10.0.0.2:3000/api/sensors"
    );
    assert_eq!(snapshot_url("", "").unwrap_err(), ClientError::MissingEndpoint);
}

#[test]
fn gait_analysis_returns_cadence() {
    let (url, server) = serve_once("200 OK", r#"{"cadence": 112.5}"#);
    let cadence = fetch_gait_analysis(&url, TIMEOUT).expect("cadence");
    assert_eq!(cadence, 112.5);
    let request = server.join().expect("server");
    assert!(request.starts_with("GET /api/gait-analysis HTTP/1.1"));
}

#[test]
fn gait_analysis_without_numeric_cadence_fails() {
    for body in [r#"{}"#, r#"{"cadence": "fast"}"#, r#"{"cadence": null}"#] {
        let (url, server) = serve_once("200 OK", body);
        assert_eq!(
            fetch_gait_analysis(&url, TIMEOUT).unwrap_err(),
            ClientError::InvalidCadence
        );
        server.join().expect("server");
    }
}

#[test]
fn health_reports_status_and_timestamp() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"status":"ok","timestamp":"2024-05-01T10:00:00.000Z"}"#,
    );
    let health = check_health(&url, TIMEOUT).expect("health");
    assert!(health.is_ok());
    assert_eq!(health.timestamp.as_deref(), Some("2024-05-01T10:00:00.000Z"));
    let request = server.join().expect("server");
    assert!(request.starts_with("GET /health HTTP/1.1"));
}
