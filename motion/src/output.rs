use connection::{ConnectionStatus, FallAlert};
use motion_cli::HealthStatus;
use motion_runtime::{ChannelSummary, SessionState};

pub fn print_info(message: &str) {
    println!("[Motion][INFO] {message}");
}

pub fn print_error(message: &str) {
    eprintln!("[Motion][ERROR]: {message}");
}

pub fn print_status(status: ConnectionStatus, message: Option<&str>) {
    match message {
        Some(message) => print_info(&format!("Connection {status}: {message}")),
        None => print_info(&format!("Connection {status}")),
    }
}

pub fn print_alert(alert: &FallAlert) {
    let mut line = format!("ALERT {}", alert.message);
    if let Some(acceleration) = alert.acceleration {
        line.push_str(&format!(" (acceleration {acceleration:.2} m/s²)"));
    }
    if let Some(timestamp) = &alert.timestamp {
        line.push_str(&format!(" at {timestamp}"));
    }
    print_info(&line);
}

fn channel_line(name: &str, summary: &ChannelSummary) -> String {
    let latest = &summary.latest;
    let mut line = format!(
        "{name}: x={:.2} y={:.2} z={:.2} |a|={:.2} n={}",
        latest.x, latest.y, latest.z, latest.magnitude, summary.len
    );
    if let Some(stats) = &summary.stats {
        line.push_str(&format!(
            " min={:.2} mean={:.2} max={:.2}",
            stats.min, stats.mean, stats.max
        ));
    }
    if let Some(window) = summary.window_seconds {
        line.push_str(&format!(" window={window:.1}s"));
    }
    line
}

pub fn print_session(state: &SessionState) {
    println!("{}", channel_line("accelerometer", &state.accelerometer));
    println!("{}", channel_line("gyroscope", &state.gyroscope));
    let mut echo = format!("echo: n={}", state.echo.len);
    if let Some(stats) = &state.echo.stats {
        echo.push_str(&format!(" mean={:.2}", stats.mean));
    }
    println!("{echo} published={}", state.published);
}

pub fn print_health(health: &HealthStatus) {
    match &health.timestamp {
        Some(timestamp) => print_info(&format!("Collector {} at {timestamp}", health.status)),
        None => print_info(&format!("Collector {}", health.status)),
    }
}
