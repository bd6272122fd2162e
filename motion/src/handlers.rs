use crate::commands::*;
use crate::output::*;
use connection::{ConnectionConfig, ConnectionFactory, ConnectionKind, ConnectionStatus};
use motion_cli::{check_health, fetch_gait_analysis, post_snapshot, snapshot_url, ClientError};
use motion_core::{
    load_settings, normalize_settings, render_svg, save_settings, settings_to_toml,
    DashboardSettings, LOW_POWER_CADENCE_MS,
};
use motion_runtime::{spawn_session, SessionSettings, SessionState, SimulatedSensors};
use std::path::Path;
use std::time::{Duration, Instant};

const STATE_POLL: Duration = Duration::from_millis(100);
const REPORT_EVERY: Duration = Duration::from_secs(1);
const SNAPSHOT_WARMUP: Duration = Duration::from_secs(3);

pub fn handle_command(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Run {
            duration_seconds,
            endpoint,
            cadence_ms,
            low_power,
            loopback,
            svg,
        } => {
            let mut settings = load_settings(&cli.config)?;
            if let Some(endpoint) = endpoint {
                settings.collector.socket_endpoint = endpoint;
            }
            if low_power {
                settings.sampling.cadence_ms = LOW_POWER_CADENCE_MS;
            }
            if let Some(cadence_ms) = cadence_ms {
                settings.sampling.cadence_ms = cadence_ms;
            }
            let settings = normalize_settings(settings)?;
            run_session(
                &settings,
                Duration::from_secs(duration_seconds),
                loopback,
                svg.as_deref(),
            )?;
        }
        Commands::Snapshot { endpoint } => {
            let mut settings = load_settings(&cli.config)?;
            if let Some(endpoint) = endpoint {
                settings.collector.snapshot_endpoint = endpoint;
            }
            send_snapshot(&normalize_settings(settings)?)?;
        }
        Commands::Gait { base_url } => {
            let settings = with_base_url(load_settings(&cli.config)?, base_url)?;
            let collector = &settings.collector;
            match fetch_gait_analysis(&collector.base_url, collector.request_timeout()) {
                Ok(cadence) => print_info(&format!("Cadence: {cadence}")),
                Err(err) => print_error(&format!("Gait analysis failed: {err}")),
            }
        }
        Commands::Health { base_url } => {
            let settings = with_base_url(load_settings(&cli.config)?, base_url)?;
            let collector = &settings.collector;
            match check_health(&collector.base_url, collector.request_timeout()) {
                Ok(health) => print_health(&health),
                Err(err) => print_error(&format!("Health check failed: {err}")),
            }
        }
        Commands::Config { command } => handle_config_command(command, &cli.config)?,
    }
    Ok(())
}

fn with_base_url(
    mut settings: DashboardSettings,
    base_url: Option<String>,
) -> Result<DashboardSettings, Box<dyn std::error::Error>> {
    if let Some(base_url) = base_url {
        settings.collector.base_url = base_url;
    }
    Ok(normalize_settings(settings)?)
}

fn handle_config_command(
    command: ConfigCommands,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                print_error(&format!(
                    "Settings file '{}' already exists (use --force to overwrite)",
                    path.display()
                ));
                return Ok(());
            }
            save_settings(path, &DashboardSettings::default())?;
            print_info(&format!("Wrote default settings to '{}'", path.display()));
        }
        ConfigCommands::Show => {
            let settings = load_settings(path)?;
            print!("{}", settings_to_toml(&settings)?);
        }
    }
    Ok(())
}

fn connection_config(settings: &DashboardSettings, loopback: bool) -> ConnectionConfig {
    ConnectionConfig {
        kind: if loopback {
            ConnectionKind::InProcess
        } else {
            ConnectionKind::SocketIo
        },
        default_namespace: settings.collector.namespace.clone(),
        ..ConnectionConfig::default()
    }
}

fn run_session(
    settings: &DashboardSettings,
    duration: Duration,
    loopback: bool,
    svg: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session_settings = SessionSettings::from_dashboard(settings);
    if loopback && session_settings.endpoint.is_empty() {
        session_settings.endpoint = "loopback".to_string();
    }
    let surface = session_settings.surface;
    let session = spawn_session(
        session_settings,
        Box::new(SimulatedSensors::new(settings.sampling.cadence())),
        ConnectionFactory::create(&connection_config(settings, loopback)),
    )?;
    session.start();
    print_info(&format!(
        "Tracking for {}s at {} ms cadence",
        duration.as_secs(),
        settings.sampling.cadence_ms
    ));

    let started = Instant::now();
    let mut last_report = Instant::now();
    let mut last_status: Option<(ConnectionStatus, Option<String>)> = None;
    let mut last_message: Option<String> = None;
    let mut latest: Option<SessionState> = None;
    while started.elapsed() < duration {
        let Some(state) = session.next_state(STATE_POLL)? else {
            continue;
        };
        let status = (state.status, state.connection_message.clone());
        if last_status.as_ref() != Some(&status) {
            print_status(state.status, state.connection_message.as_deref());
            last_status = Some(status);
        }
        if state.status_message != last_message {
            if let Some(message) = &state.status_message {
                print_info(message);
            }
            last_message = state.status_message.clone();
        }
        for alert in &state.alerts {
            print_alert(alert);
        }
        if last_report.elapsed() >= REPORT_EVERY {
            print_session(&state);
            last_report = Instant::now();
        }
        latest = Some(state);
    }
    while let Some(state) = session.poll_state() {
        for alert in &state.alerts {
            print_alert(alert);
        }
        latest = Some(state);
    }

    if let Some(state) = &latest {
        print_session(state);
        if let Some(path) = svg {
            match &state.accelerometer.trend {
                Some(chart) => {
                    std::fs::write(path, render_svg(chart, &surface))?;
                    print_info(&format!("Wrote accelerometer trend to '{}'", path.display()));
                }
                None => print_error("Not enough samples to draw a trend"),
            }
        }
    } else if svg.is_some() {
        print_error("Not enough samples to draw a trend");
    }
    session.stop();
    print_info("Tracking stopped");
    Ok(())
}

fn send_snapshot(settings: &DashboardSettings) -> Result<(), Box<dyn std::error::Error>> {
    let collector = &settings.collector;
    let url = match snapshot_url(&collector.snapshot_endpoint, &collector.base_url) {
        Ok(url) => url,
        Err(err) => {
            print_error(&format!("Snapshot failed: {err}"));
            return Ok(());
        }
    };

    let session = spawn_session(
        SessionSettings {
            endpoint: String::new(),
            ..SessionSettings::from_dashboard(settings)
        },
        Box::new(SimulatedSensors::new(settings.sampling.cadence())),
        ConnectionFactory::create(&connection_config(settings, true)),
    )?;
    session.start();
    let ready = session.wait_for(SNAPSHOT_WARMUP, |state| {
        state.accelerometer.len > 0 && state.gyroscope.len > 0
    })?;
    if ready.is_none() {
        print_error("Snapshot failed: no sensor readings arrived");
        return Ok(());
    }
    let Some(envelope) = session.latest_envelope(SNAPSHOT_WARMUP)? else {
        print_error("Snapshot failed: no sensor readings arrived");
        return Ok(());
    };

    let message = match post_snapshot(&url, &envelope, collector.request_timeout()) {
        Ok(receipt) => {
            let text = receipt
                .message
                .unwrap_or_else(|| "Snapshot sent successfully.".to_string());
            print_info(&text);
            text
        }
        Err(ClientError::Status(code)) => {
            let text = format!("Snapshot failed with status {code}");
            print_error(&text);
            text
        }
        Err(err) => {
            let text = format!("Snapshot failed: {err}");
            print_error(&text);
            text
        }
    };
    session.report_status(&message);
    session.stop();
    Ok(())
}
