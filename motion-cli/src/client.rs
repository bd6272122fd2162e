use crate::protocol::{
    GaitAnalysis, HealthStatus, SnapshotReceipt, GAIT_ANALYSIS_PATH, HEALTH_PATH, SNAPSHOT_PATH,
};
use crate::ClientError;
use serde::de::DeserializeOwned;
use std::time::Duration;
use telemetry::Envelope;

fn join(base_url: &str, path: &str) -> Result<String, ClientError> {
    let base = base_url.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(ClientError::MissingEndpoint);
    }
    Ok(format!("{base}{path}"))
}

/// POST target for snapshots: the explicit endpoint when set, otherwise the
/// collector's snapshot route under `base_url`.
pub fn snapshot_url(snapshot_endpoint: &str, base_url: &str) -> Result<String, ClientError> {
    let explicit = snapshot_endpoint.trim();
    if explicit.is_empty() {
        join(base_url, SNAPSHOT_PATH)
    } else {
        Ok(explicit.to_string())
    }
}

fn map_error(err: ureq::Error) -> ClientError {
    match err {
        ureq::Error::Status(code, _) => ClientError::Status(code),
        ureq::Error::Transport(transport) => ClientError::Transport(transport.to_string()),
    }
}

fn read_json<T: DeserializeOwned>(response: ureq::Response) -> Result<T, ClientError> {
    response
        .into_json::<T>()
        .map_err(|err| ClientError::InvalidResponse(err.to_string()))
}

/// Sends one envelope as `application/json`. A reply body that is not the
/// expected JSON still counts as delivered.
pub fn post_snapshot(
    endpoint: &str,
    envelope: &Envelope,
    timeout: Duration,
) -> Result<SnapshotReceipt, ClientError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(ClientError::MissingEndpoint);
    }
    log::debug!("posting snapshot {} to {endpoint}", envelope.timestamp);
    let response = ureq::post(endpoint)
        .timeout(timeout)
        .set("Content-Type", "application/json")
        .send_json(envelope.to_value())
        .map_err(map_error)?;
    Ok(read_json(response).unwrap_or_default())
}

pub fn fetch_gait_analysis(base_url: &str, timeout: Duration) -> Result<f64, ClientError> {
    let url = join(base_url, GAIT_ANALYSIS_PATH)?;
    let response = ureq::get(&url).timeout(timeout).call().map_err(map_error)?;
    let analysis: GaitAnalysis = read_json(response)?;
    analysis.cadence().ok_or(ClientError::InvalidCadence)
}

pub fn check_health(base_url: &str, timeout: Duration) -> Result<HealthStatus, ClientError> {
    let url = join(base_url, HEALTH_PATH)?;
    let response = ureq::get(&url).timeout(timeout).call().map_err(map_error)?;
    read_json(response)
}
