use crate::trend::ChartSurface;
use crate::validation::Validator;
use connection::{normalize_namespace, DEFAULT_NAMESPACE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CADENCE_MS: u64 = 100;
pub const LOW_POWER_CADENCE_MS: u64 = 500;
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write settings file '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    pub cadence_ms: u64,
}

impl SamplingSettings {
    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            cadence_ms: DEFAULT_CADENCE_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorSettings {
    /// Duplex endpoint; empty means "not configured".
    pub socket_endpoint: String,
    /// POST target for one-shot snapshots.
    pub snapshot_endpoint: String,
    pub base_url: String,
    pub namespace: String,
    pub request_timeout_secs: u64,
}

impl CollectorSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            socket_endpoint: String::new(),
            snapshot_endpoint: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl ChartSettings {
    pub fn surface(&self) -> ChartSurface {
        ChartSurface::new(self.width, self.height, self.padding)
    }
}

impl Default for ChartSettings {
    fn default() -> Self {
        let surface = ChartSurface::default();
        Self {
            width: surface.width,
            height: surface.height,
            padding: surface.padding,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub sampling: SamplingSettings,
    pub collector: CollectorSettings,
    pub chart: ChartSettings,
}

pub fn normalize_settings(
    mut settings: DashboardSettings,
) -> Result<DashboardSettings, SettingsError> {
    settings.sampling.cadence_ms = Validator::clamp_cadence_ms(settings.sampling.cadence_ms);

    let collector = &mut settings.collector;
    collector.socket_endpoint = collector.socket_endpoint.trim().to_string();
    collector.snapshot_endpoint = collector.snapshot_endpoint.trim().to_string();
    collector.base_url = collector.base_url.trim().trim_end_matches('/').to_string();
    collector.namespace = normalize_namespace(&collector.namespace);
    collector.request_timeout_secs = collector.request_timeout_secs.max(1);
    if collector.base_url.is_empty() {
        collector.base_url = DEFAULT_BASE_URL.to_string();
    } else if !Validator::validate_http_url(&collector.base_url) {
        return Err(SettingsError::Invalid(format!(
            "collector.base_url must be an http(s) URL, got '{}'",
            collector.base_url
        )));
    }

    settings.chart.width = Validator::non_negative(settings.chart.width);
    settings.chart.height = Validator::non_negative(settings.chart.height);
    settings.chart.padding = Validator::non_negative(settings.chart.padding);
    Ok(settings)
}

/// Loads settings from `path`; a missing file yields the defaults.
pub fn load_settings(path: &Path) -> Result<DashboardSettings, SettingsError> {
    if !path.exists() {
        log::debug!("no settings at '{}', using defaults", path.display());
        return Ok(DashboardSettings::default());
    }
    let data = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: DashboardSettings =
        toml::from_str(&data).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    normalize_settings(settings)
}

pub fn save_settings(path: &Path, settings: &DashboardSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let data = settings_to_toml(settings)?;
    std::fs::write(path, data).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn settings_to_toml(settings: &DashboardSettings) -> Result<String, SettingsError> {
    Ok(toml::to_string_pretty(settings)?)
}
