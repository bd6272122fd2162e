use serde::{Deserialize, Serialize};

pub const SNAPSHOT_PATH: &str = "/api/sensors";
pub const GAIT_ANALYSIS_PATH: &str = "/api/gait-analysis";
pub const HEALTH_PATH: &str = "/health";

/// Body of the collector's reply to a snapshot POST.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotReceipt {
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /api/gait-analysis`. The cadence is kept loose so a missing or
/// non-numeric value can be reported instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GaitAnalysis {
    #[serde(default)]
    pub cadence: Option<serde_json::Value>,
}

impl GaitAnalysis {
    pub fn cadence(&self) -> Option<f64> {
        self.cadence
            .as_ref()
            .and_then(serde_json::Value::as_f64)
            .filter(|cadence| cadence.is_finite())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}
