pub mod client;
pub mod protocol;

pub use client::{check_health, fetch_gait_analysis, post_snapshot, snapshot_url};
pub use protocol::{GaitAnalysis, HealthStatus, SnapshotReceipt};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("no endpoint configured")]
    MissingEndpoint,
    #[error("collector responded with status {0}")]
    Status(u16),
    #[error("{0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("gait analysis returned no usable cadence")]
    InvalidCadence,
}
