use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "motion", version, about = "Motion telemetry dashboard")]
pub struct Cli {
    /// Log at debug level
    #[arg(long, global = true)]
    pub verbose: bool,
    /// Settings file
    #[arg(long, global = true, default_value = "motion.toml")]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Track the simulated sensors and stream them to the collector
    Run {
        #[arg(long, default_value_t = 10)]
        duration_seconds: u64,
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        cadence_ms: Option<u64>,
        /// Sample at the low-power cadence unless --cadence-ms is given
        #[arg(long)]
        low_power: bool,
        /// Use the in-process loopback instead of a network collector
        #[arg(long)]
        loopback: bool,
        /// Write the final accelerometer trend to this SVG file
        #[arg(long)]
        svg: Option<PathBuf>,
    },
    /// Sample briefly and POST one snapshot
    Snapshot {
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Fetch the collector's gait cadence
    Gait {
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Query the collector's health endpoint
    Health {
        #[arg(long)]
        base_url: Option<String>,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write default settings
    Init {
        #[arg(long)]
        force: bool,
    },
    Show,
}
