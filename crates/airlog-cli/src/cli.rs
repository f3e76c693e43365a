//! Command-line argument definitions.
//!
//! Every deployment setting is an explicit flag with an environment-variable
//! fallback, so the same binary works interactively and from a systemd unit
//! or cron entry with nothing but environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use airlog_core::{DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use airlog_store::{InfluxConfig, RecordTags};

#[derive(Parser, Debug)]
#[command(name = "airlog")]
#[command(author, version, about = "Log Aranet4 sensor readings to InfluxDB", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Append logs to this file in addition to stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// InfluxDB connection settings.
#[derive(Args, Debug, Clone)]
pub struct InfluxArgs {
    /// InfluxDB base URL
    #[arg(long, env = "INFLUX_URL", default_value = "http://localhost:8086")]
    pub influx_url: String,

    /// InfluxDB API token
    #[arg(long, env = "INFLUXDB_TOKEN", hide_env_values = true)]
    pub influx_token: String,

    /// InfluxDB organization
    #[arg(long, env = "INFLUX_ORG", default_value = "home")]
    pub influx_org: String,

    /// Destination bucket
    #[arg(long, env = "INFLUX_BUCKET", default_value = "sensors")]
    pub influx_bucket: String,
}

impl InfluxArgs {
    pub fn to_config(&self) -> InfluxConfig {
        InfluxConfig {
            url: self.influx_url.clone(),
            token: self.influx_token.clone(),
            org: self.influx_org.clone(),
            bucket: self.influx_bucket.clone(),
        }
    }
}

/// Tags attached to every record written for this deployment.
#[derive(Args, Debug, Clone)]
pub struct TagArgs {
    /// Logical device name tag
    #[arg(long, env = "DEVICE_NAME", default_value = "aranet4")]
    pub device_name: String,

    /// Location tag
    #[arg(long, env = "LOCATION", default_value = "unknown")]
    pub location: String,
}

impl TagArgs {
    pub fn to_tags(&self, mac: &str) -> RecordTags {
        RecordTags {
            device: self.device_name.clone(),
            location: self.location.clone(),
            mac_address: mac.to_string(),
        }
    }
}

/// Retry behavior shared by all fallible operations.
#[derive(Args, Debug, Clone)]
pub struct RetryArgs {
    /// Attempts per operation, including the first
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub attempts: u32,

    /// Delay between attempts in seconds
    #[arg(long, default_value_t = 5)]
    pub retry_delay: u64,
}

impl RetryArgs {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_secs(self.retry_delay))
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read the sensor once and write the reading to InfluxDB
    Log {
        /// Sensor MAC address
        #[arg(long, env = "ARANET_MAC")]
        mac: String,

        #[command(flatten)]
        influx: InfluxArgs,

        #[command(flatten)]
        tags: TagArgs,

        #[command(flatten)]
        retry: RetryArgs,
    },

    /// Download the sensor's stored history and backfill InfluxDB
    Recover {
        /// Sensor MAC address
        #[arg(long, env = "ARANET_MAC")]
        mac: String,

        /// Only backfill records newer than this many hours
        #[arg(long)]
        since_hours: Option<u64>,

        #[command(flatten)]
        influx: InfluxArgs,

        #[command(flatten)]
        tags: TagArgs,

        #[command(flatten)]
        retry: RetryArgs,
    },

    /// Import a CSV file exported from the Aranet mobile app
    Import {
        /// Path to the exported CSV file
        file: PathBuf,

        /// MAC address tag for the imported records
        #[arg(long, env = "ARANET_MAC", default_value = "unknown")]
        mac: String,

        #[command(flatten)]
        influx: InfluxArgs,

        #[command(flatten)]
        tags: TagArgs,

        #[command(flatten)]
        retry: RetryArgs,
    },

    /// Experimental Eve Room exploration (nothing here writes to the store)
    Eve {
        #[command(subcommand)]
        action: EveAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum EveAction {
    /// Watch BLE advertisements and log speculative payload decodes
    Watch {
        /// Only show advertisements matching this address or name
        #[arg(long)]
        target: Option<String>,

        /// How long to listen, in seconds
        #[arg(long, default_value = "30")]
        duration: u64,
    },

    /// Connect to a device and dump every GATT service and characteristic
    Dump {
        /// Device address or name
        device: String,

        /// Scan timeout in seconds
        #[arg(long, default_value = "10")]
        scan_duration: u64,
    },
}
