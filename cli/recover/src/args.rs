//! CLI argument definitions for recover-logs.

use clap::Parser;
use std::path::PathBuf;

pub use ar_cli_common::LogLevel;

/// Recover filtered Wazuh alerts from daily S3 archives.
///
/// For every day between the two timestamps, downloads
/// `{YYYY}/{Mon}/ossec-archive-{DD}.json.gz` from the bucket, verifies it,
/// and writes the alerts that match the resource and event ID filters to the
/// output file at a capped rate.
///
/// ## Examples
///
/// Recover one day through a local endpoint:
///   recover-logs --min 2024-01-01T00:00:00 --max 2024-01-01T23:59:59 \
///     -o recovered.json -p default -e http://localhost:4566 -b wazuh-archives
///
/// Any event ID, 100 events per pause, 0.5 GB ceiling:
///   recover-logs --min 2024-01-01T00:00:00 --max 2024-01-07T00:00:00 \
///     -o recovered.json -p prod -e https://s3.eu-west-1.amazonaws.com \
///     -b wazuh-archives --any-event-id --eps 100 --max-size 0.5
#[derive(Parser, Debug)]
#[command(name = "recover-logs")]
#[command(version, about, long_about = None)]
pub struct Cli {
    // === Window ===
    /// Lower bound, YYYY-MM-DDTHH:MM:SS
    #[arg(long = "min-timestamp", visible_aliases = ["min", "min_timestamp"])]
    pub min_timestamp: String,

    /// Upper bound, YYYY-MM-DDTHH:MM:SS
    #[arg(long = "max-timestamp", visible_aliases = ["max", "max_timestamp"])]
    pub max_timestamp: String,

    // === Output ===
    /// Output file for recovered alerts
    #[arg(short = 'o', long, visible_alias = "output_file")]
    pub output_file: PathBuf,

    /// Events written between 2 second pauses (must be > 0)
    #[arg(long, default_value = "400")]
    pub eps: u32,

    /// Output size in GB at which the file is truncated and restarted
    #[arg(long, visible_aliases = ["sz", "max_size"], default_value = "1.0")]
    pub max_size: f64,

    // === Filters ===
    /// Required value of data.win.eventInfo.resource
    #[arg(long, default_value = "test@mail.com")]
    pub resource: String,

    /// Accepted data.win.system.eventID (repeatable)
    #[arg(long = "event-id", default_values_t = [302, 303], conflicts_with = "any_event_id")]
    pub event_ids: Vec<i64>,

    /// Accept any data.win.system.eventID
    #[arg(long)]
    pub any_event_id: bool,

    // === AWS Configuration ===
    /// AWS profile name
    #[arg(short = 'p', long, visible_alias = "aws_profile", env = "AWS_PROFILE")]
    pub aws_profile: String,

    /// S3 endpoint URL
    #[arg(short = 'e', long, visible_alias = "s3_endpoint", env = "AR_S3_ENDPOINT")]
    pub s3_endpoint: String,

    /// Bucket holding the daily archives
    #[arg(short = 'b', long)]
    pub bucket: String,

    /// AWS region
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Directory for downloaded archives (defaults to the system temp dir)
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    // === Logging ===
    /// Also append log lines to this file
    #[arg(long, visible_aliases = ["log", "log_file"])]
    pub log_file: Option<PathBuf>,

    /// Log level
    #[arg(short = 'l', long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}
