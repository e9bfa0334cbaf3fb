//! Logging initialization.
//!
//! Every line is written as
//!
//! ```text
//! 2024-01-31 08:15:02 wazuh-reinjection: Checking for: s3://bucket/2024/Jan/ossec-archive-31.json.gz
//! ```
//!
//! in local time, to stdout and optionally appended to a log file.

use anyhow::{Context, Result};
use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::LogLevel;

/// Tag written after the timestamp on every line.
pub const LOG_TAG: &str = "wazuh-reinjection";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats events as `YYYY-MM-DD HH:MM:SS wazuh-reinjection: message fields`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaggedFormat;

impl<S, N> FormatEvent<S, N> for TaggedFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} {}: ",
            chrono::Local::now().format(TIMESTAMP_FORMAT),
            LOG_TAG
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Initialize logging with the specified level.
///
/// Lines go to stdout, and are also appended to `log_file` when given.
/// Failing to open the log file is an error.
pub fn init_logging(level: LogLevel, log_file: Option<&Path>) -> Result<()> {
    let level: Level = level.into();

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .event_format(TaggedFormat)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(TaggedFormat)
        .with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}
