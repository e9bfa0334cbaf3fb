//! Statistics for recovery runs.

use crate::sink::SinkStats;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

/// Counters for one day's archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayStats {
    /// Decompressed lines read, blank lines included
    pub lines_read: u64,

    /// Records that passed the filter
    pub records_matched: u64,

    /// Lines that were not valid JSON
    pub malformed_lines: u64,

    /// Records with a missing or unparsable timestamp
    pub bad_timestamps: u64,

    /// Matched records the sink failed to write
    pub write_failures: u64,

    /// Throttle pauses taken while writing this day's records
    pub throttle_pauses: u64,

    /// Output rotations triggered by this day's records
    pub output_rotations: u64,

    /// Size of the verified archive
    pub bytes_downloaded: u64,
}

/// How a day ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// The whole archive was read
    Processed,

    /// No archive for the day
    Absent,

    /// Download failed after all attempts
    Failed,

    /// Reading the archive stopped part way
    Interrupted,
}

/// Outcome of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub key: String,
    pub status: DayStatus,
    pub stats: DayStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DayReport {
    pub fn new(date: NaiveDate, key: impl Into<String>, status: DayStatus) -> Self {
        Self {
            date,
            key: key.into(),
            status,
            stats: DayStats::default(),
            error: None,
        }
    }

    pub fn with_stats(mut self, stats: DayStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

/// Statistics collected during a recovery run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,

    pub days_visited: u64,
    pub days_processed: u64,
    pub days_absent: u64,
    pub days_failed: u64,
    pub days_interrupted: u64,

    pub lines_read: u64,
    pub records_matched: u64,
    pub malformed_lines: u64,
    pub bad_timestamps: u64,
    pub write_failures: u64,
    pub bytes_downloaded: u64,

    /// Output counters, filled in when the run completes
    pub sink: SinkStats,

    /// One entry per visited day, in order
    pub days: Vec<DayReport>,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    /// Create a new stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            completed_at: None,
            days_visited: 0,
            days_processed: 0,
            days_absent: 0,
            days_failed: 0,
            days_interrupted: 0,
            lines_read: 0,
            records_matched: 0,
            malformed_lines: 0,
            bad_timestamps: 0,
            write_failures: 0,
            bytes_downloaded: 0,
            sink: SinkStats::default(),
            days: Vec::new(),
        }
    }

    /// Fold a finished day into the totals.
    pub fn record_day(&mut self, report: DayReport) {
        self.days_visited += 1;
        match report.status {
            DayStatus::Processed => self.days_processed += 1,
            DayStatus::Absent => self.days_absent += 1,
            DayStatus::Failed => self.days_failed += 1,
            DayStatus::Interrupted => self.days_interrupted += 1,
        }

        let day = &report.stats;
        self.lines_read += day.lines_read;
        self.records_matched += day.records_matched;
        self.malformed_lines += day.malformed_lines;
        self.bad_timestamps += day.bad_timestamps;
        self.write_failures += day.write_failures;
        self.bytes_downloaded += day.bytes_downloaded;

        self.days.push(report);
    }

    /// Mark the run complete with the current time.
    pub fn complete(&mut self, sink: SinkStats) {
        self.sink = sink;
        self.completed_at = Some(Utc::now());
    }

    /// Duration of the run, up to now if it has not completed.
    pub fn duration(&self) -> Duration {
        self.completed_at.unwrap_or_else(Utc::now) - self.started_at
    }

    /// Records matched per second of run time.
    pub fn records_per_second(&self) -> f64 {
        let secs = self.duration().num_milliseconds() as f64 / 1000.0;
        if secs > 0.0 {
            self.records_matched as f64 / secs
        } else {
            0.0
        }
    }
}
