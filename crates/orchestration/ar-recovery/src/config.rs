//! Configuration types for a recovery run.

use crate::filter::MatchRules;
use crate::retry::RetryPolicy;
use ar_error::{RecoveryError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Format of the timestamp bounds and of the 19-char record prefix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Default events-per-second cap.
pub const DEFAULT_EVENTS_PER_SECOND: u32 = 400;

/// Default output ceiling (1 GB).
pub const DEFAULT_MAX_OUTPUT_BYTES: u64 = 1024 * 1024 * 1024;

/// Default pause taken every `events_per_second` writes.
pub const DEFAULT_THROTTLE_PAUSE: Duration = Duration::from_secs(2);

const BYTES_PER_GIGABYTE: f64 = 1024.0 * 1024.0 * 1024.0;

/// Configuration for a recovery run.
///
/// Storage location (bucket, endpoint, profile) lives in the store adapter's
/// own configuration; this struct covers what the pipeline needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Writes between throttle pauses
    pub events_per_second: u32,

    /// Inclusive lower bound of the record window
    pub min_timestamp: NaiveDateTime,

    /// Inclusive upper bound of the record window
    pub max_timestamp: NaiveDateTime,

    /// Output file path
    pub output_path: PathBuf,

    /// Output size that triggers a rotation
    pub max_output_bytes: u64,

    /// Field-match predicates
    pub match_rules: MatchRules,

    /// Download retry policy
    #[serde(skip)]
    pub retry: RetryPolicy,

    /// Pause taken every `events_per_second` writes
    #[serde(skip, default = "default_throttle_pause")]
    pub throttle_pause: Duration,

    /// Cooldown after a rotation. `None` means `events_per_second / 100` seconds.
    #[serde(skip)]
    pub rotation_cooldown: Option<Duration>,

    /// Directory for downloaded archives. `None` means the system temp dir.
    pub temp_dir: Option<PathBuf>,
}

fn default_throttle_pause() -> Duration {
    DEFAULT_THROTTLE_PAUSE
}

impl RecoveryConfig {
    /// Create a configuration for the given window and output path.
    pub fn new(
        min_timestamp: NaiveDateTime,
        max_timestamp: NaiveDateTime,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            events_per_second: DEFAULT_EVENTS_PER_SECOND,
            min_timestamp,
            max_timestamp,
            output_path: output_path.into(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            match_rules: MatchRules::default(),
            retry: RetryPolicy::default(),
            throttle_pause: DEFAULT_THROTTLE_PAUSE,
            rotation_cooldown: None,
            temp_dir: None,
        }
    }

    /// Set the events-per-second cap.
    pub fn with_events_per_second(mut self, eps: u32) -> Self {
        self.events_per_second = eps;
        self
    }

    /// Set the output ceiling in bytes.
    pub fn with_max_output_bytes(mut self, bytes: u64) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    /// Set the field-match predicates.
    pub fn with_match_rules(mut self, rules: MatchRules) -> Self {
        self.match_rules = rules;
        self
    }

    /// Set the download retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the throttle pause.
    pub fn with_throttle_pause(mut self, pause: Duration) -> Self {
        self.throttle_pause = pause;
        self
    }

    /// Override the rotation cooldown.
    pub fn with_rotation_cooldown(mut self, cooldown: Duration) -> Self {
        self.rotation_cooldown = Some(cooldown);
        self
    }

    /// Set the directory downloaded archives are staged in.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Cooldown applied after a rotation.
    pub fn rotation_cooldown(&self) -> Duration {
        self.rotation_cooldown
            .unwrap_or_else(|| Duration::from_secs_f64(f64::from(self.events_per_second) / 100.0))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.events_per_second == 0 {
            return Err(RecoveryError::Config("EPS must be > 0".to_string()));
        }
        if self.max_output_bytes == 0 {
            return Err(RecoveryError::Config("max_size must be > 0".to_string()));
        }
        if self.min_timestamp > self.max_timestamp {
            return Err(RecoveryError::Config(format!(
                "min_timestamp {} is after max_timestamp {}",
                self.min_timestamp.format(TIMESTAMP_FORMAT),
                self.max_timestamp.format(TIMESTAMP_FORMAT)
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(RecoveryError::Config(
                "retry max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a `YYYY-MM-DDTHH:MM:SS` bound.
///
/// `name` is used in the error message (`min_timestamp`, `max_timestamp`).
pub fn parse_timestamp(name: &str, value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|_| RecoveryError::Config(format!("Incorrect format for {name}")))
}

/// Convert a size in gigabytes to bytes, truncating.
///
/// Fails unless the result is at least one byte.
pub fn gigabytes_to_bytes(gigabytes: f64) -> Result<u64> {
    let bytes = (gigabytes * BYTES_PER_GIGABYTE).floor();
    if !bytes.is_finite() || bytes < 1.0 {
        return Err(RecoveryError::Config("max_size must be > 0".to_string()));
    }
    Ok(bytes as u64)
}
