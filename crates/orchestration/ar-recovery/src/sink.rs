//! Rate-limited, size-bounded NDJSON output.

use crate::config::RecoveryConfig;
use ar_error::SinkError;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Pause after every `events_per_pause` writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
    /// Writes between pauses. Zero disables throttling.
    pub events_per_pause: u64,
    pub pause: Duration,
}

impl ThrottlePolicy {
    pub fn new(events_per_pause: u64, pause: Duration) -> Self {
        Self {
            events_per_pause,
            pause,
        }
    }

    /// No pauses.
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn from_config(config: &RecoveryConfig) -> Self {
        Self::new(u64::from(config.events_per_second), config.throttle_pause)
    }
}

/// What happens to the output when it reaches the ceiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationMode {
    /// Reopen the same path truncated. Prior content is lost.
    #[default]
    Truncate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size at or above which the output rotates
    pub max_bytes: u64,

    /// Sleep after a rotation
    pub cooldown: Duration,

    pub mode: RotationMode,
}

impl RotationPolicy {
    pub fn new(max_bytes: u64, cooldown: Duration) -> Self {
        Self {
            max_bytes,
            cooldown,
            mode: RotationMode::Truncate,
        }
    }

    pub fn from_config(config: &RecoveryConfig) -> Self {
        Self::new(config.max_output_bytes, config.rotation_cooldown())
    }
}

/// Counters for a sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SinkStats {
    pub records_written: u64,
    pub bytes_written: u64,
    pub throttle_pauses: u64,
    pub rotations: u64,
}

/// What a successful write triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReceipt {
    pub paused: bool,
    pub rotated: bool,
}

/// Newline-delimited JSON writer with count-based throttling and truncating
/// rotation.
#[derive(Debug)]
pub struct RotatingSink {
    path: PathBuf,
    file: Option<File>,
    throttle: ThrottlePolicy,
    rotation: RotationPolicy,
    since_pause: u64,
    stats: SinkStats,
}

impl RotatingSink {
    /// Create or truncate the output at `path`.
    pub async fn open(
        path: impl Into<PathBuf>,
        throttle: ThrottlePolicy,
        rotation: RotationPolicy,
    ) -> Result<Self, SinkError> {
        let path = path.into();
        let file = open_truncated(&path).await.map_err(|e| SinkError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        debug!(path = %path.display(), max_bytes = rotation.max_bytes, "Output opened");

        Ok(Self {
            path,
            file: Some(file),
            throttle,
            rotation,
            since_pause: 0,
            stats: SinkStats::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stats(&self) -> SinkStats {
        self.stats
    }

    /// Write one record as a compact JSON line.
    ///
    /// Every attempted record counts toward the throttle, whether or not the
    /// write succeeds. Rotation runs only after a successful write, and its
    /// failures are logged without failing the write.
    pub async fn write_record(&mut self, record: &Value) -> Result<WriteReceipt, SinkError> {
        self.since_pause += 1;
        let written = self.append(record).await;
        let paused = self.throttle_if_due().await;

        let bytes = written?;
        self.stats.records_written += 1;
        self.stats.bytes_written += bytes;

        let rotated = match self.rotate_if_full().await {
            Ok(rotated) => rotated,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Output rotation failed");
                false
            }
        };

        Ok(WriteReceipt { paused, rotated })
    }

    async fn append(&mut self, record: &Value) -> Result<u64, SinkError> {
        let mut line =
            serde_json::to_vec(record).map_err(|e| SinkError::Serialize(e.to_string()))?;
        line.push(b'\n');

        // A failed rotation leaves no handle; reopen on the next write
        let mut file = match self.file.take() {
            Some(file) => file,
            None => open_truncated(&self.path)
                .await
                .map_err(|e| SinkError::Write(format!("reopen failed: {e}")))?,
        };
        let written = write_line(&mut file, &line).await;
        self.file = Some(file);
        written.map_err(|e| SinkError::Write(e.to_string()))?;

        Ok(line.len() as u64)
    }

    async fn throttle_if_due(&mut self) -> bool {
        if self.throttle.events_per_pause == 0 || self.since_pause < self.throttle.events_per_pause
        {
            return false;
        }
        debug!(
            events = self.since_pause,
            pause_ms = self.throttle.pause.as_millis(),
            "Throttling output"
        );
        tokio::time::sleep(self.throttle.pause).await;
        self.since_pause = 0;
        self.stats.throttle_pauses += 1;
        true
    }

    async fn rotate_if_full(&mut self) -> Result<bool, SinkError> {
        let Some(file) = self.file.as_ref() else {
            return Ok(false);
        };
        let size = file
            .metadata()
            .await
            .map_err(|e| SinkError::Rotate(format!("size check failed: {e}")))?
            .len();
        if size < self.rotation.max_bytes {
            return Ok(false);
        }

        info!(
            path = %self.path.display(),
            size = size,
            "Output file reached max size, setting it to zero and restarting"
        );

        match self.rotation.mode {
            RotationMode::Truncate => {
                drop(self.file.take());
                let file = open_truncated(&self.path)
                    .await
                    .map_err(|e| SinkError::Rotate(format!("reopen failed: {e}")))?;
                self.file = Some(file);
            }
        }
        self.stats.rotations += 1;

        tokio::time::sleep(self.rotation.cooldown).await;
        Ok(true)
    }

    /// Flush and release the output. Failures are logged.
    pub async fn close(&mut self) {
        if let Some(mut file) = self.file.take()
            && let Err(e) = file.shutdown().await
        {
            warn!(path = %self.path.display(), error = %e, "Failed to close output");
        }
    }
}

async fn write_line(file: &mut File, line: &[u8]) -> std::io::Result<()> {
    file.write_all(line).await?;
    file.flush().await
}

async fn open_truncated(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
}
