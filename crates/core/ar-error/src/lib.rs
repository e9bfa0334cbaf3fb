//! Error types and classification for archive-recovery.
//!
//! This crate provides:
//! - [`RecoveryError`] - Top-level error enum for the recovery pipeline
//! - Stage-specific errors ([`StoreError`], [`DownloadError`], [`SinkError`], [`RecordError`])
//! - [`ErrorCategory`] for retry decisions in the downloader
//!
//! Only [`RecoveryError::Config`] and [`SinkError::Open`] are fatal to a run.
//! Everything else is logged by the driver and the run moves on to the next
//! record or the next day.

use thiserror::Error;

/// Top-level error type for archive-recovery.
#[derive(Error, Debug)]
pub enum RecoveryError {
    /// Invalid configuration, detected before any I/O
    #[error("Configuration error: {0}")]
    Config(String),

    /// Output sink errors
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Reading or decompressing a verified archive failed
    #[error("Decompression failed: {0}")]
    Decompression(String),
}

/// Errors reported by an object store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The key does not exist in the bucket
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The request failed (network, auth, throttling, 5xx)
    #[error("Request failed: {0}")]
    Request(String),
}

/// Errors from a single download attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    /// HEAD reported the object as absent
    #[error("Object not found: {0}")]
    NotFound(String),

    /// HEAD failed for another reason
    #[error("Probe failed: {0}")]
    Probe(String),

    /// GET failed or the body stream broke
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Bytes written differ from the probed content length
    #[error("Length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    /// MD5 of the downloaded file differs from the probed integrity token
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Local temp file I/O failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl DownloadError {
    /// Classify this error for the retry loop.
    pub fn category(&self) -> ErrorCategory {
        match self {
            DownloadError::NotFound(_) => ErrorCategory::Permanent,
            DownloadError::Probe(_) => ErrorCategory::Transient,
            DownloadError::Fetch(_) => ErrorCategory::Transient,
            DownloadError::LengthMismatch { .. } => ErrorCategory::Transient,
            DownloadError::ChecksumMismatch { .. } => ErrorCategory::Transient,
            DownloadError::Io(_) => ErrorCategory::Transient,
        }
    }
}

/// Output sink errors.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The output file could not be opened
    #[error("Failed to open output '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Writing or flushing a record failed
    #[error("Write failed: {0}")]
    Write(String),

    /// Checking the size or reopening the file failed
    #[error("Rotation failed: {0}")]
    Rotate(String),

    /// A record could not be serialized
    #[error("Serialization failed: {0}")]
    Serialize(String),
}

/// Per-record errors. These never leave the day loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The line is not valid JSON
    #[error("Malformed JSON: {0}")]
    Malformed(String),

    /// The timestamp is missing, not a string, or not `YYYY-MM-DDTHH:MM:SS`
    #[error("Invalid timestamp: {0}")]
    Timestamp(String),
}

/// Error classification for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transient error - retry after backoff
    ///
    /// Examples: network timeout, truncated body, checksum mismatch
    Transient,

    /// Permanent error - never retry
    ///
    /// Examples: object not found
    Permanent,
}

/// Result type alias using RecoveryError.
pub type Result<T> = std::result::Result<T, RecoveryError>;
