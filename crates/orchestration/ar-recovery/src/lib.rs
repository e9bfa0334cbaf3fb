//! ar-recovery - Day-range archive recovery pipeline.
//!
//! For every calendar day between two timestamps this crate:
//!
//! - derives the archive key (`{YYYY}/{Mon}/ossec-archive-{DD}.json.gz`)
//! - downloads it to a temp file and verifies length and MD5, with retries
//! - streams the gzip body line by line through a [`RecordFilter`]
//! - writes matches to a throttled, size-bounded [`RotatingSink`]
//!
//! Everything runs sequentially; record order in the output follows day
//! order and line order within each archive.
//!
//! # Example
//!
//! ```ignore
//! use ar_recovery::{RecoveryConfig, RecoveryDriver};
//! use ar_store::InMemoryArchiveStore;
//! use std::sync::Arc;
//!
//! let config = RecoveryConfig::new(min, max, "/tmp/recovery.json")
//!     .with_events_per_second(10_000);
//! let store = Arc::new(InMemoryArchiveStore::new("my-bucket"));
//!
//! let driver = RecoveryDriver::new(config, store)?;
//! let stats = driver.run().await?;
//! eprintln!("Matched {} records over {} days", stats.records_matched, stats.days_visited);
//! ```

pub mod config;
pub mod download;
pub mod driver;
pub mod filter;
pub mod key;
pub mod range;
pub mod retry;
pub mod sink;
pub mod stats;

pub use config::{RecoveryConfig, gigabytes_to_bytes, parse_timestamp};
pub use download::{DownloadOutcome, VerifiedArchive, VerifiedDownloader};
pub use driver::RecoveryDriver;
pub use filter::{MatchRules, RecordFilter, Rejection, TimeWindow, Verdict};
pub use key::ObjectKey;
pub use range::DayRange;
pub use retry::RetryPolicy;
pub use sink::{RotatingSink, RotationMode, RotationPolicy, SinkStats, ThrottlePolicy};
pub use stats::{DayReport, DayStats, DayStatus, RunStats};
