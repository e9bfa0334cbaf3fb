//! Shared utilities for archive-recovery CLI binaries.

pub mod args;
pub mod format;
pub mod logging;

pub use args::LogLevel;
pub use format::{format_bytes, format_duration, format_number};
pub use logging::{LOG_TAG, TaggedFormat, init_logging};
