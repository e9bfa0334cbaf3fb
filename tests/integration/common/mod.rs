//! Common utilities for integration tests.
//!
//! Shared LocalStack client setup and archive fixtures.

pub mod localstack;

pub use localstack::{LocalStackTestContext, alert_line, gzip_lines};
