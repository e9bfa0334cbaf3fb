//! Object store adapters for archive-recovery.
//!
//! - [`S3ArchiveStore`] reads daily archives from an S3-compatible bucket
//!   (AWS, Wasabi, MinIO, LocalStack) through `aws-sdk-s3`.
//! - [`InMemoryArchiveStore`] keeps objects in memory and can inject faults,
//!   used by tests and dry runs.

pub mod memory;
pub mod s3;

pub use memory::{InMemoryArchiveStore, StoreFault};
pub use s3::{S3ArchiveStore, S3Config, create_s3_client};
