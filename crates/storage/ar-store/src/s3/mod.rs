//! S3 client and archive store.
//!
//! This module provides:
//! - Client configuration with profile and custom endpoint support
//! - [`ArchiveStore`](ar_traits::ArchiveStore) over `HeadObject` / `GetObject`

mod client;
mod store;

pub use client::{S3Config, create_s3_client};
pub use store::S3ArchiveStore;
