//! Trait definitions for archive-recovery.
//!
//! - [`ArchiveStore`] - object store seam consumed by the downloader

mod store;

pub use store::{ArchiveStore, ObjectMeta, ObjectReader};
