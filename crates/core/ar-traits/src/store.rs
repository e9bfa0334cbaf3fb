//! Object store trait and related types.

use ar_error::StoreError;
use async_trait::async_trait;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// A streaming object body.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// Trait for the object store holding the daily archives.
///
/// # Implementations
///
/// - S3 store: `HeadObject` / `GetObject` against an S3-compatible endpoint
/// - In-memory store: tests and local runs, with scripted faults
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Bucket this store reads from.
    fn bucket(&self) -> &str;

    /// Probe an object without reading its contents.
    ///
    /// Returns [`StoreError::NotFound`] when the key does not exist, so the
    /// caller can tell "absent" apart from other failures.
    async fn head(&self, key: &str) -> Result<ObjectMeta, StoreError>;

    /// Open a streaming read of the object body.
    async fn get(&self, key: &str) -> Result<ObjectReader, StoreError>;
}

/// Metadata reported by a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Object key
    pub key: String,

    /// Content length in bytes, when the store reports one
    pub content_length: Option<u64>,

    /// Opaque integrity token (ETag) with surrounding quotes stripped
    pub integrity_token: Option<String>,
}

impl ObjectMeta {
    /// Creates metadata with a content length and no integrity token.
    pub fn new(key: impl Into<String>, content_length: u64) -> Self {
        Self {
            key: key.into(),
            content_length: Some(content_length),
            integrity_token: None,
        }
    }

    /// Sets the integrity token, stripping any quoting.
    pub fn with_integrity_token(mut self, token: &str) -> Self {
        self.integrity_token = strip_quotes(token);
        self
    }
}

/// Strip the double quotes S3 puts around ETags.
///
/// Returns `None` for an empty token.
pub(crate) fn strip_quotes(token: &str) -> Option<String> {
    let stripped = token.trim().trim_matches('"');
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_string())
    }
}
