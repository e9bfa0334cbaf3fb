//! In-memory archive store with fault injection.

use ar_error::StoreError;
use ar_traits::{ArchiveStore, ObjectMeta, ObjectReader};
use async_trait::async_trait;
use bytes::Bytes;
use md5::{Digest, Md5};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;

/// A fault applied to the next matching call for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFault {
    /// `head` fails with a request error
    ProbeError,
    /// `get` fails with a request error
    FetchError,
    /// `get` returns the body minus its last byte
    TruncatedBody,
    /// `get` returns a body of the right length with its first byte flipped
    CorruptBody,
}

impl StoreFault {
    fn applies_to_head(self) -> bool {
        matches!(self, StoreFault::ProbeError)
    }
}

/// Call counters for assertions in tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStoreStats {
    pub head_calls: u64,
    pub get_calls: u64,
    pub faults_injected: u64,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    etag: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    objects: HashMap<String, StoredObject>,
    faults: HashMap<String, VecDeque<StoreFault>>,
    stats: MemoryStoreStats,
}

/// Archive store holding objects in memory.
///
/// Objects stored with [`put`](Self::put) get a quoted hex MD5 ETag, like a
/// single-part S3 upload.
#[derive(Debug)]
pub struct InMemoryArchiveStore {
    bucket: String,
    inner: Mutex<Inner>,
}

impl InMemoryArchiveStore {
    /// Create an empty store for `bucket`.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Store an object with an MD5 ETag.
    pub fn put(&self, key: impl Into<String>, data: impl Into<Bytes>) {
        let data = data.into();
        let etag = format!("\"{:x}\"", Md5::digest(&data));
        self.put_with_etag(key, data, Some(etag));
    }

    /// Store an object with an explicit ETag (or none).
    pub fn put_with_etag(
        &self,
        key: impl Into<String>,
        data: impl Into<Bytes>,
        etag: Option<String>,
    ) {
        self.inner.lock().objects.insert(
            key.into(),
            StoredObject {
                data: data.into(),
                etag,
            },
        );
    }

    /// Queue `fault` for the next `times` matching calls on `key`.
    pub fn inject(&self, key: impl Into<String>, fault: StoreFault, times: usize) {
        let mut inner = self.inner.lock();
        let queue = inner.faults.entry(key.into()).or_default();
        queue.extend(std::iter::repeat_n(fault, times));
    }

    /// Snapshot of the call counters.
    pub fn stats(&self) -> MemoryStoreStats {
        self.inner.lock().stats.clone()
    }

    /// Pop the pending fault for `key` if it applies to this call.
    fn take_fault(inner: &mut Inner, key: &str, head: bool) -> Option<StoreFault> {
        let queue = inner.faults.get_mut(key)?;
        let front = *queue.front()?;
        if front.applies_to_head() != head {
            return None;
        }
        queue.pop_front();
        inner.stats.faults_injected += 1;
        Some(front)
    }
}

#[async_trait]
impl ArchiveStore for InMemoryArchiveStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn head(&self, key: &str) -> Result<ObjectMeta, StoreError> {
        let mut inner = self.inner.lock();
        inner.stats.head_calls += 1;

        if Self::take_fault(&mut inner, key, true).is_some() {
            return Err(StoreError::Request(format!(
                "injected probe failure for {key}"
            )));
        }

        let object = inner
            .objects
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let meta = ObjectMeta::new(key, object.data.len() as u64);
        Ok(match &object.etag {
            Some(etag) => meta.with_integrity_token(etag),
            None => meta,
        })
    }

    async fn get(&self, key: &str) -> Result<ObjectReader, StoreError> {
        let mut inner = self.inner.lock();
        inner.stats.get_calls += 1;

        let fault = Self::take_fault(&mut inner, key, false);

        let data = inner
            .objects
            .get(key)
            .map(|object| object.data.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let body = match fault {
            Some(StoreFault::FetchError) => {
                return Err(StoreError::Request(format!(
                    "injected fetch failure for {key}"
                )));
            }
            Some(StoreFault::TruncatedBody) => data.slice(..data.len().saturating_sub(1)),
            Some(StoreFault::CorruptBody) => {
                let mut corrupted = data.to_vec();
                if let Some(first) = corrupted.first_mut() {
                    *first ^= 0xFF;
                }
                Bytes::from(corrupted)
            }
            Some(StoreFault::ProbeError) | None => data,
        };

        Ok(Box::pin(Cursor::new(body)))
    }
}
