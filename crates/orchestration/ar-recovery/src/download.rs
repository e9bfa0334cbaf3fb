//! Verified archive downloads.
//!
//! Each attempt probes the object, streams it into a fresh temp file, then
//! checks the byte count against the probed length and the file's MD5
//! against the ETag. Failed attempts discard the temp file and back off.

use crate::key::ObjectKey;
use crate::retry::RetryPolicy;
use ar_error::{DownloadError, ErrorCategory, StoreError};
use ar_traits::ArchiveStore;
use md5::{Digest, Md5};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Copy and hash buffer size.
pub const DOWNLOAD_CHUNK_SIZE: usize = 1024 * 1024;

const MD5_HEX_LEN: usize = 32;

/// A downloaded archive that passed length and checksum verification.
///
/// Owns its temp file; the file is deleted when the archive is dropped or
/// [`discard`](Self::discard)ed.
#[derive(Debug)]
pub struct VerifiedArchive {
    key: ObjectKey,
    file: NamedTempFile,
    bytes: u64,
    md5: String,
}

impl VerifiedArchive {
    pub fn key(&self) -> &ObjectKey {
        &self.key
    }

    /// Location of the temp file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes
    }

    /// Hex MD5 of the contents.
    pub fn md5(&self) -> &str {
        &self.md5
    }

    /// Open the archive for reading.
    pub async fn open(&self) -> std::io::Result<tokio::fs::File> {
        tokio::fs::File::open(self.file.path()).await
    }

    /// Delete the temp file, logging a warning if removal fails.
    pub fn discard(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!(key = %self.key, path = %path.display(), error = %e, "Failed to remove temp file");
        }
    }
}

/// Result of fetching one day's archive.
#[derive(Debug)]
pub enum DownloadOutcome {
    Verified(VerifiedArchive),

    /// No object at the key
    Absent,

    /// Every attempt failed
    Failed {
        attempts: u32,
        error: DownloadError,
    },
}

/// Downloads archives from an [`ArchiveStore`] with verification and retries.
pub struct VerifiedDownloader<S: ArchiveStore + ?Sized> {
    store: Arc<S>,
    retry: RetryPolicy,
    temp_dir: Option<PathBuf>,
    chunk_size: usize,
}

impl<S: ArchiveStore + ?Sized> VerifiedDownloader<S> {
    pub fn new(store: Arc<S>, retry: RetryPolicy) -> Self {
        Self {
            store,
            retry,
            temp_dir: None,
            chunk_size: DOWNLOAD_CHUNK_SIZE,
        }
    }

    /// Stage downloads in `dir` instead of the system temp directory.
    pub fn with_temp_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.temp_dir = dir;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch and verify the archive at `key`.
    pub async fn fetch(&self, key: &ObjectKey) -> DownloadOutcome {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match self.attempt(key).await {
                Ok(archive) => {
                    debug!(
                        key = %key,
                        attempt = attempt,
                        bytes = archive.size(),
                        md5 = archive.md5(),
                        "Archive verified"
                    );
                    return DownloadOutcome::Verified(archive);
                }
                Err(DownloadError::NotFound(_)) => {
                    info!(key = %key, "Object absent");
                    return DownloadOutcome::Absent;
                }
                Err(e) => e,
            };

            if error.category() == ErrorCategory::Permanent || !self.retry.has_next(attempt) {
                warn!(
                    key = %key,
                    attempts = attempt,
                    error = %error,
                    "Download failed"
                );
                return DownloadOutcome::Failed {
                    attempts: attempt,
                    error,
                };
            }

            warn!(
                key = %key,
                attempt = attempt,
                max_attempts = self.retry.max_attempts,
                error = %error,
                backoff_ms = self.retry.backoff.as_millis(),
                "Download attempt failed, retrying"
            );
            tokio::time::sleep(self.retry.backoff).await;
        }
    }

    async fn attempt(&self, key: &ObjectKey) -> Result<VerifiedArchive, DownloadError> {
        let meta = self.store.head(key.as_str()).await.map_err(|e| match e {
            StoreError::NotFound(k) => DownloadError::NotFound(k),
            other => DownloadError::Probe(other.to_string()),
        })?;

        // The object was just probed, so a missing body here is a fetch failure
        let mut body = self
            .store
            .get(key.as_str())
            .await
            .map_err(|e| DownloadError::Fetch(e.to_string()))?;

        let temp = self.create_temp_file()?;
        let mut out = tokio::fs::File::from_std(temp.reopen().map_err(io_error)?);

        let mut buf = vec![0u8; self.chunk_size];
        let mut written = 0u64;
        loop {
            let n = body
                .read(&mut buf)
                .await
                .map_err(|e| DownloadError::Fetch(e.to_string()))?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n]).await.map_err(io_error)?;
            written += n as u64;
        }
        out.flush().await.map_err(io_error)?;
        drop(out);

        if let Some(expected) = meta.content_length
            && expected != written
        {
            return Err(DownloadError::LengthMismatch {
                expected,
                actual: written,
            });
        }

        let md5 = md5_file(temp.path(), self.chunk_size).await?;
        if let Some(expected) = meta.integrity_token.as_deref().filter(|t| is_md5_hex(t))
            && !expected.eq_ignore_ascii_case(&md5)
        {
            return Err(DownloadError::ChecksumMismatch {
                expected: expected.to_string(),
                actual: md5,
            });
        }

        Ok(VerifiedArchive {
            key: key.clone(),
            file: temp,
            bytes: written,
            md5,
        })
    }

    fn create_temp_file(&self) -> Result<NamedTempFile, DownloadError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ossec-archive-").suffix(".json.gz");
        let temp = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        temp.map_err(io_error)
    }
}

/// True for a plain 32-digit hex MD5. Multipart ETags (`<hex>-<parts>`) are not.
pub fn is_md5_hex(token: &str) -> bool {
    token.len() == MD5_HEX_LEN && token.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Hex MD5 of a file, read in chunks.
pub async fn md5_file(path: &Path, chunk_size: usize) -> Result<String, DownloadError> {
    let mut file = tokio::fs::File::open(path).await.map_err(io_error)?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let n = file.read(&mut buf).await.map_err(io_error)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn io_error(e: std::io::Error) -> DownloadError {
    DownloadError::Io(e.to_string())
}
