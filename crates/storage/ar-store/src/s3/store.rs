//! [`ArchiveStore`] over the AWS SDK.

use ar_error::StoreError;
use ar_traits::{ArchiveStore, ObjectMeta, ObjectReader};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use tracing::debug;

/// Archive store backed by an S3 bucket.
#[derive(Debug, Clone)]
pub struct S3ArchiveStore {
    client: Client,
    bucket: String,
}

impl S3ArchiveStore {
    /// Create a store for `bucket` using an existing client.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

/// `true` when the SDK error carries a raw 404 response.
///
/// `HeadObject` has no body, so some S3-compatible stores only signal a
/// missing key through the status code.
fn is_http_not_found<E>(error: &SdkError<E, HttpResponse>) -> bool {
    error
        .raw_response()
        .map(|response| response.status().as_u16() == 404)
        .unwrap_or(false)
}

#[async_trait]
impl ArchiveStore for S3ArchiveStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn head(&self, key: &str) -> Result<ObjectMeta, StoreError> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let mut meta = ObjectMeta {
                    key: key.to_string(),
                    content_length: output
                        .content_length()
                        .and_then(|len| u64::try_from(len).ok()),
                    integrity_token: None,
                };
                if let Some(etag) = output.e_tag() {
                    meta = meta.with_integrity_token(etag);
                }
                debug!(
                    key = key,
                    size = ?meta.content_length,
                    etag = ?meta.integrity_token,
                    "Probed object"
                );
                Ok(meta)
            }
            Err(e) => {
                let not_found = e
                    .as_service_error()
                    .map(|service| service.is_not_found())
                    .unwrap_or(false)
                    || is_http_not_found(&e);
                if not_found {
                    Err(StoreError::NotFound(key.to_string()))
                } else {
                    Err(StoreError::Request(format!(
                        "HeadObject s3://{}/{} failed: {}",
                        self.bucket,
                        key,
                        DisplayErrorContext(&e)
                    )))
                }
            }
        }
    }

    async fn get(&self, key: &str) -> Result<ObjectReader, StoreError> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => Ok(Box::pin(output.body.into_async_read())),
            Err(e) => {
                let not_found = e
                    .as_service_error()
                    .map(|service| service.is_no_such_key())
                    .unwrap_or(false)
                    || is_http_not_found(&e);
                if not_found {
                    Err(StoreError::NotFound(key.to_string()))
                } else {
                    Err(StoreError::Request(format!(
                        "GetObject s3://{}/{} failed: {}",
                        self.bucket,
                        key,
                        DisplayErrorContext(&e)
                    )))
                }
            }
        }
    }
}
