//! S3 archive store tests using LocalStack.

use crate::common::{LocalStackTestContext, alert_line, gzip_lines};
use ar_error::StoreError;
use ar_store::S3ArchiveStore;
use ar_traits::ArchiveStore;
use tokio::io::AsyncReadExt;

const BUCKET: &str = "ar-store-test";

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_head_reports_length_and_etag() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    ctx.create_bucket(BUCKET).await.unwrap();
    let body = gzip_lines(&[alert_line("2024-01-01T10:00:00.000+00:00", "test@mail.com", 302)]);
    let key = "2024/Jan/ossec-archive-01.json.gz";
    ctx.upload(BUCKET, key, body.clone()).await.unwrap();

    let store = S3ArchiveStore::new(ctx.s3.clone(), BUCKET);
    let meta = store.head(key).await.unwrap();

    assert_eq!(meta.content_length, Some(body.len() as u64));
    let token = meta.integrity_token.unwrap();
    assert!(!token.starts_with('"'));
    assert_eq!(token.len(), 32);

    ctx.empty_bucket(BUCKET).await.ok();
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_get_streams_body() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    ctx.create_bucket(BUCKET).await.unwrap();
    let key = "2024/Jan/ossec-archive-02.json.gz";
    ctx.upload(BUCKET, key, b"archive bytes".to_vec()).await.unwrap();

    let store = S3ArchiveStore::new(ctx.s3.clone(), BUCKET);
    let mut reader = store.get(key).await.unwrap();
    let mut body = Vec::new();
    reader.read_to_end(&mut body).await.unwrap();

    assert_eq!(body, b"archive bytes");

    ctx.empty_bucket(BUCKET).await.ok();
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_missing_key_is_not_found() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    ctx.create_bucket(BUCKET).await.unwrap();
    let store = S3ArchiveStore::new(ctx.s3.clone(), BUCKET);

    let err = store.head("1999/Dec/ossec-archive-31.json.gz").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "{err:?}");

    let err = store.get("1999/Dec/ossec-archive-31.json.gz").await.err().unwrap();
    assert!(matches!(err, StoreError::NotFound(_)), "{err:?}");
}
