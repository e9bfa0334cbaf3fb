//! LocalStack test context and utilities.

use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::{Credentials, Region};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;

/// LocalStack test context providing an S3 client.
pub struct LocalStackTestContext {
    pub s3: S3Client,
    pub endpoint: String,
    pub region: String,
}

impl LocalStackTestContext {
    /// Create a new LocalStack test context.
    ///
    /// Uses the `LOCALSTACK_ENDPOINT` environment variable if set,
    /// otherwise defaults to `http://localhost:4566`.
    pub async fn new() -> Self {
        let endpoint = std::env::var("LOCALSTACK_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:4566".to_string());
        let region = "us-east-1".to_string();

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .endpoint_url(&endpoint)
            .credentials_provider(Credentials::new("test", "test", None, None, "localstack"))
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(true)
            .build();

        Self {
            s3: S3Client::from_conf(s3_config),
            endpoint,
            region,
        }
    }

    /// Check if LocalStack is available and healthy.
    pub async fn is_available(&self) -> bool {
        self.s3.list_buckets().send().await.is_ok()
    }

    /// Create an S3 bucket for testing.
    pub async fn create_bucket(&self, name: &str) -> Result<(), aws_sdk_s3::Error> {
        let buckets = self.s3.list_buckets().send().await?;
        let exists = buckets
            .buckets()
            .iter()
            .any(|b| b.name().unwrap_or_default() == name);

        if !exists {
            self.s3.create_bucket().bucket(name).send().await?;
        }
        Ok(())
    }

    /// Upload an archive object.
    pub async fn upload(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<(), aws_sdk_s3::Error> {
        self.s3
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(data.into())
            .content_type("application/gzip")
            .send()
            .await?;
        Ok(())
    }

    /// Delete every object in a bucket.
    pub async fn empty_bucket(&self, bucket: &str) -> Result<(), aws_sdk_s3::Error> {
        let listed = self.s3.list_objects_v2().bucket(bucket).send().await?;
        for object in listed.contents() {
            if let Some(key) = object.key() {
                self.s3.delete_object().bucket(bucket).key(key).send().await?;
            }
        }
        Ok(())
    }
}

/// One archive alert as a JSON line.
pub fn alert_line(timestamp: &str, resource: &str, event_id: i64) -> String {
    serde_json::json!({
        "timestamp": timestamp,
        "agent": {"id": "001", "name": "win-dc01"},
        "data": {
            "win": {
                "eventInfo": {"resource": resource},
                "system": {"eventID": event_id}
            }
        }
    })
    .to_string()
}

/// Gzip newline-terminated lines.
pub fn gzip_lines(lines: &[String]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    for line in lines {
        encoder
            .write_all(line.as_bytes())
            .expect("Failed to write gzip line");
        encoder.write_all(b"\n").expect("Failed to write gzip line");
    }
    encoder.finish().expect("Failed to finish gzip stream")
}
