//! End-to-end recovery tests using LocalStack.

use crate::common::{LocalStackTestContext, alert_line, gzip_lines};
use ar_recovery::{DayStatus, RecoveryConfig, RecoveryDriver, RetryPolicy, parse_timestamp};
use ar_store::S3ArchiveStore;
use std::sync::Arc;
use std::time::Duration;

const BUCKET: &str = "ar-recovery-test";

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_recover_day_range_from_s3() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    ctx.create_bucket(BUCKET).await.unwrap();
    ctx.empty_bucket(BUCKET).await.unwrap();

    ctx.upload(
        BUCKET,
        "2024/Feb/ossec-archive-28.json.gz",
        gzip_lines(&[
            alert_line("2024-02-28T09:00:00.1+00:00", "test@mail.com", 302),
            alert_line("2024-02-28T09:00:01.000+00:00", "test@mail.com", 500),
            "{broken".to_string(),
        ]),
    )
    .await
    .unwrap();
    // 2024-02-29 is absent
    ctx.upload(
        BUCKET,
        "2024/Mar/ossec-archive-01.json.gz",
        gzip_lines(&[
            alert_line("2024-03-01T00:30:00.000+00:00", "test@mail.com", 303),
            alert_line("2024-03-01T00:31:00.000+00:00", "other@mail.com", 303),
        ]),
    )
    .await
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("recovered.json");
    let config = RecoveryConfig::new(
        parse_timestamp("min_timestamp", "2024-02-28T00:00:00").unwrap(),
        parse_timestamp("max_timestamp", "2024-03-01T23:59:59").unwrap(),
        &output,
    )
    .with_retry(RetryPolicy::new().with_backoff(Duration::ZERO))
    .with_rotation_cooldown(Duration::ZERO);

    let store = Arc::new(S3ArchiveStore::new(ctx.s3.clone(), BUCKET));
    let stats = RecoveryDriver::new(config, store).unwrap().run().await.unwrap();

    let statuses: Vec<_> = stats.days.iter().map(|d| d.status).collect();
    assert_eq!(
        statuses,
        vec![DayStatus::Processed, DayStatus::Absent, DayStatus::Processed]
    );
    assert_eq!(stats.records_matched, 2);
    assert_eq!(stats.malformed_lines, 1);

    let lines: Vec<serde_json::Value> = std::fs::read_to_string(&output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["timestamp"], "2024-02-28T09:00:00.001+00:00");
    assert_eq!(lines[1]["timestamp"], "2024-03-01T00:30:00.000+00:00");

    ctx.empty_bucket(BUCKET).await.ok();
}
