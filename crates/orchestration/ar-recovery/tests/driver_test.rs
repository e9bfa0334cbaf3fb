//! End-to-end driver tests against the in-memory store.

use ar_error::RecoveryError;
use ar_recovery::{
    DayStatus, MatchRules, RecoveryConfig, RecoveryDriver, RetryPolicy, parse_timestamp,
};
use ar_store::{InMemoryArchiveStore, StoreFault};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::{Value, json};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const BUCKET: &str = "wazuh-archives";

fn gzip(lines: &[String]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    for line in lines {
        encoder.write_all(line.as_bytes()).unwrap();
        encoder.write_all(b"\n").unwrap();
    }
    encoder.finish().unwrap()
}

fn alert(timestamp: &str, resource: &str, event_id: i64) -> String {
    json!({
        "timestamp": timestamp,
        "rule": {"level": 3},
        "data": {
            "win": {
                "eventInfo": {"resource": resource},
                "system": {"eventID": event_id}
            }
        }
    })
    .to_string()
}

fn config(min: &str, max: &str, output: &Path) -> RecoveryConfig {
    RecoveryConfig::new(
        parse_timestamp("min_timestamp", min).unwrap(),
        parse_timestamp("max_timestamp", max).unwrap(),
        output,
    )
    .with_events_per_second(10_000)
    .with_retry(RetryPolicy::new().with_backoff(Duration::ZERO))
    .with_rotation_cooldown(Duration::ZERO)
}

fn output(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_visits_each_day_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("recovered.json");
    let store = Arc::new(InMemoryArchiveStore::new(BUCKET));

    store.put(
        "2024/Jan/ossec-archive-31.json.gz",
        gzip(&[alert("2024-01-31T23:00:00.100+00:00", "test@mail.com", 302)]),
    );
    store.put(
        "2024/Feb/ossec-archive-01.json.gz",
        gzip(&[alert("2024-02-01T01:00:00.200+00:00", "test@mail.com", 303)]),
    );

    let driver = RecoveryDriver::new(
        config("2024-01-30T12:00:00", "2024-02-02T00:00:00", &out),
        store.clone(),
    )
    .unwrap();
    let stats = driver.run().await.unwrap();

    let keys: Vec<_> = stats.days.iter().map(|d| d.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "2024/Jan/ossec-archive-30.json.gz",
            "2024/Jan/ossec-archive-31.json.gz",
            "2024/Feb/ossec-archive-01.json.gz",
            "2024/Feb/ossec-archive-02.json.gz",
        ]
    );
    assert_eq!(stats.days_visited, 4);
    assert_eq!(stats.days_processed, 2);
    assert_eq!(stats.days_absent, 2);
    assert_eq!(store.stats().head_calls, 4);

    let records = output(&out);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["timestamp"], "2024-01-31T23:00:00.100+00:00");
    assert_eq!(records[1]["timestamp"], "2024-02-01T01:00:00.200+00:00");
}

#[tokio::test]
async fn test_only_matching_records_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("recovered.json");
    let store = Arc::new(InMemoryArchiveStore::new(BUCKET));

    store.put(
        "2024/Jan/ossec-archive-01.json.gz",
        gzip(&[
            alert("2024-01-01T10:00:00.1+00:00", "test@mail.com", 302),
            alert("2024-01-01T10:00:01.000+00:00", "test@mail.com", 500),
            alert("2024-01-01T10:00:02.000+00:00", "other@mail.com", 302),
            alert("2024-01-01T23:30:00.000+00:00", "test@mail.com", 303),
            json!({"timestamp": "2024-01-01T10:00:03.000+00:00"}).to_string(),
        ]),
    );

    let driver = RecoveryDriver::new(
        config("2024-01-01T00:00:00", "2024-01-01T23:00:00", &out),
        store,
    )
    .unwrap();
    let stats = driver.run().await.unwrap();

    let records = output(&out);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["timestamp"], "2024-01-01T10:00:00.001+00:00");
    assert_eq!(records[0]["data"]["win"]["system"]["eventID"], 302);

    assert_eq!(stats.lines_read, 5);
    assert_eq!(stats.records_matched, 1);
    assert_eq!(stats.sink.records_written, 1);
}

#[tokio::test]
async fn test_any_event_id() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("recovered.json");
    let store = Arc::new(InMemoryArchiveStore::new(BUCKET));

    store.put(
        "2024/Jan/ossec-archive-01.json.gz",
        gzip(&[
            alert("2024-01-01T10:00:00.000+00:00", "test@mail.com", 302),
            alert("2024-01-01T10:00:01.000+00:00", "test@mail.com", 500),
        ]),
    );

    let config = config("2024-01-01T00:00:00", "2024-01-01T23:59:59", &out)
        .with_match_rules(MatchRules::default().with_any_event_id());
    let stats = RecoveryDriver::new(config, store).unwrap().run().await.unwrap();

    assert_eq!(stats.records_matched, 2);
    assert_eq!(output(&out).len(), 2);
}

#[tokio::test]
async fn test_malformed_line_does_not_stop_the_day() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("recovered.json");
    let store = Arc::new(InMemoryArchiveStore::new(BUCKET));

    store.put(
        "2024/Jan/ossec-archive-01.json.gz",
        gzip(&[
            "{\"timestamp\": ".to_string(),
            alert("2024-01-01T10:00:00.000+00:00", "test@mail.com", 302),
            json!({"timestamp": "not a time"}).to_string(),
            String::new(),
            alert("2024-01-01T11:00:00.000+00:00", "test@mail.com", 303),
        ]),
    );

    let driver = RecoveryDriver::new(
        config("2024-01-01T00:00:00", "2024-01-01T23:59:59", &out),
        store,
    )
    .unwrap();
    let stats = driver.run().await.unwrap();

    assert_eq!(stats.days_processed, 1);
    assert_eq!(stats.malformed_lines, 1);
    assert_eq!(stats.bad_timestamps, 1);
    assert_eq!(stats.records_matched, 2);
    assert_eq!(output(&out).len(), 2);
}

#[tokio::test]
async fn test_temp_files_are_removed() {
    let dir = tempfile::tempdir().unwrap();
    let staging = tempfile::tempdir().unwrap();
    let out = dir.path().join("recovered.json");
    let store = Arc::new(InMemoryArchiveStore::new(BUCKET));

    store.put(
        "2024/Jan/ossec-archive-01.json.gz",
        gzip(&[alert("2024-01-01T10:00:00.000+00:00", "test@mail.com", 302)]),
    );
    // Not gzip: the day is interrupted but its temp file must still go
    store.put("2024/Jan/ossec-archive-02.json.gz", b"plain text".to_vec());

    let config = config("2024-01-01T00:00:00", "2024-01-02T23:59:59", &out)
        .with_temp_dir(staging.path());
    let stats = RecoveryDriver::new(config, store).unwrap().run().await.unwrap();

    assert_eq!(stats.days_processed, 1);
    assert_eq!(stats.days_interrupted, 1);
    assert!(stats.days[1].error.is_some());
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_failed_download_skips_the_day() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("recovered.json");
    let store = Arc::new(InMemoryArchiveStore::new(BUCKET));

    store.put(
        "2024/Jan/ossec-archive-01.json.gz",
        gzip(&[alert("2024-01-01T10:00:00.000+00:00", "test@mail.com", 302)]),
    );
    store.put(
        "2024/Jan/ossec-archive-02.json.gz",
        gzip(&[alert("2024-01-02T10:00:00.000+00:00", "test@mail.com", 302)]),
    );
    store.inject("2024/Jan/ossec-archive-01.json.gz", StoreFault::TruncatedBody, 3);

    let driver = RecoveryDriver::new(
        config("2024-01-01T00:00:00", "2024-01-02T23:59:59", &out),
        store.clone(),
    )
    .unwrap();
    let stats = driver.run().await.unwrap();

    assert_eq!(stats.days[0].status, DayStatus::Failed);
    assert_eq!(stats.days[1].status, DayStatus::Processed);
    assert_eq!(store.stats().get_calls, 4);

    let records = output(&out);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["timestamp"], "2024-01-02T10:00:00.000+00:00");
}

#[tokio::test]
async fn test_multi_member_archive() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("recovered.json");
    let store = Arc::new(InMemoryArchiveStore::new(BUCKET));

    let mut body = gzip(&[alert("2024-01-01T10:00:00.000+00:00", "test@mail.com", 302)]);
    body.extend(gzip(&[alert("2024-01-01T11:00:00.000+00:00", "test@mail.com", 303)]));
    store.put("2024/Jan/ossec-archive-01.json.gz", body);

    let driver = RecoveryDriver::new(
        config("2024-01-01T00:00:00", "2024-01-01T23:59:59", &out),
        store,
    )
    .unwrap();
    let stats = driver.run().await.unwrap();

    assert_eq!(stats.records_matched, 2);
    assert_eq!(output(&out).len(), 2);
}

#[tokio::test]
async fn test_rotation_drops_earlier_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("recovered.json");
    let store = Arc::new(InMemoryArchiveStore::new(BUCKET));

    let first = alert("2024-01-01T10:00:00.000+00:00", "test@mail.com", 302);
    let second = alert("2024-01-01T11:00:00.000+00:00", "test@mail.com", 302);
    let third = alert("2024-01-01T12:00:00.000+00:00", "test@mail.com", 302);
    let line_len = first.len() as u64 + 1;

    store.put(
        "2024/Jan/ossec-archive-01.json.gz",
        gzip(&[first, second, third]),
    );

    // Rotate once two records are on disk
    let config = config("2024-01-01T00:00:00", "2024-01-01T23:59:59", &out)
        .with_max_output_bytes(line_len * 2);
    let stats = RecoveryDriver::new(config, store).unwrap().run().await.unwrap();

    assert_eq!(stats.sink.rotations, 1);
    assert_eq!(stats.records_matched, 3);
    assert_eq!(stats.days[0].stats.output_rotations, 1);

    let records = output(&out);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["timestamp"], "2024-01-01T12:00:00.000+00:00");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_write_failures_do_not_end_the_day() {
    let store = Arc::new(InMemoryArchiveStore::new(BUCKET));
    store.put(
        "2024/Jan/ossec-archive-01.json.gz",
        gzip(&[
            alert("2024-01-01T10:00:00.000+00:00", "test@mail.com", 302),
            alert("2024-01-01T11:00:00.000+00:00", "test@mail.com", 303),
            alert("2024-01-01T12:00:00.000+00:00", "test@mail.com", 302),
        ]),
    );

    // Every write to /dev/full fails with ENOSPC
    let driver = RecoveryDriver::new(
        config("2024-01-01T00:00:00", "2024-01-01T23:59:59", Path::new("/dev/full")),
        store,
    )
    .unwrap();
    let stats = driver.run().await.unwrap();

    assert_eq!(stats.days.len(), 1);
    assert_eq!(stats.days[0].status, DayStatus::Processed);
    assert_eq!(stats.days[0].stats.records_matched, 3);
    assert_eq!(stats.days[0].stats.write_failures, 3);
    assert_eq!(stats.write_failures, 3);
    assert_eq!(stats.sink.records_written, 0);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let store = Arc::new(InMemoryArchiveStore::new(BUCKET));
    let config = config(
        "2024-01-02T00:00:00",
        "2024-01-01T00:00:00",
        Path::new("/tmp/never-written.json"),
    );

    let err = RecoveryDriver::new(config, store).err().unwrap();
    assert!(matches!(err, RecoveryError::Config(_)));
}

#[tokio::test]
async fn test_unopenable_output_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("missing").join("recovered.json");
    let store = Arc::new(InMemoryArchiveStore::new(BUCKET));

    let driver = RecoveryDriver::new(
        config("2024-01-01T00:00:00", "2024-01-01T23:59:59", &out),
        store.clone(),
    )
    .unwrap();
    let err = driver.run().await.unwrap_err();

    assert!(matches!(err, RecoveryError::Sink(_)));
    assert_eq!(store.stats().head_calls, 0);
}
