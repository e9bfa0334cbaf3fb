//! Main execution logic for recover-logs.

use anyhow::Result;
use ar_recovery::{
    MatchRules, RecoveryConfig, RecoveryDriver, RunStats, gigabytes_to_bytes, parse_timestamp,
};
use ar_store::{S3ArchiveStore, S3Config, create_s3_client};
use std::sync::Arc;
use tracing::debug;

use crate::args::Cli;

/// Build the recovery configuration from arguments.
///
/// Bad numbers or timestamps are reported before any network access.
pub fn build_config(args: &Cli) -> Result<RecoveryConfig> {
    let min = parse_timestamp("min_timestamp", &args.min_timestamp)?;
    let max = parse_timestamp("max_timestamp", &args.max_timestamp)?;
    let max_bytes = gigabytes_to_bytes(args.max_size)?;

    let rules = MatchRules::new(&args.resource);
    let rules = if args.any_event_id {
        rules.with_any_event_id()
    } else {
        rules.with_event_ids(args.event_ids.iter().copied())
    };

    let config = RecoveryConfig::new(min, max, &args.output_file)
        .with_events_per_second(args.eps)
        .with_max_output_bytes(max_bytes)
        .with_match_rules(rules);

    let config = match &args.temp_dir {
        Some(dir) => config.with_temp_dir(dir),
        None => config,
    };

    config.validate()?;
    Ok(config)
}

/// Build the storage configuration from arguments.
pub fn build_s3_config(args: &Cli) -> S3Config {
    let config = S3Config::new(&args.bucket)
        .with_profile(&args.aws_profile)
        .with_endpoint(&args.s3_endpoint);

    match &args.region {
        Some(region) => config.with_region(region),
        None => config,
    }
}

/// Execute the recovery with the provided arguments.
pub async fn execute(args: Cli) -> Result<RunStats> {
    let config = build_config(&args)?;
    let s3_config = build_s3_config(&args);

    debug!(
        bucket = %s3_config.bucket,
        endpoint = ?s3_config.endpoint,
        profile = ?s3_config.profile,
        "Creating S3 client"
    );
    let client = create_s3_client(&s3_config).await;
    let store = Arc::new(S3ArchiveStore::new(client, s3_config.bucket.clone()));

    let driver = RecoveryDriver::new(config, store)?;
    let stats = driver.run().await?;
    Ok(stats)
}
