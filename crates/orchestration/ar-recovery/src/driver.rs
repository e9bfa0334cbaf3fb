//! Day-range driver.
//!
//! Walks every calendar day between the configured bounds, one at a time:
//! derive the key, download and verify, stream the gzip body through the
//! filter, write matches to the sink. A day that cannot be read is logged and
//! skipped; only configuration and output-open errors end the run.

use crate::config::RecoveryConfig;
use crate::download::{DownloadOutcome, VerifiedArchive, VerifiedDownloader};
use crate::filter::{RecordFilter, Verdict};
use crate::key::{ObjectKey, month_abbreviation};
use crate::range::DayRange;
use crate::sink::{RotatingSink, RotationPolicy, ThrottlePolicy};
use crate::stats::{DayReport, DayStats, DayStatus, RunStats};
use ar_error::{RecordError, RecoveryError, Result};
use ar_traits::ArchiveStore;
use async_compression::tokio::bufread::GzipDecoder;
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Runs a recovery over a day range.
pub struct RecoveryDriver<S: ArchiveStore + ?Sized> {
    config: RecoveryConfig,
    downloader: VerifiedDownloader<S>,
    filter: RecordFilter,
}

impl<S: ArchiveStore + ?Sized> RecoveryDriver<S> {
    /// Create a driver, validating the configuration.
    pub fn new(config: RecoveryConfig, store: Arc<S>) -> Result<Self> {
        config.validate()?;

        let downloader = VerifiedDownloader::new(store, config.retry.clone())
            .with_temp_dir(config.temp_dir.clone());
        let filter = RecordFilter::from_config(&config);

        Ok(Self {
            config,
            downloader,
            filter,
        })
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Run the recovery to the end of the range.
    pub async fn run(&self) -> Result<RunStats> {
        let mut sink = RotatingSink::open(
            &self.config.output_path,
            ThrottlePolicy::from_config(&self.config),
            RotationPolicy::from_config(&self.config),
        )
        .await?;

        info!(
            bucket = self.downloader.store().bucket(),
            min = %self.config.min_timestamp,
            max = %self.config.max_timestamp,
            eps = self.config.events_per_second,
            max_bytes = self.config.max_output_bytes,
            output = %self.config.output_path.display(),
            "Starting recovery"
        );

        let mut stats = RunStats::new();
        for date in DayRange::covering(self.config.min_timestamp, self.config.max_timestamp) {
            let report = self.recover_day(date, &mut sink).await;
            stats.record_day(report);
        }

        sink.close().await;
        stats.complete(sink.stats());

        info!(
            days = stats.days_visited,
            processed = stats.days_processed,
            absent = stats.days_absent,
            failed = stats.days_failed,
            records = stats.records_matched,
            rotations = stats.sink.rotations,
            "Recovery completed"
        );

        Ok(stats)
    }

    async fn recover_day(&self, date: NaiveDate, sink: &mut RotatingSink) -> DayReport {
        let key = ObjectKey::for_date(date);
        info!("Checking for: {}", key.uri(self.downloader.store().bucket()));

        let archive = match self.downloader.fetch(&key).await {
            DownloadOutcome::Verified(archive) => archive,
            DownloadOutcome::Absent => {
                info!("File not found in S3: {}", key);
                return DayReport::new(date, key.as_str(), DayStatus::Absent);
            }
            DownloadOutcome::Failed { attempts, error } => {
                error!("Error downloading {} after {} attempts: {}", key, attempts, error);
                return DayReport::new(date, key.as_str(), DayStatus::Failed).with_error(error);
            }
        };

        info!("Reading file from S3: {}", key);

        let mut day = DayStats {
            bytes_downloaded: archive.size(),
            ..Default::default()
        };
        let result = self.extract(&archive, sink, &mut day).await;
        archive.discard();

        info!(
            "Extracted {} alerts from day {}-{}-{}",
            day.records_matched,
            date.day(),
            month_abbreviation(date),
            date.year()
        );

        match result {
            Ok(()) => DayReport::new(date, key.as_str(), DayStatus::Processed).with_stats(day),
            Err(e) => {
                warn!(key = %key, lines = day.lines_read, error = %e, "Stopped reading archive");
                DayReport::new(date, key.as_str(), DayStatus::Interrupted)
                    .with_stats(day)
                    .with_error(e)
            }
        }
    }

    /// Stream the archive through the filter into the sink.
    ///
    /// Returns an error only when the body can no longer be read; records
    /// written before that stay written.
    async fn extract(
        &self,
        archive: &VerifiedArchive,
        sink: &mut RotatingSink,
        day: &mut DayStats,
    ) -> Result<()> {
        let file = archive
            .open()
            .await
            .map_err(|e| RecoveryError::Decompression(format!("open failed: {e}")))?;

        let mut decoder = GzipDecoder::new(BufReader::with_capacity(READ_BUFFER_SIZE, file));
        decoder.multiple_members(true);
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, decoder);

        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|e| RecoveryError::Decompression(e.to_string()))?;
            if n == 0 {
                break;
            }
            day.lines_read += 1;

            let line = String::from_utf8_lossy(&buf);
            match self.filter.evaluate(&line) {
                Ok(Verdict::Matched(record)) => {
                    day.records_matched += 1;
                    match sink.write_record(&record).await {
                        Ok(receipt) => {
                            day.throttle_pauses += u64::from(receipt.paused);
                            day.output_rotations += u64::from(receipt.rotated);
                        }
                        Err(e) => {
                            day.write_failures += 1;
                            warn!(key = %archive.key(), error = %e, "Failed to write record");
                        }
                    }
                }
                Ok(Verdict::Rejected(reason)) => {
                    debug!(key = %archive.key(), line = day.lines_read, reason = ?reason, "Record rejected");
                }
                Err(e) => {
                    match e {
                        RecordError::Malformed(_) => day.malformed_lines += 1,
                        RecordError::Timestamp(_) => day.bad_timestamps += 1,
                    }
                    warn!(
                        key = %archive.key(),
                        line = day.lines_read,
                        error = %e,
                        "Skipping record: {}",
                        line.trim_end()
                    );
                }
            }
        }

        Ok(())
    }
}
