//! recover-logs CLI
//!
//! Re-extracts filtered alerts from daily Wazuh archive objects in S3.

use ar_cli_common::{format_bytes, format_duration, format_number, init_logging};
use clap::Parser;
use tracing::error;

mod args;
mod run;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    init_logging(args.log_level, args.log_file.as_deref())?;

    let stats = match run::execute(args).await {
        Ok(stats) => stats,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    // Report results to stderr
    eprintln!();
    eprintln!("Recovery completed:");
    eprintln!("  Days visited:     {}", stats.days_visited);
    eprintln!("  Days processed:   {}", stats.days_processed);
    eprintln!("  Days absent:      {}", stats.days_absent);
    eprintln!("  Days failed:      {}", stats.days_failed);
    if stats.days_interrupted > 0 {
        eprintln!("  Days interrupted: {}", stats.days_interrupted);
    }
    eprintln!("  Lines read:       {}", format_number(stats.lines_read));
    eprintln!("  Alerts matched:   {}", format_number(stats.records_matched));
    eprintln!("  Bytes downloaded: {}", format_bytes(stats.bytes_downloaded));
    eprintln!("  Bytes written:    {}", format_bytes(stats.sink.bytes_written));
    eprintln!("  Rotations:        {}", stats.sink.rotations);

    if stats.malformed_lines > 0 || stats.bad_timestamps > 0 || stats.write_failures > 0 {
        eprintln!(
            "  Skipped:          {} malformed, {} bad timestamps, {} write failures",
            format_number(stats.malformed_lines),
            format_number(stats.bad_timestamps),
            format_number(stats.write_failures)
        );
    }

    let secs = stats.duration().num_milliseconds() as f64 / 1000.0;
    eprintln!("  Duration:         {}", format_duration(secs));
    if secs > 0.0 && stats.records_matched > 0 {
        eprintln!(
            "  Throughput:       {} alerts/sec",
            format_number(stats.records_per_second() as u64)
        );
    }

    Ok(())
}
