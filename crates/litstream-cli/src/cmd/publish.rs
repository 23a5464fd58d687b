//! Publish subcommand - ingest records from a JSON Lines file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use litstream_core::fmt_num;
use litstream_kafka::BatchStats;

use crate::cmd::{open_publisher, print_summary};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// JSON Lines file, one record per line
    #[arg(short, long)]
    pub file: PathBuf,

    /// Records per batch (one flush per batch)
    #[arg(short, long, default_value_t = 500)]
    pub batch_size: usize,

    /// Publish into an in-memory broker instead of Kafka
    #[arg(long)]
    pub dry_run: bool,
}

/// Records read from a file, plus lines that were not JSON
#[derive(Debug, Default)]
struct Records {
    values: Vec<Value>,
    malformed: usize,
}

fn read_records(path: &Path) -> Result<Records> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut records = Records::default();
    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => records.values.push(value),
            Err(e) => {
                log::warn!("{}:{}: skipping malformed record: {e}", path.display(), i + 1);
                records.malformed += 1;
            }
        }
    }
    Ok(records)
}

pub fn run(args: PublishArgs, config: &Config) -> Result<()> {
    let records = read_records(&args.file)?;
    log::info!(
        "Publishing {} records from {} ({} malformed)",
        records.values.len(),
        args.file.display(),
        records.malformed
    );

    let mut publisher = open_publisher(&config.kafka, args.dry_run)?;
    let mut totals = BatchStats {
        skipped: records.malformed,
        ..Default::default()
    };
    for chunk in records.values.chunks(args.batch_size.max(1)) {
        let batch = publisher.send_batch(chunk)?;
        totals.sent += batch.sent;
        totals.failed += batch.failed;
        totals.skipped += batch.skipped;
    }
    publisher.close();

    print_summary(
        "Publish",
        &[
            ("Records", fmt_num(totals.total())),
            ("Sent", fmt_num(totals.sent)),
            ("Failed", fmt_num(totals.failed)),
            ("Skipped", fmt_num(totals.skipped)),
            ("Topic", config.kafka.articles_topic.clone()),
        ],
    );

    if totals.failed > 0 {
        anyhow::bail!("{} records failed to publish", totals.failed);
    }
    Ok(())
}
