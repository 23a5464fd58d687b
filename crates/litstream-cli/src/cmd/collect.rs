//! Collect subcommand - run the configured queries through each source

use anyhow::Result;
use clap::{Args, ValueEnum};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use litstream_arxiv::ArxivSource;
use litstream_collector::{Collector, RunStats, SessionReport};
use litstream_core::{SHARED_RUNTIME, SharedProgress, Source, SourceKind, fmt_num, is_shutdown_requested};
use litstream_pubmed::PubmedSource;

use crate::cmd::open_publisher;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Source to collect from
    #[arg(short, long, value_enum, default_value = "all")]
    pub source: SourceArg,

    /// Query to run (repeatable; replaces the configured queries)
    #[arg(short, long)]
    pub query: Vec<String>,

    /// Maximum results per query (default: per-source setting)
    #[arg(short, long)]
    pub max: Option<usize>,

    /// Run sources in parallel, one channel each
    #[arg(long)]
    pub parallel: bool,

    /// Publish into an in-memory broker instead of Kafka
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq)]
pub enum SourceArg {
    Pubmed,
    Arxiv,
    All,
}

/// Queries one source runs, with its per-query cap
#[derive(Debug, Clone)]
struct Job {
    kind: SourceKind,
    queries: Vec<String>,
    max_results: usize,
}

/// What one source achieved over all its queries
#[derive(Debug)]
struct SourceSummary {
    totals: RunStats,
    queries_run: usize,
    queries_failed: usize,
    report: SessionReport,
}

fn plan(args: &CollectArgs, config: &Config) -> Vec<Job> {
    let kinds: &[SourceKind] = match args.source {
        SourceArg::Pubmed => &[SourceKind::Pubmed],
        SourceArg::Arxiv => &[SourceKind::Arxiv],
        SourceArg::All => &[SourceKind::Pubmed, SourceKind::Arxiv],
    };

    kinds
        .iter()
        .map(|&kind| {
            let (configured, default_max) = match kind {
                SourceKind::Arxiv => (config.arxiv_queries(), config.arxiv.max_results),
                _ => (config.queries.as_slice(), config.pubmed.max_results),
            };
            let queries = if args.query.is_empty() {
                configured.to_vec()
            } else {
                args.query.clone()
            };
            Job {
                kind,
                queries,
                max_results: args.max.unwrap_or(default_max),
            }
        })
        .collect()
}

fn make_source(kind: SourceKind, config: &Config) -> Box<dyn Source> {
    match kind {
        SourceKind::Arxiv => Box::new(ArxivSource::new(config.arxiv.clone())),
        _ => Box::new(PubmedSource::new(config.pubmed.clone())),
    }
}

pub fn run(args: CollectArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let jobs = plan(&args, config);
    for job in &jobs {
        log::info!(
            "{}: {} queries, max {} results each",
            job.kind,
            job.queries.len(),
            job.max_results
        );
    }

    let results: Vec<(SourceKind, Result<SourceSummary>)> = if args.parallel {
        collect_parallel(jobs, config, args.dry_run, progress)
    } else {
        jobs.iter()
            .map(|job| (job.kind, collect_source(job, config, args.dry_run, progress)))
            .collect()
    };

    print_results(&results);

    let mut failures = 0;
    for (kind, result) in &results {
        match result {
            Ok(summary) if summary.queries_failed > 0 => {
                log::error!("{kind}: {} queries failed", summary.queries_failed);
                failures += 1;
            }
            Ok(_) => {}
            Err(e) => {
                log::error!("{kind}: {e:#}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} source(s) failed");
    }
    Ok(())
}

fn collect_parallel(
    jobs: Vec<Job>,
    config: &Config,
    dry_run: bool,
    progress: &SharedProgress,
) -> Vec<(SourceKind, Result<SourceSummary>)> {
    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let config = config.clone();
            let progress = progress.clone();
            let kind = job.kind;
            let handle = SHARED_RUNTIME
                .handle()
                .spawn_blocking(move || collect_source(&job, &config, dry_run, &progress));
            (kind, handle)
        })
        .collect();

    SHARED_RUNTIME.handle().block_on(async {
        let mut results = Vec::with_capacity(handles.len());
        for (kind, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(anyhow::anyhow!("{kind} task panicked: {e}")),
            };
            results.push((kind, result));
        }
        results
    })
}

/// Run every query of one job through its own collector and channel.
fn collect_source(
    job: &Job,
    config: &Config,
    dry_run: bool,
    progress: &SharedProgress,
) -> Result<SourceSummary> {
    let publisher = open_publisher(&config.kafka, dry_run)?;
    let mut collector = Collector::new(make_source(job.kind, config), publisher);

    let mut line = progress.source_line(job.kind);
    let mut totals = RunStats::default();
    let mut queries_run = 0;
    let mut queries_failed = 0;
    let count = job.queries.len();

    for (i, query) in job.queries.iter().enumerate() {
        if is_shutdown_requested() {
            log::warn!("{}: shutdown requested, skipping {} queries", job.kind, count - i);
            break;
        }
        line.start_query(i, count, query);
        queries_run += 1;

        match collector.run(query, job.max_results) {
            Ok(stats) => {
                line.add_published(stats.sent);
                totals += stats;
            }
            Err(e) => {
                queries_failed += 1;
                log::error!("{}: query '{query}' failed: {e}", job.kind);
            }
        }
    }
    line.finish();

    Ok(SourceSummary {
        totals,
        queries_run,
        queries_failed,
        report: collector.finish(),
    })
}

fn print_results(results: &[(SourceKind, Result<SourceSummary>)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(
            ["Source", "Queries", "Collected", "Sent", "Failed", "Skipped", "Time"]
                .into_iter()
                .map(|h| Cell::new(h).fg(Color::Cyan)),
        );

    for (kind, result) in results {
        match result {
            Ok(s) => {
                let queries = if s.queries_failed > 0 {
                    format!("{} ({} failed)", s.queries_run, s.queries_failed)
                } else {
                    s.queries_run.to_string()
                };
                let secs = s.report.elapsed().num_milliseconds() as f64 / 1000.0;
                table.add_row(vec![
                    Cell::new(kind),
                    Cell::new(queries),
                    Cell::new(fmt_num(s.totals.collected)),
                    Cell::new(fmt_num(s.totals.sent)),
                    Cell::new(fmt_num(s.totals.failed)),
                    Cell::new(fmt_num(s.totals.skipped)),
                    Cell::new(format!("{secs:.1}s")),
                ]);
            }
            Err(_) => {
                table.add_row(vec![
                    Cell::new(kind),
                    Cell::new("channel unavailable").fg(Color::Red),
                ]);
            }
        }
    }
    eprintln!("\n{table}");
}
