//! litstream - scientific literature collector
//!
//! Queries PubMed and arXiv, normalizes the results into canonical
//! articles and publishes them to a Kafka topic.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "litstream")]
#[command(about = "Collect scientific literature into a Kafka stream")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./litstream.toml or ~/.config/litstream/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Collect articles from PubMed and arXiv and publish them
    Collect(cmd::collect::CollectArgs),
    /// Publish records from a JSON Lines file
    Publish(cmd::publish::PublishArgs),
    /// Send a user interaction event
    Interaction(cmd::interaction::InteractionArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let dotenv = dotenvy::dotenv().ok();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(litstream_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug: spinners show activity
    //   non-TTY: info unless --debug: logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    litstream_core::init_logging(quiet, cli.debug, multi);

    if let Some(path) = dotenv {
        log::debug!("Loaded environment from {}", path.display());
    }
    litstream_core::install_signal_handlers().context("Failed to install signal handlers")?;

    let config = match cli.config {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };

    match cli.command {
        Command::Collect(args) => cmd::collect::run(args, &config, &progress),
        Command::Publish(args) => cmd::publish::run(args, &config),
        Command::Interaction(args) => cmd::interaction::run(args, &config),
        Command::Config => {
            print_config(&config);
            Ok(())
        }
    }
}

fn print_config(config: &Config) {
    use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec![
        "Queries",
        &format!(
            "{} ({} for arXiv)",
            config.queries.len(),
            config.arxiv_queries().len()
        ),
    ]);
    table.add_row(vec!["PM base URL", &config.pubmed.base_url]);
    table.add_row(vec![
        "PM API key",
        if config.pubmed.api_key().is_some() {
            "configured"
        } else {
            "not set"
        },
    ]);
    table.add_row(vec![
        "PM max/query",
        &config.pubmed.max_results.to_string(),
    ]);
    table.add_row(vec![
        "PM pacing",
        &format!("{}ms", config.pubmed.request_delay().as_millis()),
    ]);
    table.add_row(vec!["arXiv base URL", &config.arxiv.base_url]);
    table.add_row(vec![
        "arXiv max/query",
        &config.arxiv.max_results.to_string(),
    ]);
    table.add_row(vec![
        "arXiv cooldown",
        &format!("{}s", config.arxiv.cooldown_secs),
    ]);
    table.add_row(vec!["arXiv categories", &config.arxiv.categories.join(", ")]);
    table.add_row(vec!["Kafka brokers", &config.kafka.brokers]);
    table.add_row(vec![
        "Kafka topics",
        &format!(
            "{} / {}",
            config.kafka.articles_topic, config.kafka.interactions_topic
        ),
    ]);
    table.add_row(vec![
        "Connect retries",
        &format!(
            "{} x {}s",
            config.kafka.max_retries, config.kafka.retry_delay_secs
        ),
    ]);
    table.add_row(vec![
        "Ack timeout",
        &format!("{}s", config.kafka.ack_timeout_secs),
    ]);

    eprintln!("\n{table}");
}
