//! Interaction subcommand - send one user interaction event

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use crate::cmd::open_publisher;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct InteractionArgs {
    /// Event as a JSON object, e.g. '{"user_id":"u1","article_id":"pubmed_123","action":"view"}'
    pub event: String,

    /// Publish into an in-memory broker instead of Kafka
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_event(raw: &str) -> Result<Value> {
    let event: Value = serde_json::from_str(raw).context("Interaction is not valid JSON")?;
    anyhow::ensure!(event.is_object(), "Interaction must be a JSON object");
    Ok(event)
}

pub fn run(args: InteractionArgs, config: &Config) -> Result<()> {
    let event = parse_event(&args.event)?;
    let mut publisher = open_publisher(&config.kafka, args.dry_run)?;

    let sent = publisher.send_interaction(event);
    publisher.close();

    anyhow::ensure!(sent, "Interaction was not delivered");
    log::info!("Interaction sent to {}", config.kafka.interactions_topic);
    Ok(())
}
