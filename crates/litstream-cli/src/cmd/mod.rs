pub mod collect;
pub mod interaction;
pub mod publish;

use anyhow::Result;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use litstream_kafka::{Broker, KafkaConfig, MemoryBroker, Publisher};

/// Publisher over whichever broker the command runs against
pub type DynPublisher = Publisher<Box<dyn Broker>>;

/// Open the delivery channel: Kafka, or an in-memory broker for dry runs.
pub fn open_publisher(config: &KafkaConfig, dry_run: bool) -> Result<DynPublisher> {
    if dry_run {
        log::info!("Dry run: publishing into an in-memory broker");
        let broker = MemoryBroker::new();
        let mut connect = broker.connector();
        let publisher = Publisher::open(config.clone(), move || {
            connect().map(|b| Box::new(b) as Box<dyn Broker>)
        })?;
        return Ok(publisher);
    }
    open_kafka(config)
}

#[cfg(feature = "kafka")]
fn open_kafka(config: &KafkaConfig) -> Result<DynPublisher> {
    use litstream_kafka::KafkaBroker;

    let publisher = Publisher::open(config.clone(), || {
        KafkaBroker::connect(config).map(|b| Box::new(b) as Box<dyn Broker>)
    })?;
    Ok(publisher)
}

#[cfg(not(feature = "kafka"))]
fn open_kafka(_config: &KafkaConfig) -> Result<DynPublisher> {
    anyhow::bail!("Built without Kafka support; rerun with --dry-run")
}

/// Print a key-value summary table on stderr
pub fn print_summary(title: &str, rows: &[(&str, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new(title).fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    eprintln!("\n{table}");
}
