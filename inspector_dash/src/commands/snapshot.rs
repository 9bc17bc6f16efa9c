//! One-shot dump of the requests the backend has stored

use crate::commands::output;
use crate::config::Settings;
use crate::snapshot::SnapshotClient;
use anyhow::{Context, Result};
use console::style;

/// How the snapshot is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// One line per request
    Lines,
    /// Every card field and block
    Cards,
    /// Records as JSON, exactly as the backend sent them
    Json,
}

pub async fn run(settings: Settings, format: SnapshotFormat) -> Result<()> {
    let client = SnapshotClient::new(&settings.backend_url, settings.snapshot_timeout)?;
    let mut records = client.fetch().await?;

    if let Some(capacity) = settings.feed_capacity {
        records.truncate(capacity.max(1));
    }

    match format {
        SnapshotFormat::Json => {
            let json = serde_json::to_string_pretty(&records).context("Failed to encode requests")?;
            println!("{}", json);
        }
        SnapshotFormat::Lines | SnapshotFormat::Cards => {
            if records.is_empty() {
                println!("No requests captured yet.");
                println!();
                println!("Send one to {} to see it here.", style(&settings.backend_url).cyan());
                return Ok(());
            }

            println!(
                "{} {}",
                style(format!("{} requests", records.len())).bold(),
                style(format!("from {}", client.url())).dim()
            );
            println!();

            for record in &records {
                if format == SnapshotFormat::Cards {
                    output::print_card(record);
                } else {
                    output::print_request(record, false);
                }
            }
        }
    }

    Ok(())
}
