//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `capability_status` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use std::process;

use capability_status::initialization::init_logger_with;
use capability_status::{run_probes, ChannelPublisher, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    // Every endpoint publishes exactly one message, so the queue never blocks.
    let (publisher, mut queue) = ChannelPublisher::new(config.endpoints.len());

    match run_probes(&config, &publisher).await {
        Ok(reports) => {
            drop(publisher);
            while let Some(queued) = queue.recv().await {
                debug!("Queued {} bytes on '{}'", queued.payload.len(), queued.destination);
            }

            let output =
                serde_json::to_string_pretty(&reports).context("Failed to serialize reports")?;
            println!("{output}");

            let failing = reports
                .iter()
                .filter(|report| !report.validation.is_valid())
                .count();
            eprintln!(
                "Probed {} endpoint{} ({} fully conformant, {} with failing rules)",
                reports.len(),
                if reports.len() == 1 { "" } else { "s" },
                reports.len() - failing,
                failing
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("capability_status error: {:#}", e);
            process::exit(1);
        }
    }
}
