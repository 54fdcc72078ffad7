//! Main entry point for the dice-scanner report
//!
//! Prints every claimable balance and the most recent plays as JSON.

use anyhow::{Context, Result};
use dice_scanner::scanner::{ScannerBuilder, ScannerConfig};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let config = match std::env::var("DICE_SCANNER_CONFIG") {
        Ok(path) => ScannerConfig::load(&path)?,
        Err(_) => ScannerConfig::default(),
    };

    info!("Starting dice-scanner against {}", config.rpc_endpoint);

    let scanner = ScannerBuilder::from_config(config)
        .connect(None)
        .context("Failed to build scanner")?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling scan");
                cancel.cancel();
            }
        }
    });

    let claimable = scanner
        .claimable(&cancel)
        .await
        .context("Failed to scan player pools")?;

    let history = scanner
        .history(None, &cancel)
        .await
        .context("Failed to scan activity history")?;

    let failures: Vec<_> = history
        .failures
        .iter()
        .map(|f| json!({ "signature": f.signature, "error": f.error.to_string() }))
        .collect();

    let report = json!({
        "program_id": scanner.context().program_id.to_string(),
        "claimable": claimable,
        "activity": history.records,
        "failures": failures,
        "next_cursor": history.next_cursor,
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
