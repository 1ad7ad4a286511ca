//! Modbus register-space scanner.
//!
//! Scans the raw range 0-9998 of the selected register categories in blocks
//! and reports which addresses respond.

use anyhow::{Context, Result};
use clap::Parser;
use modbus_scanner::args::ScanArgs;
use modbus_scanner::logging::init_tracing;
use modbus_scanner::{ReportWriter, ScanOrchestrator, TcpReader};
use tracing::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = ScanArgs::parse();

    let config = args.load_config().with_context(|| match &args.config {
        Some(path) => format!("Failed to load config from {:?}", path),
        None => "Failed to build configuration".to_string(),
    })?;

    init_tracing(&config.logging).context("Failed to init tracing")?;

    let scan = config.resolve().context("Invalid configuration")?;

    info!("Starting modbus-scanner");
    if let Some(path) = &args.config {
        info!("Loaded configuration from {:?}", path);
    }

    let mut report = ReportWriter::open(scan.output.as_deref(), scan.format)
        .with_context(|| format!("Failed to open report output {:?}", scan.output))?;

    let mut reader = TcpReader::connect(scan.addr, scan.slave, scan.timeout)
        .await
        .context("Scan aborted")?;

    let orchestrator = ScanOrchestrator::new(scan);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let summary = orchestrator
        .run_until(&mut reader, &mut report, shutdown)
        .await
        .context("Scan aborted")?;

    info!(
        categories = summary.categories.len(),
        failed_blocks = summary.total_failed(),
        interrupted = summary.interrupted,
        "Scan finished"
    );

    if let Some(path) = &orchestrator.config().output {
        info!("Report appended to {:?}", path);
    }

    Ok(())
}
