//! CLI argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::category::RegisterCategory;
use crate::config::{ConfigError, ScannerConfig};
use crate::orchestrator::PacingPolicy;
use crate::report::ReportFormat;

/// Scan the register space of a Modbus TCP device.
///
/// Flags override values from `--config`, which override built-in defaults.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "modbus-scanner")]
#[command(about = "Scans Modbus register categories and reports which addresses respond")]
#[command(version)]
pub struct ScanArgs {
    /// IP address of the Modbus device.
    #[arg(long, required_unless_present = "config")]
    pub ip: Option<String>,

    /// Modbus TCP port [default: 502].
    #[arg(long)]
    pub port: Option<u16>,

    /// Slave/unit ID [default: 1].
    #[arg(long)]
    pub slave: Option<u8>,

    /// Coils or registers per request [default: 50].
    #[arg(long)]
    pub block: Option<u16>,

    /// Delay in seconds between requests [default: 4.0].
    #[arg(long, allow_negative_numbers = true)]
    pub delay: Option<f64>,

    /// Categories to scan [default: all four].
    #[arg(long, value_enum, num_args = 1..)]
    pub category: Option<Vec<RegisterCategory>>,

    /// File the report is appended to (stdout if omitted).
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Path to a configuration file (JSON5 format).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Connect and per-request timeout in milliseconds [default: 3000].
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Whether the delay also follows the last block of a category.
    #[arg(long, value_enum)]
    pub pacing: Option<PacingPolicy>,

    /// Report line format [default: text].
    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl ScanArgs {
    /// Build the merged configuration: file (if any), then flags on top.
    pub fn load_config(&self) -> Result<ScannerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ScannerConfig::load_from_file(path)?,
            None => ScannerConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    /// Override `config` with every flag that was given.
    pub fn apply(&self, config: &mut ScannerConfig) {
        if let Some(ip) = &self.ip {
            config.target.ip = Some(ip.clone());
        }
        if let Some(port) = self.port {
            config.target.port = port;
        }
        if let Some(slave) = self.slave {
            config.target.slave = slave;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.target.timeout_ms = timeout_ms;
        }
        if let Some(block) = self.block {
            config.scan.block_size = block;
        }
        if let Some(delay) = self.delay {
            config.scan.delay_secs = delay;
        }
        if let Some(pacing) = self.pacing {
            config.scan.pacing = pacing;
        }
        if let Some(categories) = &self.category {
            config.scan.categories = categories.clone();
        }
        if let Some(output) = &self.output {
            config.output.path = Some(output.clone());
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}
