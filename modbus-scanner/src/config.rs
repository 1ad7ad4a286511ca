//! Configuration for the scanner.
//!
//! Settings come from three layers, lowest precedence first: built-in
//! defaults, an optional JSON5 file, and command-line flags. The merged
//! [`ScannerConfig`] is resolved exactly once into an immutable
//! [`ScanConfig`] before any network activity.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::category::{RegisterCategory, in_scan_order};
use crate::orchestrator::PacingPolicy;
use crate::report::ReportFormat;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete scanner configuration, as read from a file and the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Device to scan
    #[serde(default)]
    pub target: TargetConfig,

    /// Block sizing, pacing and category selection
    #[serde(default)]
    pub scan: ScanSettings,

    /// Report destination and format
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Modbus TCP target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// IP address of the device
    #[serde(default)]
    pub ip: Option<String>,

    /// TCP port (default: 502)
    #[serde(default = "default_modbus_port")]
    pub port: u16,

    /// Modbus unit/slave ID (default: 1)
    #[serde(default = "default_slave")]
    pub slave: u8,

    /// Connect and per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            ip: None,
            port: default_modbus_port(),
            slave: default_slave(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_modbus_port() -> u16 {
    502
}

fn default_slave() -> u8 {
    1
}

fn default_timeout_ms() -> u64 {
    3000
}

/// Scan parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Coils or registers requested per transaction (default: 50)
    #[serde(default = "default_block_size")]
    pub block_size: u16,

    /// Pause between transactions, in seconds (default: 4.0)
    #[serde(default = "default_delay_secs")]
    pub delay_secs: f64,

    /// Whether the pause also follows the last block of a category
    #[serde(default)]
    pub pacing: PacingPolicy,

    /// Categories to scan (default: all four)
    #[serde(default = "default_categories")]
    pub categories: Vec<RegisterCategory>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            delay_secs: default_delay_secs(),
            pacing: PacingPolicy::default(),
            categories: default_categories(),
        }
    }
}

fn default_block_size() -> u16 {
    50
}

fn default_delay_secs() -> f64 {
    4.0
}

fn default_categories() -> Vec<RegisterCategory> {
    RegisterCategory::ALL.to_vec()
}

/// Report output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// File the report is appended to; stdout when absent
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Report line format: "text" or "json"
    #[serde(default)]
    pub format: ReportFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json"
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Validated, immutable parameters of one scan run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub addr: SocketAddr,
    pub slave: u8,
    pub block_size: u16,
    pub delay: Duration,
    pub pacing: PacingPolicy,
    /// Selected categories, in scan order.
    pub categories: Vec<RegisterCategory>,
    pub timeout: Duration,
    pub output: Option<PathBuf>,
    pub format: ReportFormat,
}

impl ScannerConfig {
    /// Load configuration from a JSON5 file.
    ///
    /// Missing sections and fields take their defaults. The result is not
    /// validated yet since command-line flags may still override it.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ScannerConfig = json5::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configuration and freeze it into a [`ScanConfig`].
    pub fn resolve(&self) -> Result<ScanConfig, ConfigError> {
        let ip = self.target.ip.as_deref().ok_or_else(|| {
            ConfigError::Validation("Target IP address is required (--ip)".to_string())
        })?;

        let ip: IpAddr = ip.trim().parse().map_err(|e| {
            ConfigError::Validation(format!("Invalid IP address '{}': {}", ip, e))
        })?;

        if self.scan.block_size == 0 {
            return Err(ConfigError::Validation(
                "Block size must be at least 1".to_string(),
            ));
        }

        let delay_secs = self.scan.delay_secs;
        if !delay_secs.is_finite() || delay_secs < 0.0 {
            return Err(ConfigError::Validation(format!(
                "Delay must be a non-negative number of seconds, got {}",
                delay_secs
            )));
        }

        let delay = Duration::try_from_secs_f64(delay_secs).map_err(|e| {
            ConfigError::Validation(format!("Delay {} is out of range: {}", delay_secs, e))
        })?;

        if self.scan.categories.is_empty() {
            return Err(ConfigError::Validation(
                "At least one register category must be selected".to_string(),
            ));
        }

        if self.target.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "Timeout must be at least 1 ms".to_string(),
            ));
        }

        Ok(ScanConfig {
            addr: SocketAddr::new(ip, self.target.port),
            slave: self.target.slave,
            block_size: self.scan.block_size,
            delay,
            pacing: self.scan.pacing,
            categories: in_scan_order(&self.scan.categories),
            timeout: Duration::from_millis(self.target.timeout_ms),
            output: self.output.path.clone(),
            format: self.output.format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_ip(ip: &str) -> ScannerConfig {
        let mut config = ScannerConfig::default();
        config.target.ip = Some(ip.to_string());
        config
    }

    #[test]
    fn test_defaults() {
        let scan = with_ip("192.168.1.100").resolve().unwrap();

        assert_eq!(scan.addr, "192.168.1.100:502".parse().unwrap());
        assert_eq!(scan.slave, 1);
        assert_eq!(scan.block_size, 50);
        assert_eq!(scan.delay, Duration::from_secs(4));
        assert_eq!(scan.categories, RegisterCategory::ALL.to_vec());
        assert_eq!(scan.pacing, PacingPolicy::AfterEach);
        assert_eq!(scan.format, ReportFormat::Text);
        assert!(scan.output.is_none());
    }

    #[test]
    fn test_parse_file() {
        let json = r#"{
            target: { ip: "10.0.0.7", port: 1502, slave: 3 },
            scan: {
                block_size: 100,
                delay_secs: 0.5,
                pacing: "between",
                categories: ["input", "holding"],
            },
            output: { path: "scan.txt", format: "json" },
            logging: { level: "debug" },
        }"#;

        let config: ScannerConfig = json5::from_str(json).unwrap();
        let scan = config.resolve().unwrap();

        assert_eq!(scan.addr, "10.0.0.7:1502".parse().unwrap());
        assert_eq!(scan.slave, 3);
        assert_eq!(scan.block_size, 100);
        assert_eq!(scan.delay, Duration::from_millis(500));
        assert_eq!(scan.pacing, PacingPolicy::Between);
        assert_eq!(
            scan.categories,
            vec![
                RegisterCategory::HoldingRegister,
                RegisterCategory::InputRegister
            ]
        );
        assert_eq!(scan.output, Some(PathBuf::from("scan.txt")));
        assert_eq!(scan.format, ReportFormat::Json);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.target.timeout_ms, 3000); // default
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: ScannerConfig = json5::from_str("{}").unwrap();
        assert_eq!(config.target.port, 502);
        assert_eq!(config.scan.block_size, 50);
        assert_eq!(config.scan.categories.len(), 4);
    }

    #[test]
    fn test_validate_missing_ip() {
        let result = ScannerConfig::default().resolve();
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_malformed_ip() {
        assert!(with_ip("192.168.1.300").resolve().is_err());
        assert!(with_ip("not-an-ip").resolve().is_err());
        assert!(with_ip("::1").resolve().is_ok());
    }

    #[test]
    fn test_validate_block_size() {
        let mut config = with_ip("127.0.0.1");
        config.scan.block_size = 0;
        assert!(config.resolve().is_err());

        config.scan.block_size = 1;
        assert!(config.resolve().is_ok());
    }

    #[test]
    fn test_validate_delay() {
        let mut config = with_ip("127.0.0.1");

        config.scan.delay_secs = -1.0;
        assert!(config.resolve().is_err());

        config.scan.delay_secs = f64::NAN;
        assert!(config.resolve().is_err());

        config.scan.delay_secs = 0.0;
        assert_eq!(config.resolve().unwrap().delay, Duration::ZERO);
    }

    #[test]
    fn test_validate_empty_categories() {
        let mut config = with_ip("127.0.0.1");
        config.scan.categories.clear();
        assert!(config.resolve().is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = with_ip("127.0.0.1");
        config.target.timeout_ms = 0;
        assert!(config.resolve().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = ScannerConfig::load_from_file("/nonexistent/scanner.json5");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
