//! Incremental report output.
//!
//! Every event is written and flushed as soon as it happens, so an
//! interrupted scan leaves a complete record of every block read so far.
//! Files are opened in append mode and never truncated.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use crate::address::format_modbus_address;
use crate::category::RegisterCategory;
use crate::config::ScanConfig;
use crate::error::Result;
use crate::plan::ScanRange;
use crate::scanner::{BlockOutcome, BlockResult};
use crate::summary::{CategorySummary, ScanSummary};
use crate::transport::RegisterValues;

/// Report line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable text lines (default).
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Source of the timestamps stamped on headers.
pub type Clock = fn() -> String;

fn local_now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// One JSON report line.
#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum JsonEvent<'a> {
    ScanStarted {
        timestamp: String,
        target: String,
        slave: u8,
        block_size: u16,
        delay_secs: f64,
        pacing: &'a str,
        categories: &'a [RegisterCategory],
    },
    CategoryStarted {
        timestamp: String,
        category: RegisterCategory,
        total_blocks: usize,
    },
    Block {
        category: RegisterCategory,
        raw_start: u16,
        raw_end: u16,
        modbus_start: u32,
        modbus_end: u32,
        status: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        values: Option<Vec<u16>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    CategoryFinished {
        #[serde(flatten)]
        summary: &'a CategorySummary,
    },
    Summary {
        timestamp: String,
        #[serde(flatten)]
        summary: &'a ScanSummary,
    },
}

/// Append-only report sink.
pub struct ReportWriter<W = Box<dyn Write + Send>> {
    out: W,
    format: ReportFormat,
    clock: Clock,
}

impl ReportWriter {
    /// Write to the console.
    pub fn stdout(format: ReportFormat) -> Self {
        Self::new(Box::new(io::stdout()), format)
    }

    /// Append to `path`, creating the file if absent.
    pub fn append_to(path: &Path, format: ReportFormat) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(Box::new(file), format))
    }

    /// Open the sink selected by the configuration.
    pub fn open(output: Option<&Path>, format: ReportFormat) -> Result<Self> {
        match output {
            Some(path) => Self::append_to(path, format),
            None => Ok(Self::stdout(format)),
        }
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W, format: ReportFormat) -> Self {
        Self {
            out,
            format,
            clock: local_now,
        }
    }

    /// Replace the timestamp source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Report preamble: target, parameters and the register table.
    pub fn scan_started(&mut self, config: &ScanConfig) -> Result<()> {
        let timestamp = (self.clock)();
        match self.format {
            ReportFormat::Json => self.emit_json(&JsonEvent::ScanStarted {
                timestamp,
                target: config.addr.to_string(),
                slave: config.slave,
                block_size: config.block_size,
                delay_secs: config.delay.as_secs_f64(),
                pacing: config.pacing.as_str(),
                categories: &config.categories,
            }),
            ReportFormat::Text => {
                let categories: Vec<&str> = config.categories.iter().map(|c| c.as_str()).collect();
                let mut text = format!(
                    "\n===== Modbus scan of {} (slave {}) - {} =====\n",
                    config.addr, config.slave, timestamp
                );
                text.push_str(&format!(
                    "Blocks of {}, delay {}s ({}), categories: {}\n",
                    config.block_size,
                    config.delay.as_secs_f64(),
                    config.pacing.as_str(),
                    categories.join(", ")
                ));
                text.push_str(&register_table());
                self.emit_text(&text)
            }
        }
    }

    pub fn category_started(&mut self, category: RegisterCategory, total_blocks: usize) -> Result<()> {
        let timestamp = (self.clock)();
        match self.format {
            ReportFormat::Json => self.emit_json(&JsonEvent::CategoryStarted {
                timestamp,
                category,
                total_blocks,
            }),
            ReportFormat::Text => self.emit_text(&format!(
                "---- {} - {} ({} blocks) ----\n",
                category.label(),
                timestamp,
                total_blocks
            )),
        }
    }

    /// One line per block.
    pub fn block(&mut self, result: &BlockResult) -> Result<()> {
        match self.format {
            ReportFormat::Json => {
                let label = result.label();
                let (status, values, error) = match &result.outcome {
                    BlockOutcome::Success(values) => ("success", Some(as_numbers(values)), None),
                    BlockOutcome::Failure(e) => ("failure", None, Some(e.to_string())),
                };
                self.emit_json(&JsonEvent::Block {
                    category: result.category,
                    raw_start: result.block.start,
                    raw_end: result.block.end,
                    modbus_start: label.modbus_start(),
                    modbus_end: label.modbus_end(),
                    status,
                    values,
                    error,
                })
            }
            ReportFormat::Text => self.emit_text(&format!("{}\n", block_line(result))),
        }
    }

    pub fn category_finished(&mut self, summary: &CategorySummary) -> Result<()> {
        match self.format {
            ReportFormat::Json => self.emit_json(&JsonEvent::CategoryFinished { summary }),
            ReportFormat::Text => self.emit_text(&format!(
                "---- End of {} scan: {} succeeded, {} failed, {} values read ----\n",
                summary.category.label(),
                summary.succeeded,
                summary.failed,
                summary.values_read
            )),
        }
    }

    /// Final summary, written once at the end of a run (also when interrupted).
    pub fn summary(&mut self, summary: &ScanSummary, config: &ScanConfig) -> Result<()> {
        let timestamp = (self.clock)();
        match self.format {
            ReportFormat::Json => self.emit_json(&JsonEvent::Summary { timestamp, summary }),
            ReportFormat::Text => {
                let mut text = format!("===== Summary - {} =====\n", timestamp);
                for category in &summary.categories {
                    text.push_str(&format!(
                        "{}: {}/{} blocks readable, {} values read; readable {}\n",
                        category.category.label(),
                        category.succeeded,
                        category.total_blocks,
                        category.values_read,
                        category.readable_display()
                    ));
                }
                text.push_str(&format!(
                    "(Scan performed with blocks of {} {} and a delay of {} seconds per block)\n",
                    config.block_size,
                    unit_name(&config.categories),
                    config.delay.as_secs_f64()
                ));
                if summary.interrupted {
                    text.push_str("(scan interrupted before completion)\n");
                }
                self.emit_text(&text)
            }
        }
    }

    fn emit_text(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn emit_json(&mut self, event: &JsonEvent<'_>) -> Result<()> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        self.out.write_all(&line)?;
        self.out.flush()?;
        Ok(())
    }
}

/// `<label>: raw A-B -> modbus X-Y : SUCCESS [values]` or `... : FAILURE <error>`.
pub fn block_line(result: &BlockResult) -> String {
    let prefix = format!("{}: {}", result.category.label(), result.label());
    match &result.outcome {
        BlockOutcome::Success(values) => {
            let values: Vec<String> = as_numbers(values).iter().map(u16::to_string).collect();
            format!("{} : SUCCESS [{}]", prefix, values.join(", "))
        }
        BlockOutcome::Failure(e) => format!("{} : FAILURE {}", prefix, e),
    }
}

/// What a block counts, in the selected categories.
fn unit_name(categories: &[RegisterCategory]) -> &'static str {
    let bits = categories.iter().filter(|c| c.is_bit_addressed()).count();
    if bits == 0 {
        "registers"
    } else if bits == categories.len() {
        "coils"
    } else {
        "coils/registers"
    }
}

fn as_numbers(values: &RegisterValues) -> Vec<u16> {
    match values {
        RegisterValues::Bits(bits) => bits.iter().map(|&b| u16::from(b)).collect(),
        RegisterValues::Words(words) => words.clone(),
    }
}

/// Static table of the four categories and their address windows.
pub fn register_table() -> String {
    let mut table = String::from(
        "Register Type                   | Modbus Address | RAW Address | Function\n\
         --------------------------------|----------------|-------------|---------\n",
    );

    let range = ScanRange::FULL;
    for category in RegisterCategory::ALL {
        let kind = format!("{} ({})", category.label(), category.access());
        let window = format!(
            "{}-{}",
            format_modbus_address(category.base_offset() + u32::from(range.start)),
            format_modbus_address(category.base_offset() + u32::from(range.end))
        );
        table.push_str(&format!(
            "{:<32}| {:<15}| {:<12}| {:02}\n",
            kind,
            window,
            format!("{}-{}", range.start, range.end),
            category.function_code()
        ));
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Block;
    use crate::transport::ReadError;

    fn result(category: RegisterCategory, outcome: BlockOutcome) -> BlockResult {
        BlockResult {
            category,
            block: Block { start: 0, end: 2 },
            outcome,
        }
    }

    #[test]
    fn test_success_line() {
        let line = block_line(&result(
            RegisterCategory::HoldingRegister,
            BlockOutcome::Success(RegisterValues::Words(vec![7, 0, 65535])),
        ));
        assert_eq!(
            line,
            "Holding Register: raw 0-2 -> modbus 40001-40003 : SUCCESS [7, 0, 65535]"
        );
    }

    #[test]
    fn test_failure_line() {
        let line = block_line(&result(
            RegisterCategory::Coil,
            BlockOutcome::Failure(ReadError::Exception("IllegalDataAddress".into())),
        ));
        assert_eq!(
            line,
            "Coil: raw 0-2 -> modbus 00001-00003 : FAILURE Modbus exception: IllegalDataAddress"
        );
    }

    #[test]
    fn test_coils_render_as_digits() {
        let line = block_line(&result(
            RegisterCategory::DiscreteInput,
            BlockOutcome::Success(RegisterValues::Bits(vec![true, false, true])),
        ));
        assert!(line.ends_with("SUCCESS [1, 0, 1]"));
    }

    #[test]
    fn test_register_table_rows() {
        let table = register_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[2].starts_with("Coil (bit R/W)"));
        assert!(lines[2].contains("00001-09999"));
        assert!(lines[4].contains("40001-49999"));
        assert!(lines[4].ends_with("| 03"));
        assert!(lines[5].contains("30001-39999"));
    }

    #[test]
    fn test_json_block_event() {
        let mut writer = ReportWriter::new(Vec::new(), ReportFormat::Json);
        writer
            .block(&result(
                RegisterCategory::InputRegister,
                BlockOutcome::Success(RegisterValues::Words(vec![1, 2, 3])),
            ))
            .unwrap();
        writer
            .block(&result(
                RegisterCategory::InputRegister,
                BlockOutcome::Failure(ReadError::Communication("timeout".into())),
            ))
            .unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines[0]["event"], "block");
        assert_eq!(lines[0]["category"], "input");
        assert_eq!(lines[0]["modbus_start"], 30001);
        assert_eq!(lines[0]["status"], "success");
        assert_eq!(lines[0]["values"], serde_json::json!([1, 2, 3]));
        assert_eq!(lines[1]["status"], "failure");
        assert_eq!(lines[1]["error"], "Communication error: timeout");
        assert!(lines[1].get("values").is_none());
    }

    fn scan_config(categories: Vec<RegisterCategory>) -> ScanConfig {
        ScanConfig {
            addr: "127.0.0.1:502".parse().unwrap(),
            slave: 1,
            block_size: 50,
            delay: std::time::Duration::from_secs(4),
            pacing: crate::orchestrator::PacingPolicy::AfterEach,
            categories,
            timeout: std::time::Duration::from_secs(3),
            output: None,
            format: ReportFormat::Text,
        }
    }

    #[test]
    fn test_text_summary() {
        let mut summary = ScanSummary::default();
        summary.begin(RegisterCategory::Coil, 2);
        summary.interrupted = true;

        let mut writer =
            ReportWriter::new(Vec::new(), ReportFormat::Text).with_clock(|| "T0".to_string());
        writer
            .summary(&summary, &scan_config(vec![RegisterCategory::Coil]))
            .unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            output,
            "===== Summary - T0 =====\n\
             Coil: 0/2 blocks readable, 0 values read; readable none\n\
             (Scan performed with blocks of 50 coils and a delay of 4 seconds per block)\n\
             (scan interrupted before completion)\n"
        );
    }

    #[test]
    fn test_summary_parameter_note_names_units() {
        assert_eq!(unit_name(&[RegisterCategory::HoldingRegister]), "registers");
        assert_eq!(
            unit_name(&[RegisterCategory::Coil, RegisterCategory::DiscreteInput]),
            "coils"
        );
        assert_eq!(unit_name(&RegisterCategory::ALL), "coils/registers");

        let mut writer =
            ReportWriter::new(Vec::new(), ReportFormat::Text).with_clock(|| "T0".to_string());
        writer
            .summary(
                &ScanSummary::default(),
                &scan_config(vec![RegisterCategory::InputRegister]),
            )
            .unwrap();
        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert!(output.ends_with(
            "(Scan performed with blocks of 50 registers and a delay of 4 seconds per block)\n"
        ));
    }
}
