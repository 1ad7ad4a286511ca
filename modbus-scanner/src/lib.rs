//! Modbus register-space scanner.
//!
//! Enumerates which raw addresses of a Modbus TCP device answer read
//! requests, for each of the four register categories, and reports them
//! with their conventional 5-digit display addresses.
//!
//! # Scan model
//!
//! ```text
//! category (coil, discrete, holding, input)
//!   └── raw range 0-9998, split into blocks of `block_size`
//!         └── one read transaction per block -> SUCCESS [values] | FAILURE <error>
//! ```
//!
//! Display addresses are the raw offset plus the category base:
//! coils `00001`, discrete inputs `10001`, input registers `30001`,
//! holding registers `40001`.
//!
//! Requests are strictly sequential and paced by a configurable delay. A
//! failed block is recorded and the scan moves on; only configuration errors,
//! an unreachable device, or an unwritable report abort a run.

pub mod address;
pub mod args;
pub mod category;
pub mod config;
pub mod error;
pub mod logging;
pub mod mock;
pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod scanner;
pub mod summary;
pub mod transport;

pub use address::{AddressLabel, to_modbus_address};
pub use category::RegisterCategory;
pub use config::{ScanConfig, ScannerConfig};
pub use error::{Result, ScanError};
pub use orchestrator::{PacingPolicy, ScanOrchestrator};
pub use plan::{Block, ScanRange, plan};
pub use report::{ReportFormat, ReportWriter};
pub use scanner::{BlockOutcome, BlockResult, CategoryScanner};
pub use summary::{CategorySummary, ScanSummary};
pub use transport::{ReadError, RegisterReader, RegisterValues, TcpReader};
