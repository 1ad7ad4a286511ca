//! Runs the category scans of one session in order, with request pacing.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io::Write;
use tracing::{info, warn};

use crate::config::ScanConfig;
use crate::error::Result;
use crate::plan::ScanRange;
use crate::report::ReportWriter;
use crate::scanner::CategoryScanner;
use crate::summary::ScanSummary;
use crate::transport::RegisterReader;

/// When the inter-request delay is applied within a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PacingPolicy {
    /// Pause after every block, including the last one of a category.
    #[default]
    AfterEach,
    /// Pause only between two blocks of the same category.
    Between,
}

impl PacingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PacingPolicy::AfterEach => "after-each",
            PacingPolicy::Between => "between",
        }
    }
}

/// Drives a full scan session.
///
/// One transaction is in flight at a time: categories run one after the
/// other in scan order and blocks in ascending address order.
pub struct ScanOrchestrator {
    config: ScanConfig,
}

impl ScanOrchestrator {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan every selected category, streaming each result to `report` and
    /// tallying it in `summary`.
    ///
    /// Dropping the returned future at any await point leaves `report` with
    /// every already-emitted event flushed and `summary` consistent with it.
    pub async fn run<R, W>(
        &self,
        reader: &mut R,
        report: &mut ReportWriter<W>,
        summary: &mut ScanSummary,
    ) -> Result<()>
    where
        R: RegisterReader,
        W: Write,
    {
        report.scan_started(&self.config)?;

        for &category in &self.config.categories {
            let mut scanner =
                CategoryScanner::new(category, ScanRange::FULL, self.config.block_size, &mut *reader);
            let total = scanner.total_blocks();

            info!(category = category.as_str(), blocks = total, "Starting category scan");
            report.category_started(category, total)?;

            let tally = summary.begin(category, total);
            while let Some(result) = scanner.next().await {
                tally.record(&result);
                report.block(&result)?;

                if scanner.remaining() > 0 || self.config.pacing == PacingPolicy::AfterEach {
                    self.pause().await;
                }
            }

            report.category_finished(tally)?;
            info!(
                category = category.as_str(),
                succeeded = tally.succeeded,
                failed = tally.failed,
                values = tally.values_read,
                "Category scan complete"
            );
        }

        Ok(())
    }

    /// Run the scan until it completes or `shutdown` resolves, then write the
    /// final summary.
    ///
    /// An interrupted run is not an error: the summary covers what was
    /// scanned and is flagged as interrupted.
    pub async fn run_until<R, W, F>(
        &self,
        reader: &mut R,
        report: &mut ReportWriter<W>,
        shutdown: F,
    ) -> Result<ScanSummary>
    where
        R: RegisterReader,
        W: Write,
        F: Future<Output = ()>,
    {
        let mut summary = ScanSummary::default();

        let interrupted = tokio::select! {
            result = self.run(reader, report, &mut summary) => {
                result?;
                false
            }
            _ = shutdown => true,
        };

        if interrupted {
            warn!("Scan interrupted by user");
            summary.interrupted = true;
        }

        report.summary(&summary, &self.config)?;
        Ok(summary)
    }

    async fn pause(&self) {
        if !self.config.delay.is_zero() {
            tokio::time::sleep(self.config.delay).await;
        }
    }
}
