//! Scanning of a single register category, one transaction per block.

use tracing::{debug, info, warn};

use crate::address::AddressLabel;
use crate::category::RegisterCategory;
use crate::plan::{Block, BlockPlan, ScanRange, plan};
use crate::transport::{ReadError, RegisterReader, RegisterValues};

/// Outcome of reading one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    Success(RegisterValues),
    Failure(ReadError),
}

/// The result of one transaction, tagged with what was asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockResult {
    pub category: RegisterCategory,
    pub block: Block,
    pub outcome: BlockOutcome,
}

impl BlockResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, BlockOutcome::Success(_))
    }

    /// Raw and display address range of the block.
    pub fn label(&self) -> AddressLabel {
        AddressLabel::new(self.block, self.category)
    }

    /// Number of values read, zero on failure.
    pub fn values_read(&self) -> usize {
        match &self.outcome {
            BlockOutcome::Success(values) => values.len(),
            BlockOutcome::Failure(_) => 0,
        }
    }
}

/// Lazily scans every block of one category.
///
/// Each call to [`next`](Self::next) issues exactly one read and turns any
/// error into a failed [`BlockResult`]; a failure never ends the scan early.
pub struct CategoryScanner<'a, R> {
    category: RegisterCategory,
    reader: &'a mut R,
    blocks: BlockPlan,
    total: usize,
    done: usize,
}

impl<'a, R: RegisterReader> CategoryScanner<'a, R> {
    pub fn new(
        category: RegisterCategory,
        range: ScanRange,
        block_size: u16,
        reader: &'a mut R,
    ) -> Self {
        let blocks = plan(range, block_size);
        let total = blocks.len();

        Self {
            category,
            reader,
            blocks,
            total,
            done: 0,
        }
    }

    pub fn category(&self) -> RegisterCategory {
        self.category
    }

    /// Number of blocks in the whole category scan.
    pub fn total_blocks(&self) -> usize {
        self.total
    }

    /// Number of blocks not yet read.
    pub fn remaining(&self) -> usize {
        self.total - self.done
    }

    /// Read the next block, or return `None` once the range is covered.
    pub async fn next(&mut self) -> Option<BlockResult> {
        let block = self.blocks.next()?;
        self.done += 1;

        let label = AddressLabel::new(block, self.category);
        info!(
            category = self.category.as_str(),
            "Scanning block {}/{} ({})", self.done, self.total, label
        );

        let response = self
            .reader
            .read(self.category, block.start, block.len())
            .await;
        let outcome = classify(response, block.len());

        match &outcome {
            BlockOutcome::Success(values) => {
                debug!(category = self.category.as_str(), %label, count = values.len(), "Block read");
            }
            BlockOutcome::Failure(e) => {
                warn!(category = self.category.as_str(), %label, "Block failed: {}", e);
            }
        }

        Some(BlockResult {
            category: self.category,
            block,
            outcome,
        })
    }
}

/// Classify a read response, checking that the payload has the requested
/// length.
fn classify(response: Result<RegisterValues, ReadError>, expected: u16) -> BlockOutcome {
    match response {
        Ok(values) if values.len() == usize::from(expected) => BlockOutcome::Success(values),
        Ok(values) => BlockOutcome::Failure(ReadError::Communication(format!(
            "Malformed response: expected {} values, got {}",
            expected,
            values.len()
        ))),
        Err(e) => BlockOutcome::Failure(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Fault, MockDevice};
    use crate::plan::block_count;

    async fn scan_all<R: RegisterReader>(
        category: RegisterCategory,
        block_size: u16,
        reader: &mut R,
    ) -> Vec<BlockResult> {
        let mut scanner = CategoryScanner::new(category, ScanRange::FULL, block_size, reader);
        let mut results = Vec::new();
        while let Some(result) = scanner.next().await {
            results.push(result);
        }
        results
    }

    #[test]
    fn test_classify_length_mismatch() {
        let outcome = classify(Ok(RegisterValues::Words(vec![1, 2])), 3);
        assert!(matches!(
            outcome,
            BlockOutcome::Failure(ReadError::Communication(_))
        ));

        let outcome = classify(Ok(RegisterValues::Bits(vec![true; 3])), 3);
        assert!(matches!(outcome, BlockOutcome::Success(_)));
    }

    #[tokio::test]
    async fn test_all_blocks_succeed() {
        let mut device = MockDevice::new();
        let results = scan_all(RegisterCategory::HoldingRegister, 50, &mut device).await;

        assert_eq!(results.len(), block_count(ScanRange::FULL, 50));
        assert!(results.iter().all(BlockResult::is_success));
        assert!(results.windows(2).all(|w| w[0].block.end < w[1].block.start));
        assert_eq!(results[0].label().to_string(), "raw 0-49 -> modbus 40001-40050");
    }

    #[tokio::test]
    async fn test_failed_block_does_not_stop_scan() {
        let k = 7;
        let mut device = MockDevice::new().with_fault(k, Fault::Communication("timeout".into()));
        let results = scan_all(RegisterCategory::InputRegister, 100, &mut device).await;

        assert_eq!(results.len(), 100);
        let failures: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_success())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(failures, vec![k]);
        assert_eq!(device.requests().len(), 100);
    }

    #[tokio::test]
    async fn test_requests_use_block_bounds() {
        let mut device = MockDevice::new();
        let results = scan_all(RegisterCategory::Coil, 2000, &mut device).await;

        assert_eq!(results.len(), 5);
        let requests = device.requests();
        assert_eq!((requests[0].start, requests[0].count), (0, 2000));
        assert_eq!((requests[4].start, requests[4].count), (8000, 1999));
        assert!(requests.iter().all(|r| r.category == RegisterCategory::Coil));
    }

    #[tokio::test]
    async fn test_exception_and_short_response() {
        let mut device = MockDevice::new()
            .with_readable(RegisterCategory::DiscreteInput, 0..=4999)
            .with_fault(0, Fault::ShortResponse);
        let results = scan_all(RegisterCategory::DiscreteInput, 1000, &mut device).await;

        assert!(matches!(
            results[0].outcome,
            BlockOutcome::Failure(ReadError::Communication(_))
        ));
        assert!(results[1..5].iter().all(BlockResult::is_success));
        assert!(results[5..].iter().all(|r| matches!(
            r.outcome,
            BlockOutcome::Failure(ReadError::Exception(_))
        )));
        assert_eq!(results[1].values_read(), 1000);
        assert_eq!(results[5].values_read(), 0);
    }

    #[tokio::test]
    async fn test_remaining_counts_down() {
        let mut device = MockDevice::new();
        let mut scanner =
            CategoryScanner::new(RegisterCategory::Coil, ScanRange::FULL, 5000, &mut device);

        assert_eq!(scanner.total_blocks(), 2);
        assert_eq!(scanner.remaining(), 2);
        scanner.next().await.unwrap();
        assert_eq!(scanner.remaining(), 1);
        scanner.next().await.unwrap();
        assert_eq!(scanner.remaining(), 0);
        assert!(scanner.next().await.is_none());
    }
}
