//! Per-category tallies collected while a scan runs.

use serde::Serialize;

use crate::address::{format_modbus_address, to_modbus_address};
use crate::category::RegisterCategory;
use crate::scanner::BlockResult;

/// Tally of one category's block results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: RegisterCategory,
    pub total_blocks: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub values_read: usize,
    /// Raw address ranges that answered, adjacent successful blocks merged.
    pub readable: Vec<(u16, u16)>,
}

impl CategorySummary {
    pub fn new(category: RegisterCategory, total_blocks: usize) -> Self {
        Self {
            category,
            total_blocks,
            succeeded: 0,
            failed: 0,
            values_read: 0,
            readable: Vec::new(),
        }
    }

    /// Fold one block result into the tally. Results arrive in ascending
    /// address order.
    pub fn record(&mut self, result: &BlockResult) {
        if !result.is_success() {
            self.failed += 1;
            return;
        }

        self.succeeded += 1;
        self.values_read += result.values_read();

        let block = result.block;
        match self.readable.last_mut() {
            Some((_, end)) if u32::from(*end) + 1 == u32::from(block.start) => *end = block.end,
            _ => self.readable.push((block.start, block.end)),
        }
    }

    /// Blocks with an outcome so far.
    pub fn scanned(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Readable ranges as display addresses, e.g. `40001-40100, 40151-49999`.
    pub fn readable_display(&self) -> String {
        if self.readable.is_empty() {
            return "none".to_string();
        }

        self.readable
            .iter()
            .map(|&(start, end)| {
                format!(
                    "{}-{}",
                    format_modbus_address(to_modbus_address(start, self.category)),
                    format_modbus_address(to_modbus_address(end, self.category))
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Tally of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub categories: Vec<CategorySummary>,
    /// Set when the run was stopped before covering every category.
    pub interrupted: bool,
}

impl ScanSummary {
    /// Start tallying a new category.
    pub fn begin(&mut self, category: RegisterCategory, total_blocks: usize) -> &mut CategorySummary {
        self.categories
            .push(CategorySummary::new(category, total_blocks));
        let last = self.categories.len() - 1;
        &mut self.categories[last]
    }

    pub fn total_failed(&self) -> usize {
        self.categories.iter().map(|c| c.failed).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Block;
    use crate::scanner::BlockOutcome;
    use crate::transport::{ReadError, RegisterValues};

    fn ok(start: u16, end: u16) -> BlockResult {
        BlockResult {
            category: RegisterCategory::HoldingRegister,
            block: Block { start, end },
            outcome: BlockOutcome::Success(RegisterValues::Words(vec![0; (end - start + 1) as usize])),
        }
    }

    fn failed(start: u16, end: u16) -> BlockResult {
        BlockResult {
            category: RegisterCategory::HoldingRegister,
            block: Block { start, end },
            outcome: BlockOutcome::Failure(ReadError::Exception("IllegalDataAddress".into())),
        }
    }

    #[test]
    fn test_merges_adjacent_successes() {
        let mut summary = CategorySummary::new(RegisterCategory::HoldingRegister, 5);
        for result in [ok(0, 49), ok(50, 99), failed(100, 149), ok(150, 199), ok(200, 249)] {
            summary.record(&result);
        }

        assert_eq!(summary.succeeded, 4);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.values_read, 200);
        assert_eq!(summary.readable, vec![(0, 99), (150, 249)]);
        assert_eq!(summary.readable_display(), "40001-40100, 40151-40250");
    }

    #[test]
    fn test_nothing_readable() {
        let mut summary = CategorySummary::new(RegisterCategory::HoldingRegister, 1);
        summary.record(&failed(0, 9998));
        assert_eq!(summary.readable_display(), "none");
        assert_eq!(summary.scanned(), 1);
    }

    #[test]
    fn test_scan_summary_totals() {
        let mut scan = ScanSummary::default();
        scan.begin(RegisterCategory::Coil, 2).record(&failed(0, 1));
        scan.begin(RegisterCategory::InputRegister, 2);

        let categories: Vec<RegisterCategory> =
            scan.categories.iter().map(|c| c.category).collect();
        assert_eq!(
            categories,
            vec![RegisterCategory::Coil, RegisterCategory::InputRegister]
        );
        assert_eq!(scan.categories[0].failed, 1);
        assert_eq!(scan.total_failed(), 1);
    }
}
