//! Partitioning of the raw address space into request blocks.

use serde::Serialize;

/// An inclusive interval of raw (zero-based) addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRange {
    pub start: u16,
    pub end: u16,
}

impl ScanRange {
    /// The raw range scanned for every category: 0-9998.
    pub const FULL: ScanRange = ScanRange {
        start: 0,
        end: 9998,
    };

    /// Number of addresses in the range.
    pub fn len(&self) -> u32 {
        u32::from(self.end) - u32::from(self.start) + 1
    }
}

/// A contiguous run of raw addresses read with a single transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Block {
    pub start: u16,
    pub end: u16,
}

impl Block {
    /// Number of coils or registers requested for this block.
    pub fn len(&self) -> u16 {
        self.end - self.start + 1
    }
}

/// Lazy, ascending sequence of blocks covering a [`ScanRange`].
#[derive(Debug, Clone)]
pub struct BlockPlan {
    next: Option<u16>,
    end: u16,
    block_size: u16,
}

/// Plan the blocks covering `range`.
///
/// `block_size` must be at least 1; configuration validation rejects zero
/// before any plan is built.
pub fn plan(range: ScanRange, block_size: u16) -> BlockPlan {
    debug_assert!(block_size >= 1, "block size must be positive");
    debug_assert!(range.start <= range.end);

    BlockPlan {
        next: Some(range.start),
        end: range.end,
        block_size: block_size.max(1),
    }
}

/// Number of blocks a plan over `range` produces.
pub fn block_count(range: ScanRange, block_size: u16) -> usize {
    let size = u32::from(block_size.max(1));
    range.len().div_ceil(size) as usize
}

impl Iterator for BlockPlan {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        let start = self.next?;
        let end = start.saturating_add(self.block_size - 1).min(self.end);

        self.next = if end >= self.end { None } else { Some(end + 1) };

        Some(Block { start, end })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next {
            Some(start) => block_count(
                ScanRange {
                    start,
                    end: self.end,
                },
                self.block_size,
            ),
            None => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BlockPlan {}

impl std::iter::FusedIterator for BlockPlan {}
