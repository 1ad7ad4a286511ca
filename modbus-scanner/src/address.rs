//! Conversion from raw offsets to conventional Modbus display addresses.

use std::fmt;

use crate::category::RegisterCategory;
use crate::plan::Block;

/// Map a raw offset to the display address of `category`.
///
/// Holding register raw 0 is 40001, coil raw 0 is 1.
pub fn to_modbus_address(raw: u16, category: RegisterCategory) -> u32 {
    category.base_offset() + u32::from(raw)
}

/// Format a display address as the conventional 5-digit string.
pub fn format_modbus_address(address: u32) -> String {
    format!("{:05}", address)
}

/// A block together with its display addresses, rendered as
/// `raw A-B -> modbus X-Y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressLabel {
    pub block: Block,
    pub category: RegisterCategory,
}

impl AddressLabel {
    pub fn new(block: Block, category: RegisterCategory) -> Self {
        Self { block, category }
    }

    pub fn modbus_start(&self) -> u32 {
        to_modbus_address(self.block.start, self.category)
    }

    pub fn modbus_end(&self) -> u32 {
        to_modbus_address(self.block.end, self.category)
    }
}

impl fmt::Display for AddressLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "raw {}-{} -> modbus {}-{}",
            self.block.start,
            self.block.end,
            format_modbus_address(self.modbus_start()),
            format_modbus_address(self.modbus_end())
        )
    }
}
