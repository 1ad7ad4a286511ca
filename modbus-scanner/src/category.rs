//! Modbus register categories and their fixed addressing constants.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The four addressable Modbus register categories.
///
/// Each category carries the function code used to read it and the base
/// offset of its conventional 5-digit display address.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
pub enum RegisterCategory {
    /// Discrete output coils (read/write, 1-bit)
    #[value(name = "coil")]
    #[serde(rename = "coil")]
    Coil,
    /// Discrete input contacts (read-only, 1-bit)
    #[value(name = "discrete")]
    #[serde(rename = "discrete")]
    DiscreteInput,
    /// Holding registers (read/write, 16-bit)
    #[value(name = "holding")]
    #[serde(rename = "holding")]
    HoldingRegister,
    /// Input registers (read-only, 16-bit)
    #[value(name = "input")]
    #[serde(rename = "input")]
    InputRegister,
}

impl RegisterCategory {
    /// All categories, in scan order.
    pub const ALL: [RegisterCategory; 4] = [
        RegisterCategory::Coil,
        RegisterCategory::DiscreteInput,
        RegisterCategory::HoldingRegister,
        RegisterCategory::InputRegister,
    ];

    /// Modbus function code used to read this category.
    pub const fn function_code(self) -> u8 {
        match self {
            RegisterCategory::Coil => 0x01,
            RegisterCategory::DiscreteInput => 0x02,
            RegisterCategory::HoldingRegister => 0x03,
            RegisterCategory::InputRegister => 0x04,
        }
    }

    /// Display address of raw offset 0.
    pub const fn base_offset(self) -> u32 {
        match self {
            RegisterCategory::Coil => 1,
            RegisterCategory::DiscreteInput => 10001,
            RegisterCategory::HoldingRegister => 40001,
            RegisterCategory::InputRegister => 30001,
        }
    }

    /// Human-readable label used in report lines.
    pub const fn label(self) -> &'static str {
        match self {
            RegisterCategory::Coil => "Coil",
            RegisterCategory::DiscreteInput => "Discrete Input",
            RegisterCategory::HoldingRegister => "Holding Register",
            RegisterCategory::InputRegister => "Input Register",
        }
    }

    /// Return the CLI/config key for this category.
    pub const fn as_str(self) -> &'static str {
        match self {
            RegisterCategory::Coil => "coil",
            RegisterCategory::DiscreteInput => "discrete",
            RegisterCategory::HoldingRegister => "holding",
            RegisterCategory::InputRegister => "input",
        }
    }

    /// Data width and access, as shown in the register table.
    pub const fn access(self) -> &'static str {
        match self {
            RegisterCategory::Coil => "bit R/W",
            RegisterCategory::DiscreteInput => "bit R",
            RegisterCategory::HoldingRegister => "16-bit R/W",
            RegisterCategory::InputRegister => "16-bit R",
        }
    }

    /// Whether a read returns single bits rather than 16-bit words.
    pub const fn is_bit_addressed(self) -> bool {
        matches!(
            self,
            RegisterCategory::Coil | RegisterCategory::DiscreteInput
        )
    }
}

impl std::fmt::Display for RegisterCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Order a user selection into scan order, dropping duplicates.
pub fn in_scan_order(selected: &[RegisterCategory]) -> Vec<RegisterCategory> {
    RegisterCategory::ALL
        .into_iter()
        .filter(|c| selected.contains(c))
        .collect()
}
