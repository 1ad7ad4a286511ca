//! Simulated Modbus device for tests.
//!
//! Behaviour is fully deterministic:
//! - a coil or discrete input at raw address `a` reads `a % 3 == 0`;
//! - a holding or input register at raw address `a` reads `a * 7` (wrapping)
//!   xor'ed with the function code;
//! - requests touching an address outside the configured readable window of
//!   a category fail with an `IllegalDataAddress` exception;
//! - individual transactions can be scripted to fail or answer short.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use tokio::time::Instant;

use crate::category::RegisterCategory;
use crate::transport::{ReadError, RegisterReader, RegisterValues};

/// Scripted behaviour for one transaction, by call index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Fail with a communication error.
    Communication(String),
    /// Answer with one value fewer than requested.
    ShortResponse,
}

/// A transaction as seen by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub category: RegisterCategory,
    pub start: u16,
    pub count: u16,
    pub at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    readable: HashMap<RegisterCategory, RangeInclusive<u16>>,
    faults: HashMap<usize, Fault>,
    requests: Vec<Request>,
}

impl MockDevice {
    /// A device where every address of every category is readable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the readable raw addresses of `category`.
    pub fn with_readable(mut self, category: RegisterCategory, range: RangeInclusive<u16>) -> Self {
        self.readable.insert(category, range);
        self
    }

    /// Script the transaction with zero-based index `call` to misbehave.
    pub fn with_fault(mut self, call: usize, fault: Fault) -> Self {
        self.faults.insert(call, fault);
        self
    }

    /// Every transaction received so far, in order.
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    /// Value of a single address, as this device reports it.
    pub fn value_at(category: RegisterCategory, raw: u16) -> u16 {
        if category.is_bit_addressed() {
            u16::from(raw % 3 == 0)
        } else {
            raw.wrapping_mul(7) ^ u16::from(category.function_code())
        }
    }

    fn is_readable(&self, category: RegisterCategory, start: u16, count: u16) -> bool {
        let Some(range) = self.readable.get(&category) else {
            return true;
        };
        let end = u32::from(start) + u32::from(count.max(1)) - 1;
        u32::from(*range.start()) <= u32::from(start) && end <= u32::from(*range.end())
    }
}

impl RegisterReader for MockDevice {
    async fn read(
        &mut self,
        category: RegisterCategory,
        start: u16,
        count: u16,
    ) -> Result<RegisterValues, ReadError> {
        let call = self.requests.len();
        self.requests.push(Request {
            category,
            start,
            count,
            at: Instant::now(),
        });

        let mut count = count;
        match self.faults.get(&call) {
            Some(Fault::Communication(message)) => {
                return Err(ReadError::Communication(message.clone()));
            }
            Some(Fault::ShortResponse) => count = count.saturating_sub(1),
            None => {}
        }

        if !self.is_readable(category, start, count) {
            return Err(ReadError::Exception("IllegalDataAddress".to_string()));
        }

        let addresses = (0..count).map(|i| start.wrapping_add(i));
        let values = if category.is_bit_addressed() {
            RegisterValues::Bits(addresses.map(|a| Self::value_at(category, a) == 1).collect())
        } else {
            RegisterValues::Words(addresses.map(|a| Self::value_at(category, a)).collect())
        };

        Ok(values)
    }
}
