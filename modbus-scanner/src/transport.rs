//! Read transactions against a Modbus device.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio_modbus::client::{Context, Reader};
use tokio_modbus::prelude::*;
use tracing::{debug, info, warn};

use crate::category::RegisterCategory;
use crate::error::{Result, ScanError};

/// Values returned by a successful read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterValues {
    /// Coils and discrete inputs.
    Bits(Vec<bool>),
    /// Holding and input registers.
    Words(Vec<u16>),
}

impl RegisterValues {
    pub fn len(&self) -> usize {
        match self {
            RegisterValues::Bits(bits) => bits.len(),
            RegisterValues::Words(words) => words.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Why a single read transaction failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    /// The device answered with a Modbus exception response.
    #[error("Modbus exception: {0}")]
    Exception(String),
    /// Timeout, dropped connection or malformed response.
    #[error("Communication error: {0}")]
    Communication(String),
}

/// A connected client able to read any register category.
///
/// Implementations never write to the device.
#[allow(async_fn_in_trait)]
pub trait RegisterReader {
    /// Read `count` coils or registers of `category`, starting at raw
    /// address `start`.
    async fn read(
        &mut self,
        category: RegisterCategory,
        start: u16,
        count: u16,
    ) -> std::result::Result<RegisterValues, ReadError>;
}

/// Modbus TCP client with a per-request deadline.
///
/// A request that times out or fails below the Modbus layer leaves the
/// stream in an unknown state, so the connection is dropped and the next
/// read opens a fresh one.
pub struct TcpReader {
    addr: SocketAddr,
    slave: u8,
    timeout: Duration,
    ctx: Option<Context>,
}

impl TcpReader {
    /// Connect to the device at `addr`, addressing unit `slave`.
    pub async fn connect(addr: SocketAddr, slave: u8, timeout: Duration) -> Result<Self> {
        info!(%addr, slave, "Connecting to Modbus device");

        let ctx = open(addr, slave, timeout)
            .await
            .map_err(|message| ScanError::connection(addr, message))?;

        info!(%addr, "Connected");

        Ok(Self {
            addr,
            slave,
            timeout,
            ctx: Some(ctx),
        })
    }

    async fn reconnect(&self) -> std::result::Result<Context, ReadError> {
        info!(addr = %self.addr, "Reconnecting to Modbus device");
        open(self.addr, self.slave, self.timeout)
            .await
            .map_err(|message| ReadError::Communication(format!("Reconnect failed: {}", message)))
    }
}

async fn open(
    addr: SocketAddr,
    slave: u8,
    timeout: Duration,
) -> std::result::Result<Context, String> {
    tokio::time::timeout(timeout, tcp::connect_slave(addr, Slave(slave)))
        .await
        .map_err(|_| "Connection timeout".to_string())?
        .map_err(|e| e.to_string())
}

impl RegisterReader for TcpReader {
    async fn read(
        &mut self,
        category: RegisterCategory,
        start: u16,
        count: u16,
    ) -> std::result::Result<RegisterValues, ReadError> {
        let mut ctx = match self.ctx.take() {
            Some(ctx) => ctx,
            None => self.reconnect().await?,
        };

        debug!(
            function = category.function_code(),
            start, count, "Sending read request"
        );

        let timeout = self.timeout;
        let response = match category {
            RegisterCategory::Coil => with_deadline(timeout, ctx.read_coils(start, count))
                .await
                .map(|r| r.map(RegisterValues::Bits)),
            RegisterCategory::DiscreteInput => {
                with_deadline(timeout, ctx.read_discrete_inputs(start, count))
                    .await
                    .map(|r| r.map(RegisterValues::Bits))
            }
            RegisterCategory::HoldingRegister => {
                with_deadline(timeout, ctx.read_holding_registers(start, count))
                    .await
                    .map(|r| r.map(RegisterValues::Words))
            }
            RegisterCategory::InputRegister => {
                with_deadline(timeout, ctx.read_input_registers(start, count))
                    .await
                    .map(|r| r.map(RegisterValues::Words))
            }
        };

        match response {
            Ok(Ok(values)) => {
                self.ctx = Some(ctx);
                Ok(values)
            }
            Ok(Err(exception)) => {
                self.ctx = Some(ctx);
                Err(ReadError::Exception(format!("{:?}", exception)))
            }
            Err(e) => {
                warn!(addr = %self.addr, "Dropping connection after failed request: {}", e);
                Err(e)
            }
        }
    }
}

/// Await a tokio-modbus request under `timeout`.
///
/// The outer error means the transaction did not complete and the
/// connection can no longer be trusted; the inner one is a Modbus exception
/// answered by the device.
async fn with_deadline<T>(
    timeout: Duration,
    request: impl Future<Output = tokio_modbus::Result<T>>,
) -> std::result::Result<std::result::Result<T, ExceptionCode>, ReadError> {
    match tokio::time::timeout(timeout, request).await {
        Err(_) => Err(ReadError::Communication(format!(
            "Request timed out after {} ms",
            timeout.as_millis()
        ))),
        Ok(Err(e)) => Err(ReadError::Communication(e.to_string())),
        Ok(Ok(response)) => Ok(response),
    }
}
