//! Transport trait for device communication.
//!
//! The [`Transport`] trait abstracts over the physical link to a ProVideo
//! device. The workspace ships a serial implementation (RS232/RS485 or a
//! USB virtual COM port) and a mock transport for testing.
//!
//! The protocol engine operates on a `Transport` rather than directly on a
//! serial port, enabling both real hardware control and deterministic unit
//! testing with `MockTransport` from the `provideo-test-harness` crate.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Error, Result};

/// Asynchronous byte-level transport to a device.
///
/// Implementations handle buffering and error recovery at the physical
/// layer. The command language (request lines, status tokens, list
/// records) is handled by the protocol engine that consumes this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the device.
    ///
    /// Implementations should wait until all bytes have been handed to the
    /// underlying channel (serial TX buffer, mock log, ...).
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the device into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Waits at most `timeout`
    /// for data to arrive; returns [`Error::Timeout`] if nothing arrived
    /// within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`].
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;

    /// Poll for bytes without treating silence as an error.
    ///
    /// This is the non-blocking read the protocol engine is built on: it
    /// waits at most `interval` and reports `Ok(0)` when nothing arrived.
    async fn poll(&mut self, buf: &mut [u8], interval: Duration) -> Result<usize> {
        match self.receive(buf, interval).await {
            Ok(n) => Ok(n),
            Err(Error::Timeout) => Ok(0),
            Err(e) => Err(e),
        }
    }
}
