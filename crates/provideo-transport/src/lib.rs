//! Transport implementations for provideo.
//!
//! This crate provides the serial implementation of the
//! [`Transport`](provideo_core::Transport) trait from `provideo-core`:
//!
//! - [`SerialTransport`]: RS232 / RS485 links and USB virtual COM ports
//! - [`available_ports`] / [`port_count`]: host port enumeration
//!
//! # Example
//!
//! ```no_run
//! use provideo_transport::SerialTransport;
//! use provideo_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> provideo_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 115_200).await?;
//!
//! transport.send(b"device_id\n").await?;
//!
//! let mut buf = [0u8; 256];
//! let n = transport.receive(&mut buf, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{
    DEFAULT_BAUD_RATE, DataBits, FlowControl, Parity, PortInfo, SerialConfig, SerialTransport,
    StopBits, available_ports, port_count,
};
