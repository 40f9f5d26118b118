//! # provideo -- control-plane client for ProVideo devices
//!
//! `provideo` is an asynchronous Rust library for configuring ProVideo
//! camera heads and processing boxes over their RS232/RS485 command line.
//! It turns the devices' line-oriented text protocol into typed getters
//! and setters, one trait per subsystem, and reads and writes the fixed
//! pattern noise correction (FPNC) data of the sensor.
//!
//! ## Quick Start
//!
//! ```no_run
//! use provideo::{ColorComponent, ProVideoBuilder};
//! use provideo::models::xbow;
//!
//! #[tokio::main]
//! async fn main() -> provideo::Result<()> {
//!     let device = ProVideoBuilder::new(xbow())
//!         .serial_port("/dev/ttyUSB0")
//!         .build()
//!         .await?;
//!
//!     let isp = device.isp()?;
//!     println!("red gain: {}", isp.gain(ColorComponent::Red).await?);
//!     isp.set_gain(ColorComponent::Red, 600).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                 | Purpose                                          |
//! |-----------------------|--------------------------------------------------|
//! | `provideo-core`       | [`Transport`] trait, value types, [`Error`]      |
//! | `provideo-transport`  | Serial transport and port enumeration            |
//! | `provideo-protocol`   | Command descriptors, engine, list accumulator    |
//! | `provideo-fpnc`       | FPNC bit codec and data file                     |
//! | `provideo-device`     | Domain traits, command tables, builder           |
//! | **`provideo`**        | This facade crate -- re-exports everything       |
//!
//! ## Command domains
//!
//! A [`ProVideoDevice`] holds one driver table per domain. Domains the
//! model lacks answer with [`Error::NoDriver`]:
//!
//! - **System**: identity, temperatures, settings, RS485 discovery
//! - **Auto**: auto exposure, metering weights, white balance
//! - **Chain**: video mode, genlock, flip, SDI levels
//! - **ISP**: gains, black level, flare, colour correction
//! - **LUT**: gamma tables through the write-index register
//! - **Playback**: frame store recording and playback
//! - **FPNC**: correction enable/gains, paged data access, table upload
//!
//! ## Integer status codes
//!
//! Every error maps onto a negative POSIX error number with
//! [`Error::errno`]; [`status`] collapses a result into `0` or that code
//! for callers that bind the library to a status-code interface.

pub use provideo_core::*;

pub use provideo_device::{
    AutoCommands, ChainCommands, FpncCommands, IspCommands, LutCommands, PlaybackCommands,
    ProVideoBuilder, ProVideoDevice, ProVideoModel, SystemCommands,
};
pub use provideo_fpnc::FpncData;

/// Serial transport and host port enumeration.
pub mod serial {
    pub use provideo_transport::*;
}

/// The protocol engine: descriptors, `run`/`get`/`set`, list accumulation.
pub mod protocol {
    pub use provideo_protocol::*;
}

/// FPNC bit codec and correction table.
pub mod fpnc {
    pub use provideo_fpnc::*;
}

/// Known device families.
pub mod models {
    pub use provideo_device::models::*;
}

/// The ProVideo command tables and driver implementations.
pub mod device {
    pub use provideo_device::*;
}

/// Returns every known device family.
///
/// # Example
///
/// ```
/// for model in provideo::supported_models() {
///     println!("{} ({} baud)", model.name, model.default_baud_rate);
/// }
/// ```
pub fn supported_models() -> Vec<ProVideoModel> {
    provideo_device::models::all_models()
}
