//! ProVideo device backend.
//!
//! This crate binds the protocol engine from `provideo-protocol` to the
//! command set of ProVideo devices. It provides:
//!
//! - **Domain traits** ([`domains`]) -- one trait per subsystem (system,
//!   auto exposure/white balance, video chain, ISP, LUT, playback, FPNC).
//! - **Command tables** ([`commands`]) -- `const` descriptors for every
//!   command, grouped by domain.
//! - **Driver tables** ([`system`], [`auto`], [`chain`], [`isp`], [`lut`],
//!   [`playback`], [`fpnc`]) -- the ProVideo implementation of each domain
//!   trait, with value validation before any I/O.
//! - **Model definitions** ([`models`]) -- static capability data for the
//!   known device families.
//! - **Device** ([`device`]) -- [`ProVideoDevice`], holding the channel and
//!   one driver slot per domain.
//! - **Builder** ([`builder`]) -- fluent builder API for constructing
//!   [`ProVideoDevice`] instances with defaults from the model.
//!
//! # Example
//!
//! ```
//! use provideo_device::commands::isp::GAIN_RED;
//! use provideo_protocol::protocol::{encode_request, FieldKind};
//!
//! assert_eq!(encode_request(GAIN_RED.command, &[], &[600], FieldKind::Decimal), b"gain_red 600\n");
//! ```

pub mod auto;
pub mod builder;
pub mod chain;
pub mod commands;
pub mod device;
pub mod domains;
pub mod fpnc;
pub mod isp;
pub mod lut;
pub mod models;
pub mod playback;
pub mod system;

// Re-export the primary types for ergonomic `use provideo_device::*`.
pub use builder::ProVideoBuilder;
pub use device::ProVideoDevice;
pub use domains::{
    AutoCommands, ChainCommands, FpncCommands, IspCommands, LutCommands, PlaybackCommands,
    SystemCommands,
};
pub use models::ProVideoModel;
