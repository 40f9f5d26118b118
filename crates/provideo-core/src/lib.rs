//! provideo-core: Core traits, types, and error definitions for provideo.
//!
//! This crate defines the device-agnostic abstractions that the protocol
//! engine, the FPNC codec and every command domain build on. Configuration
//! panels and other callers depend on these types without pulling in a
//! specific transport.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel
//! - [`Error`] / [`Result`] -- error handling, with [`status`] for
//!   integer-status callers
//! - [`Rgb`], [`ColorMatrix`], [`ColorComponent`], ... -- typed device values

pub mod error;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use provideo_core::*`.
pub use error::{Error, Result, errno, status};
pub use transport::Transport;
pub use types::*;
