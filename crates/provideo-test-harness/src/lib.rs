//! provideo-test-harness: Test utilities and mock transports for provideo.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! the protocol engine and command domains without a ProVideo device.

pub mod mock_serial;

pub use mock_serial::MockTransport;
