//! Protocol engine for the ProVideo command language.
//!
//! ProVideo devices are driven with newline-terminated ASCII commands. A
//! query returns a value line and a status line, a write returns a status
//! line, and a few commands stream a list of records. This crate turns
//! that language into typed exchanges over any
//! [`Transport`](provideo_core::Transport).
//!
//! # Architecture
//!
//! - [`protocol`] -- request encoding, field parsing, status lines and
//!   failure-code mapping (pure, no I/O)
//! - [`descriptor`] -- `const` descriptions of commands and lists
//! - [`buffer`] -- bounded response buffer
//! - [`evaluator`] -- decides when a single-shot reply is complete
//! - [`engine`] -- `run` / `get` / `set` with timeouts and retries
//! - [`accumulator`] -- reassembles streamed list replies
//! - [`channel`] -- shared, serialised access to one device
//! - [`registry`] -- per-instance driver slots
//!
//! # Example
//!
//! ```
//! use provideo_protocol::{CommandDescriptor, protocol::{encode_request, FieldKind}};
//! use provideo_protocol::evaluator::{evaluate_value, Evaluation};
//!
//! const GAIN_RED: CommandDescriptor = CommandDescriptor::new("gain_red", "gain_red ", 1);
//!
//! assert_eq!(encode_request(GAIN_RED.command, &[], &[], FieldKind::Decimal), b"gain_red\n");
//!
//! if let Evaluation::Complete(values) = evaluate_value(b"gain_red 512\nOK\n", &GAIN_RED, -5) {
//!     assert_eq!(values, vec![512]);
//! }
//! ```

pub mod accumulator;
pub mod buffer;
pub mod channel;
pub mod descriptor;
pub mod engine;
pub mod evaluator;
pub mod protocol;
pub mod registry;

pub use accumulator::{Accumulator, ListState, Record};
pub use buffer::ResponseBuffer;
pub use channel::{Channel, narrow};
pub use descriptor::{CommandDescriptor, ListDescriptor, Termination};
pub use engine::EngineConfig;
pub use evaluator::Evaluation;
pub use protocol::FieldKind;
pub use registry::DriverSlot;
