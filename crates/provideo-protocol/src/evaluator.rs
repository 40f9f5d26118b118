//! Response evaluation for single-shot commands.
//!
//! The evaluator looks at everything received so far for one exchange and
//! decides whether the reply is complete. It never consumes bytes; the
//! engine calls it again after every read until it reports something other
//! than [`Evaluation::Incomplete`].

use provideo_core::error::Error;

use crate::descriptor::CommandDescriptor;
use crate::protocol::{self, StatusLine};

/// Outcome of evaluating a partially or fully received reply.
#[derive(Debug)]
pub enum Evaluation<T> {
    /// More bytes are needed.
    Incomplete,
    /// The reply is complete and carried the expected result.
    Complete(T),
    /// The reply is complete and reports an error.
    Failed(Error),
}

impl<T> Evaluation<T> {
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Evaluation::Incomplete)
    }
}

/// Build the error for a `FAILED` status line.
pub fn device_failure(reason: String, default_code: i32) -> Error {
    let code = protocol::failure_code(&reason, default_code);
    Error::Device { code, reason }
}

/// Evaluate a reply that should carry a value line.
///
/// Completes once the status line has arrived. The value is the last line
/// starting with the descriptor's marker before that status line; earlier
/// marker lines are request echoes, which for addressed reads
/// (`lut_read_red 17`) look exactly like a value line. A `FAILED` line
/// reports the device failure; an `OK` without any value line is
/// malformed.
///
/// # Example
///
/// ```
/// use provideo_protocol::descriptor::CommandDescriptor;
/// use provideo_protocol::evaluator::{evaluate_value, Evaluation};
///
/// const GAIN_RED: CommandDescriptor = CommandDescriptor::new("gain_red", "gain_red ", 1);
///
/// match evaluate_value(b"gain_red 512\nOK\n", &GAIN_RED, -5) {
///     Evaluation::Complete(values) => assert_eq!(values, vec![512]),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub fn evaluate_value(
    buf: &[u8],
    desc: &CommandDescriptor,
    default_code: i32,
) -> Evaluation<Vec<i64>> {
    let Some((status_start, _, status)) = protocol::find_status(buf) else {
        return Evaluation::Incomplete;
    };
    if let StatusLine::Failed(reason) = status {
        return Evaluation::Failed(device_failure(reason, default_code));
    }

    let marker = desc.sync.as_bytes();
    let Some(line) = buf[..status_start]
        .rsplit(|&b| b == protocol::LINE_END)
        .find(|line| line.starts_with(marker))
    else {
        return Evaluation::Failed(Error::Malformed(format!(
            "{}: reply carried no value",
            desc.command
        )));
    };

    let fields = &line[marker.len()..];
    let scan = protocol::scan_fields(fields, desc.kind, desc.fields);
    if scan.values.len() != desc.fields {
        return Evaluation::Failed(Error::Malformed(format!(
            "{}: expected {} fields, got {} in {:?}",
            desc.command,
            desc.fields,
            scan.values.len(),
            String::from_utf8_lossy(fields).trim_end()
        )));
    }
    Evaluation::Complete(scan.values)
}

/// Evaluate a reply that only reports status (`set` and `run`).
///
/// Echo and value lines before the status line are ignored.
pub fn evaluate_status(buf: &[u8], default_code: i32) -> Evaluation<()> {
    match protocol::find_status(buf) {
        Some((_, _, StatusLine::Ok)) => Evaluation::Complete(()),
        Some((_, _, StatusLine::Failed(reason))) => {
            Evaluation::Failed(device_failure(reason, default_code))
        }
        None => Evaluation::Incomplete,
    }
}
