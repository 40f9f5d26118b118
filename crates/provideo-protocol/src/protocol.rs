//! Wire-level encode/decode for the ProVideo command language.
//!
//! The device speaks newline-terminated ASCII. A request is the command
//! name followed by space-separated arguments:
//!
//! ```text
//! gain_red 512\n
//! fpnc_data 0 17 4\n
//! ```
//!
//! A reply is one or more lines. Value lines start with a synchronisation
//! marker (usually the command name and a space) followed by the values;
//! list replies repeat a record marker once per line. Every reply ends with
//! a status line, either the success token or the failure token followed by
//! a reason:
//!
//! ```text
//! gain_red 512\n
//! OK\n
//!
//! FAILED invalid range\n
//! ```
//!
//! Everything here works on raw bytes and performs no I/O. Offsets returned
//! by these functions index into the caller's buffer.

use bytes::{BufMut, BytesMut};

use provideo_core::error::errno;

/// Line terminator of requests and replies.
pub const LINE_END: u8 = b'\n';

/// Status line reported on success.
pub const OK_TOKEN: &[u8] = b"OK";

/// Prefix of the status line reported on failure.
pub const FAILED_TOKEN: &[u8] = b"FAILED";

/// How the values of a command are written on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldKind {
    /// Signed base-10 integers.
    #[default]
    Decimal,
    /// Unsigned 32-bit values in hex. Parsed with or without a `0x`
    /// prefix, rendered as `0x%08x`.
    Hex,
}

/// Render one value in the given field format.
pub fn format_field(value: i64, kind: FieldKind) -> String {
    match kind {
        FieldKind::Decimal => value.to_string(),
        FieldKind::Hex => format!("0x{value:08x}"),
    }
}

/// Parse one whitespace-free token in the given field format.
pub fn parse_field(token: &[u8], kind: FieldKind) -> Option<i64> {
    let s = std::str::from_utf8(token).ok()?;
    match kind {
        FieldKind::Decimal => s.parse::<i64>().ok(),
        FieldKind::Hex => {
            let digits = s
                .strip_prefix("0x")
                .or_else(|| s.strip_prefix("0X"))
                .unwrap_or(s);
            let value = u32::from_str_radix(digits, 16).ok()?;
            Some(i64::from(value))
        }
    }
}

/// Encode a request line.
///
/// `address` arguments (page, column, table index, ...) are always
/// rendered in decimal; `values` use the command's field format.
///
/// # Example
///
/// ```
/// use provideo_protocol::protocol::{encode_request, FieldKind};
///
/// assert_eq!(encode_request("gain_red", &[], &[], FieldKind::Decimal), b"gain_red\n");
/// assert_eq!(encode_request("gain_red", &[], &[512], FieldKind::Decimal), b"gain_red 512\n");
/// assert_eq!(
///     encode_request("fpnc_data", &[0, 3, 4], &[], FieldKind::Hex),
///     b"fpnc_data 0 3 4\n"
/// );
/// ```
pub fn encode_request(command: &str, address: &[i64], values: &[i64], kind: FieldKind) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(command.len() + 12 * (address.len() + values.len()) + 1);
    buf.put_slice(command.as_bytes());
    for arg in address {
        buf.put_u8(b' ');
        buf.put_slice(arg.to_string().as_bytes());
    }
    for value in values {
        buf.put_u8(b' ');
        buf.put_slice(format_field(*value, kind).as_bytes());
    }
    buf.put_u8(LINE_END);
    buf.to_vec()
}

/// Result of scanning typed fields out of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    /// The fields that parsed, in order. May be shorter than requested.
    pub values: Vec<i64>,
    /// Offset just past the last parsed field.
    pub end: usize,
}

/// Scan up to `count` fields separated by blanks, stopping at the first
/// token that does not parse or at the end of the line.
///
/// Scanning never crosses a line terminator.
pub fn scan_fields(buf: &[u8], kind: FieldKind, count: usize) -> Scan {
    let mut values = Vec::with_capacity(count);
    let mut pos = 0;
    let mut end = 0;

    while values.len() < count {
        while pos < buf.len() && is_blank(buf[pos]) {
            pos += 1;
        }
        let start = pos;
        while pos < buf.len() && !is_blank(buf[pos]) && buf[pos] != LINE_END {
            pos += 1;
        }
        if start == pos {
            break;
        }
        match parse_field(&buf[start..pos], kind) {
            Some(v) => {
                values.push(v);
                end = pos;
            }
            None => break,
        }
    }

    Scan { values, end }
}

/// Blank characters between fields. A carriage return counts as blank so
/// `\r\n` line endings are accepted.
fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == b'\r'
}

/// Offset of the first byte at or after `from` that is not blank.
pub fn skip_blanks(buf: &[u8], from: usize) -> usize {
    let mut pos = from;
    while pos < buf.len() && is_blank(buf[pos]) {
        pos += 1;
    }
    pos
}

/// Find `marker` at the start of a line.
///
/// Returns the offset of the first occurrence that begins a line (offset
/// zero or directly after a line terminator).
pub fn find_marker(buf: &[u8], marker: &[u8]) -> Option<usize> {
    if marker.is_empty() || buf.len() < marker.len() {
        return None;
    }
    (0..=buf.len() - marker.len())
        .find(|&i| (i == 0 || buf[i - 1] == LINE_END) && buf[i..].starts_with(marker))
}

/// Offset of the line terminator at or after `from`, if the line is complete.
pub fn line_end(buf: &[u8], from: usize) -> Option<usize> {
    buf[from..]
        .iter()
        .position(|&b| b == LINE_END)
        .map(|p| from + p)
}

/// A terminal status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    /// The success token.
    Ok,
    /// The failure token with its (possibly empty) reason text.
    Failed(String),
}

/// Find the first complete status line.
///
/// Returns the offset where the line starts, the offset just past its
/// terminator, and the decoded status.
pub fn find_status(buf: &[u8]) -> Option<(usize, usize, StatusLine)> {
    let mut start = 0;
    while let Some(end) = line_end(buf, start) {
        let line = trim_line(&buf[start..end]);
        if line == OK_TOKEN {
            return Some((start, end + 1, StatusLine::Ok));
        }
        if let Some(rest) = line.strip_prefix(FAILED_TOKEN) {
            let reason = String::from_utf8_lossy(rest).trim().to_string();
            return Some((start, end + 1, StatusLine::Failed(reason)));
        }
        start = end + 1;
    }
    None
}

/// Strip surrounding blanks (including `\r`) from a line.
fn trim_line(line: &[u8]) -> &[u8] {
    let start = line.iter().position(|&b| !is_blank(b)).unwrap_or(line.len());
    let end = line
        .iter()
        .rposition(|&b| !is_blank(b))
        .map_or(start, |p| p + 1);
    &line[start..end]
}

/// Keywords recognised in failure text, checked in order.
const FAILURE_KEYWORDS: &[(&str, i32)] = &[
    ("invalid", errno::EINVAL),
    ("range", errno::ERANGE),
    ("busy", errno::EBUSY),
    ("unknown", errno::EOPNOTSUPP),
    ("unsupported", errno::EOPNOTSUPP),
    ("timeout", errno::ETIMEDOUT),
    ("memory", errno::ENOMEM),
];

/// Derive a negative error number from the text after the failure token.
///
/// A numeric token (`FAILED -22`, `FAILED 22`, `FAILED (22)`) wins;
/// otherwise the first known keyword applies; otherwise `default` is
/// returned unchanged.
///
/// ```
/// use provideo_protocol::protocol::failure_code;
///
/// assert_eq!(failure_code("-16", -5), -16);
/// assert_eq!(failure_code("invalid range", -5), -22);
/// assert_eq!(failure_code("", -5), -5);
/// ```
pub fn failure_code(reason: &str, default: i32) -> i32 {
    for token in reason.split_whitespace() {
        let token = token.trim_matches(|c: char| c == '(' || c == ')' || c == ':' || c == ',');
        if let Ok(n) = token.parse::<i32>() {
            if n != 0 {
                return -n.saturating_abs();
            }
        }
    }

    let lower = reason.to_ascii_lowercase();
    FAILURE_KEYWORDS
        .iter()
        .find(|(word, _)| lower.contains(word))
        .map_or(default, |(_, code)| -code)
}
