//! Error types for provideo.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Argument, device-protocol, transport,
//! capacity, and resource errors are all captured here.
//!
//! Callers that work with integer status codes (a GUI binding layer, a test
//! harness driving the library from another language) use
//! [`Error::errno`] or [`status`], which map every variant onto a negative
//! POSIX error number.

/// POSIX error numbers used by the status-code surface.
///
/// Only the values the library can actually produce are listed. The
/// numbers match Linux.
pub mod errno {
    pub const ENOENT: i32 = 2;
    pub const EIO: i32 = 5;
    pub const ENOMEM: i32 = 12;
    pub const EFAULT: i32 = 14;
    pub const EBUSY: i32 = 16;
    pub const ENODEV: i32 = 19;
    pub const EINVAL: i32 = 22;
    pub const EPIPE: i32 = 32;
    pub const ERANGE: i32 = 34;
    pub const EPROTO: i32 = 71;
    pub const EILSEQ: i32 = 84;
    pub const EOPNOTSUPP: i32 = 95;
    pub const ENOTCONN: i32 = 107;
    pub const ETIMEDOUT: i32 = 110;
}

/// The error type for all provideo operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied argument was rejected before any I/O happened
    /// (wrong field count, value out of range, bad file size).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A required resource (e.g. an FPNC data file) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The device reply could not be parsed: short field count, bad
    /// number, out-of-order list record, or a value outside its type.
    #[error("malformed device reply: {0}")]
    Malformed(String),

    /// A response buffer or record set exceeded its fixed capacity.
    #[error("capacity exceeded: {0}")]
    Overflow(String),

    /// A list response ended with the success token but the record set
    /// does not match what the command declares.
    #[error("ambiguous termination: {0}")]
    AmbiguousTermination(String),

    /// The device answered `FAILED`. `code` is the negative error number
    /// derived from the failure text.
    #[error("device reported failure ({code}): {reason}")]
    Device {
        /// Negative POSIX error number.
        code: i32,
        /// The failure text following the `FAILED` token.
        reason: String,
    },

    /// Timed out waiting for a complete response from the device.
    ///
    /// This typically indicates the device is powered off, the baud rate
    /// is wrong, or the command is not understood by the firmware.
    #[error("timeout waiting for response")]
    Timeout,

    /// A transport-level error (serial port open, read or write failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// A framing error below the command language (e.g. a mock transport
    /// saw bytes it did not expect).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The requested operation is not supported by this device family.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// No driver table is registered for the named command domain.
    #[error("no driver registered for {0}")]
    NoDriver(&'static str),

    /// No connection to the device has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the device was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Negative POSIX error number for this error.
    pub fn errno(&self) -> i32 {
        let code = match self {
            Error::InvalidArgument(_) => errno::EINVAL,
            Error::NotFound(_) => errno::ENOENT,
            Error::Malformed(_) => errno::EFAULT,
            Error::Overflow(_) => errno::ENOMEM,
            Error::AmbiguousTermination(_) => errno::EILSEQ,
            Error::Device { code, .. } => return *code,
            Error::Timeout => errno::ETIMEDOUT,
            Error::Transport(_) => errno::EIO,
            Error::Protocol(_) => errno::EPROTO,
            Error::Unsupported(_) => errno::EOPNOTSUPP,
            Error::NoDriver(_) => errno::ENODEV,
            Error::NotConnected => errno::ENOTCONN,
            Error::ConnectionLost => errno::EPIPE,
            Error::Io(e) => e.raw_os_error().unwrap_or(errno::EIO),
        };
        -code
    }

    /// Whether the parameter engine may retry a request that failed with
    /// this error.
    ///
    /// Only timing and channel failures qualify. Argument, protocol,
    /// capacity and device-reported errors are surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout | Error::Transport(_) | Error::Io(_))
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Collapse a result into an integer status: `0` on success, otherwise
/// the negative error number.
pub fn status<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(e) => e.errno(),
    }
}
