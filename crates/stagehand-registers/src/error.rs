//! Register layer error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for register addressing, decoding, and I/O.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// A channel, dB gain, or requested value outside its documented bounds.
    #[error("{what} {value} outside supported range {min}..={max}")]
    OutOfRange { what: &'static str, value: u32, min: u32, max: u32 },

    /// Register contents that are not 1-2 decimal digits plus a trailing newline.
    #[error("malformed register data in {}: {reason}", .path.display())]
    MalformedRegister { path: PathBuf, reason: String },

    /// A well-formed register byte that no documented value maps to.
    #[error("unsupported {what} register value {value}")]
    UnsupportedValue { what: &'static str, value: u8 },

    /// An LED state or register byte missing from the LED's state table.
    #[error("unrecognized {led} LED state {state}")]
    UnrecognizedState { led: String, state: String },

    /// The write call succeeded but the register read back a different value.
    #[error("write verification failed for {}: wrote {wrote}, read back {read}", .path.display())]
    VerificationFailed { path: PathBuf, wrote: u8, read: u8 },

    /// The underlying file read or write failed.
    #[error("register I/O failed for {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Result type for register operations.
pub type Result<T> = std::result::Result<T, RegisterError>;
