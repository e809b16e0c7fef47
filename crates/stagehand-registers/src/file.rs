//! Verified read/write access to a single register file.
//!
//! A register is a kernel-exposed file holding one control byte as ASCII
//! decimal digits plus a trailing newline. Every write is followed by a
//! mandatory read-after-write: the kernel accepting the write does not mean
//! the register took the value, since the firmware can clamp or discard it
//! without failing the call.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::addressing::RegisterKind;
use crate::error::{RegisterError, Result};

/// Raw byte transport for register files.
///
/// Production code goes through [`SysfsIo`]; tests inject doubles to
/// simulate firmware that rejects or clamps writes.
#[cfg_attr(test, mockall::automock)]
pub trait RegisterIo: Send + Sync {
    /// Read the full contents of the register file.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying storage call.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replace the contents of the register file.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying storage call.
    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;
}

/// Register transport backed by the kernel's register tree.
///
/// Each call opens, transfers, and closes the file; no handle is held
/// between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysfsIo;

impl RegisterIo for SysfsIo {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        fs::write(path, data)
    }
}

/// Whether a register performs its first read at construction time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadPolicy {
    /// Read the register as soon as it is constructed.
    #[default]
    Eager,
    /// Defer the first read until the first accessor call.
    ///
    /// Needed while the register tree is being provisioned and the files
    /// do not exist yet.
    Deferred,
}

/// Capabilities common to every register-backed value.
pub trait Register {
    /// Write the power-on default through the verify protocol.
    ///
    /// # Errors
    ///
    /// Any register write or verification error.
    fn initialize(&mut self) -> Result<()>;

    /// Human-readable register name.
    fn name(&self) -> &str;

    /// Absolute path of the backing register file.
    fn path(&self) -> &Path;

    /// Most recent raw bytes read from the register, if any read happened.
    fn raw(&self) -> Option<&[u8]>;
}

/// Exclusive owner of one on-disk register file.
///
/// Caches the most recent raw bytes and decoded value for introspection;
/// the caches only ever hold verified register contents.
pub struct RegisterFile {
    kind: RegisterKind,
    path: PathBuf,
    io: Arc<dyn RegisterIo>,
    raw: Option<Vec<u8>>,
    value: Option<u8>,
}

impl std::fmt::Debug for RegisterFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterFile")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("raw", &self.raw)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

impl RegisterFile {
    /// Open a register file against the production sysfs transport.
    ///
    /// # Errors
    ///
    /// With [`ReadPolicy::Eager`], any error from the initial read.
    pub fn new(kind: RegisterKind, path: PathBuf, policy: ReadPolicy) -> Result<Self> {
        Self::with_io(kind, path, policy, Arc::new(SysfsIo))
    }

    /// Open a register file with an explicit transport.
    ///
    /// # Errors
    ///
    /// With [`ReadPolicy::Eager`], any error from the initial read.
    pub fn with_io(
        kind: RegisterKind,
        path: PathBuf,
        policy: ReadPolicy,
        io: Arc<dyn RegisterIo>,
    ) -> Result<Self> {
        let mut file = Self { kind, path, io, raw: None, value: None };
        if policy == ReadPolicy::Eager {
            file.read()?;
        }
        Ok(file)
    }

    /// Read the current register value, updating the raw and value caches.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read; `MalformedRegister` if the contents
    /// are not 1-2 decimal digits followed by exactly one newline.
    pub fn read(&mut self) -> Result<u8> {
        let data = self
            .io
            .read(&self.path)
            .map_err(|source| RegisterError::Io { path: self.path.clone(), source })?;
        let value = parse_register(&self.path, &data)?;
        trace!(path = %self.path.display(), value, "register read");
        self.raw = Some(data);
        self.value = Some(value);
        Ok(value)
    }

    /// Write `value` and verify it by reading the register back.
    ///
    /// On verification failure the caches keep the previously verified
    /// contents, not the rejected value.
    ///
    /// # Errors
    ///
    /// `Io` on a failed write call, any read error from the verify read,
    /// and `VerificationFailed` if the register reads back a different
    /// value than was written.
    pub fn write(&mut self, value: u8) -> Result<()> {
        let data = format!("{value}\n");
        self.io
            .write(&self.path, data.as_bytes())
            .map_err(|source| RegisterError::Io { path: self.path.clone(), source })?;

        let prev_raw = self.raw.clone();
        let prev_value = self.value;
        match self.read() {
            Ok(read) if read == value => {
                debug!(path = %self.path.display(), value, "register written");
                Ok(())
            }
            Ok(read) => {
                self.raw = prev_raw;
                self.value = prev_value;
                Err(RegisterError::VerificationFailed { path: self.path.clone(), wrote: value, read })
            }
            Err(err) => {
                self.raw = prev_raw;
                self.value = prev_value;
                Err(err)
            }
        }
    }

    /// Undecoded register contents with the trailing newline stripped.
    ///
    /// Diagnostic passthrough for raw display modes; performs no content
    /// validation and leaves the caches untouched.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read.
    pub fn read_raw(&self) -> Result<String> {
        let data = self
            .io
            .read(&self.path)
            .map_err(|source| RegisterError::Io { path: self.path.clone(), source })?;
        let text = String::from_utf8_lossy(&data);
        Ok(text.split('\n').next().unwrap_or_default().to_string())
    }

    /// The register family this file belongs to.
    #[must_use]
    pub fn kind(&self) -> RegisterKind {
        self.kind
    }

    /// Most recent verified value, if any read has happened yet.
    #[must_use]
    pub fn value(&self) -> Option<u8> {
        self.value
    }
}

impl Register for RegisterFile {
    fn initialize(&mut self) -> Result<()> {
        self.write(self.kind.power_on_default())
    }

    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn raw(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }
}

/// Validate and decode raw register file contents.
///
/// The on-disk format is bit-exact: 1 or 2 ASCII decimal digits followed by
/// exactly one newline byte.
fn parse_register(path: &Path, data: &[u8]) -> Result<u8> {
    let malformed = |reason: String| RegisterError::MalformedRegister {
        path: path.to_path_buf(),
        reason,
    };

    let digits = match data {
        [digits @ .., b'\n'] => digits,
        _ => return Err(malformed(format!("missing trailing newline in {} bytes", data.len()))),
    };
    if digits.is_empty() || digits.len() > 2 {
        return Err(malformed(format!("expected 1 or 2 digits, got {}", digits.len())));
    }
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(malformed(format!(
            "non-numeric content {:?}",
            String::from_utf8_lossy(data)
        )));
    }

    let mut value: u8 = 0;
    for &digit in digits {
        value = value * 10 + (digit - b'0');
    }
    Ok(value)
}
