//! Stagehand registers - the hardware register abstraction layer.
//!
//! Maps semantically named signals (e.g. mic input #7 phantom power) to
//! register files under the kernel's SPI device tree, encodes and decodes
//! the single-byte register values, and enforces a write-then-verify
//! protocol that surfaces register writes the hardware silently rejected.

pub mod addressing;
pub mod codec;
pub mod error;
pub mod file;

pub use addressing::{MAX_CHANNELS, RegisterKind, SYSFS_REGISTER_ROOT};
pub use error::{RegisterError, Result};
pub use file::{ReadPolicy, Register, RegisterFile, RegisterIo, SysfsIo};
