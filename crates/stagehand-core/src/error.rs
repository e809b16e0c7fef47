//! Error types for stagehand core.

use std::path::PathBuf;

use stagehand_registers::RegisterError;
use thiserror::Error;

/// Core error type for device, signal, and LED operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Register addressing, decoding, or I/O failure.
    #[error(transparent)]
    Register(#[from] RegisterError),

    /// Invalid device or signal configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Refusal to provision over the live hardware register tree.
    #[error("refusing to provision the live register tree at {}", .0.display())]
    ProtectedRoot(PathBuf),
}

/// Result type alias for stagehand core operations.
pub type Result<T> = std::result::Result<T, Error>;
