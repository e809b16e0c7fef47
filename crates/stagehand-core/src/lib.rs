//! Stagehand core - device, signal, and LED domain objects.
//!
//! Composes the register layer into typed domain objects: per-channel
//! mic-input signals, the front-panel LEDs, and the Stage 16 device
//! aggregate that owns them.

pub mod device;
pub mod error;
pub mod led;
pub mod provision;
pub mod signal;

pub use device::{DeviceConfig, NUM_MIC_INPUTS, Stage16};
pub use error::{Error, Result};
pub use led::{Led, LedState, Leds};
pub use signal::{Connector, Direction, Format, Level, Signal, SignalConfig};
