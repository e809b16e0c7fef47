//! The Stage 16 device aggregate.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use stagehand_registers::{
    MAX_CHANNELS, ReadPolicy, RegisterError, RegisterIo, SYSFS_REGISTER_ROOT, SysfsIo,
};

use crate::error::{Error, Result};
use crate::led::Leds;
use crate::signal::{Signal, mic_inputs};

/// Number of mic inputs on the Stage 16.
pub const NUM_MIC_INPUTS: u16 = 16;

/// Device construction parameters.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Root of the register tree; point at a scratch directory for tests
    /// and provisioning.
    pub register_root: PathBuf,
    /// Number of mic inputs to expose.
    pub num_mic_inputs: u16,
    /// Whether every register performs its first read at construction.
    pub read_policy: ReadPolicy,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            register_root: PathBuf::from(SYSFS_REGISTER_ROOT),
            num_mic_inputs: NUM_MIC_INPUTS,
            read_policy: ReadPolicy::Eager,
        }
    }
}

impl DeviceConfig {
    fn validate(&self) -> Result<()> {
        if self.register_root.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("register root is empty".to_string()));
        }
        if self.num_mic_inputs == 0 {
            return Err(Error::InvalidConfig("device has zero mic inputs".to_string()));
        }
        if self.num_mic_inputs > MAX_CHANNELS {
            return Err(RegisterError::OutOfRange {
                what: "mic input count",
                value: u32::from(self.num_mic_inputs),
                min: 1,
                max: u32::from(MAX_CHANNELS),
            }
            .into());
        }
        Ok(())
    }
}

/// A Stage 16 stage box: 16 mic inputs and 3 front-panel LEDs.
///
/// Built once at startup and passed to whatever consumes it; there is no
/// process-wide device singleton. The channel set is immutable after
/// construction.
#[derive(Debug)]
pub struct Stage16 {
    config: DeviceConfig,
    leds: Leds,
    inputs: Vec<Signal>,
}

impl Stage16 {
    /// Build the device against the production sysfs transport.
    ///
    /// # Errors
    ///
    /// Configuration validation errors, and any eager-read failure.
    pub fn new(config: DeviceConfig) -> Result<Self> {
        Self::with_io(config, Arc::new(SysfsIo))
    }

    /// Build the device with an explicit register transport.
    ///
    /// # Errors
    ///
    /// Configuration validation errors, and any eager-read failure.
    pub fn with_io(config: DeviceConfig, io: Arc<dyn RegisterIo>) -> Result<Self> {
        config.validate()?;
        let leds = Leds::with_io(&config.register_root, config.read_policy, Arc::clone(&io))?;
        let inputs =
            mic_inputs(config.num_mic_inputs, &config.register_root, config.read_policy, &io)?;
        info!(
            inputs = inputs.len(),
            root = %config.register_root.display(),
            "device constructed"
        );
        Ok(Self { config, leds, inputs })
    }

    #[must_use]
    pub fn num_mic_inputs(&self) -> u16 {
        self.config.num_mic_inputs
    }

    #[must_use]
    pub fn register_root(&self) -> &Path {
        &self.config.register_root
    }

    /// The signal for the given 1-based mic input number.
    ///
    /// # Errors
    ///
    /// `OutOfRange` for a channel outside the device's input set.
    pub fn mic_input(&mut self, channel: u16) -> Result<&mut Signal> {
        if channel < 1 || channel > self.config.num_mic_inputs {
            return Err(RegisterError::OutOfRange {
                what: "channel",
                value: u32::from(channel),
                min: 1,
                max: u32::from(self.config.num_mic_inputs),
            }
            .into());
        }
        self.inputs.get_mut(usize::from(channel - 1)).ok_or_else(|| {
            Error::InvalidConfig(format!("mic input {channel} missing from device"))
        })
    }

    /// All mic inputs in channel order.
    pub fn mic_inputs(&mut self) -> impl Iterator<Item = &mut Signal> {
        self.inputs.iter_mut()
    }

    pub fn leds(&mut self) -> &mut Leds {
        &mut self.leds
    }

    /// Reset every register to its power-on default through the verify
    /// protocol.
    ///
    /// # Errors
    ///
    /// The first write or verification error encountered.
    pub fn initialize(&mut self) -> Result<()> {
        self.leds.initialize()?;
        for signal in &mut self.inputs {
            signal.initialize()?;
        }
        Ok(())
    }
}
