//! Mic-input signals and their typed register accessors.
//!
//! A signal is controlled through the kernel interface of the SPI device
//! tree. The current state can be read from the file representing the
//! register, and changed by writing to the same file; every accessor here
//! is one register round trip combined with the relevant codec.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use stagehand_registers::codec;
use stagehand_registers::{
    ReadPolicy, Register, RegisterError, RegisterFile, RegisterIo, RegisterKind, SysfsIo,
};

use crate::error::{Error, Result};

/// Physical connector of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connector {
    Xlr,
    Jack,
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Xlr => "XLR",
            Self::Jack => "jack",
        })
    }
}

/// Signal transport format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Analog,
    Aes,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Analog => "analog",
            Self::Aes => "AES",
        })
    }
}

/// Nominal signal level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Mic,
    Line,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mic => "mic",
            Self::Line => "line",
        })
    }
}

/// Signal direction relative to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

/// Configuration for one register-backed signal.
#[derive(Debug, Clone)]
pub struct SignalConfig {
    /// Display name (e.g. "Mic input #7").
    pub name: String,
    /// 1-based channel number.
    pub channel: u16,
    /// Highest channel number on the device; bounds the channel check.
    pub max_channels: u16,
    pub direction: Direction,
    pub connector: Connector,
    pub format: Format,
    pub level: Level,
    /// Root of the register tree.
    pub register_root: PathBuf,
    /// Whether the registers read eagerly at construction.
    pub read_policy: ReadPolicy,
}

impl SignalConfig {
    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidConfig("signal name is empty".to_string()));
        }
        if self.max_channels == 0 {
            return Err(Error::InvalidConfig("max_channels is zero".to_string()));
        }
        if self.channel < 1 || self.channel > self.max_channels {
            return Err(RegisterError::OutOfRange {
                what: "channel",
                value: u32::from(self.channel),
                min: 1,
                max: u32::from(self.max_channels),
            }
            .into());
        }
        Ok(())
    }
}

/// A mic-input signal: one register each for gain, pad, and phantom power.
///
/// All three registers address the same physical channel. The phantom
/// register is shared with the other three channels of the signal's ADC
/// group; this signal only ever touches its own bit.
#[derive(Debug)]
pub struct Signal {
    name: String,
    channel: u16,
    direction: Direction,
    connector: Connector,
    format: Format,
    level: Level,
    gain: RegisterFile,
    pad: RegisterFile,
    phantom: RegisterFile,
}

impl Signal {
    /// Build a signal against the production sysfs transport.
    ///
    /// # Errors
    ///
    /// Configuration validation errors, and any eager-read failure.
    pub fn new(config: SignalConfig) -> Result<Self> {
        Self::with_io(config, Arc::new(SysfsIo))
    }

    /// Build a signal with an explicit register transport.
    ///
    /// # Errors
    ///
    /// Configuration validation errors, and any eager-read failure.
    pub fn with_io(config: SignalConfig, io: Arc<dyn RegisterIo>) -> Result<Self> {
        config.validate()?;

        let register = |kind: RegisterKind| -> Result<RegisterFile> {
            let path = config.register_root.join(kind.relative_path(config.channel)?);
            Ok(RegisterFile::with_io(kind, path, config.read_policy, Arc::clone(&io))?)
        };
        let gain = register(RegisterKind::Gain)?;
        let pad = register(RegisterKind::Pad)?;
        let phantom = register(RegisterKind::Phantom)?;

        debug!(name = %config.name, channel = config.channel, "signal constructed");
        Ok(Self {
            name: config.name,
            channel: config.channel,
            direction: config.direction,
            connector: config.connector,
            format: config.format,
            level: config.level,
            gain,
            pad,
            phantom,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn channel(&self) -> u16 {
        self.channel
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn connector(&self) -> Connector {
        self.connector
    }

    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Current preamp gain in dB.
    ///
    /// # Errors
    ///
    /// Read errors, and `UnsupportedValue` for a raw value outside 1..=51.
    pub fn gain(&mut self) -> Result<u8> {
        let raw = self.gain.read()?;
        Ok(codec::gain_db_from_raw(raw)?)
    }

    /// Set the preamp gain in dB (10..=60).
    ///
    /// # Errors
    ///
    /// `OutOfRange` before any write for an unsupported dB value; write and
    /// verification errors otherwise.
    pub fn set_gain(&mut self, db: u8) -> Result<()> {
        let raw = codec::gain_raw_from_db(db)?;
        Ok(self.gain.write(raw)?)
    }

    /// Whether the -20 dB pad is enabled.
    ///
    /// # Errors
    ///
    /// Read errors, and `UnsupportedValue` for a raw value other than 0/1.
    pub fn pad(&mut self) -> Result<bool> {
        let raw = self.pad.read()?;
        Ok(codec::pad_from_raw(raw)?)
    }

    /// Enable or disable the -20 dB pad.
    ///
    /// # Errors
    ///
    /// Write and verification errors.
    pub fn set_pad(&mut self, enabled: bool) -> Result<()> {
        Ok(self.pad.write(codec::pad_to_raw(enabled))?)
    }

    /// Whether -48 V phantom power is enabled for this channel.
    ///
    /// # Errors
    ///
    /// Read errors, and `UnsupportedValue` for a shared byte above the
    /// 4-bit maximum.
    pub fn phantom(&mut self) -> Result<bool> {
        let raw = self.phantom.read()?;
        Ok(codec::phantom_from_raw(raw, self.channel)?)
    }

    /// Enable or disable phantom power for this channel only.
    ///
    /// Read-modify-write of one bit in the register shared by the four
    /// channels of this ADC group. Not atomic across processes; concurrent
    /// writers to the same group must be serialized by the caller.
    ///
    /// # Errors
    ///
    /// Read, write, and verification errors on the shared register.
    pub fn set_phantom(&mut self, enabled: bool) -> Result<()> {
        let raw = self.phantom.read()?;
        let next = codec::phantom_apply(raw, self.channel, enabled)?;
        Ok(self.phantom.write(next)?)
    }

    /// Undecoded gain register contents, for raw display modes.
    ///
    /// # Errors
    ///
    /// `Io` if the register cannot be read.
    pub fn raw_gain(&self) -> Result<String> {
        Ok(self.gain.read_raw()?)
    }

    /// Undecoded pad register contents.
    ///
    /// # Errors
    ///
    /// `Io` if the register cannot be read.
    pub fn raw_pad(&self) -> Result<String> {
        Ok(self.pad.read_raw()?)
    }

    /// Undecoded shared phantom register contents.
    ///
    /// # Errors
    ///
    /// `Io` if the register cannot be read.
    pub fn raw_phantom(&self) -> Result<String> {
        Ok(self.phantom.read_raw()?)
    }

    /// Reset this signal to power-on defaults: minimum gain, pad off,
    /// phantom off.
    ///
    /// # Errors
    ///
    /// Write and verification errors.
    pub fn initialize(&mut self) -> Result<()> {
        self.gain.initialize()?;
        self.pad.initialize()?;
        // Clear only this channel's phantom bit; the register is shared
        // with the rest of the ADC group.
        self.set_phantom(false)
    }
}

/// Build the full set of mic-input signals for a device.
///
/// Inputs count from 1, i.e. 1-16, not 0-15.
///
/// # Errors
///
/// `InvalidConfig` for a zero input count; construction errors per signal.
pub fn mic_inputs(
    num_inputs: u16,
    register_root: &Path,
    read_policy: ReadPolicy,
    io: &Arc<dyn RegisterIo>,
) -> Result<Vec<Signal>> {
    if num_inputs == 0 {
        return Err(Error::InvalidConfig("device has zero mic inputs".to_string()));
    }

    let mut signals = Vec::with_capacity(usize::from(num_inputs));
    for channel in 1..=num_inputs {
        let signal = Signal::with_io(
            SignalConfig {
                name: format!("Mic input #{channel}"),
                channel,
                max_channels: num_inputs,
                direction: Direction::Input,
                connector: Connector::Xlr,
                format: Format::Analog,
                level: Level::Mic,
                register_root: register_root.to_path_buf(),
                read_policy,
            },
            Arc::clone(io),
        )?;
        signals.push(signal);
    }
    Ok(signals)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use assert_matches::assert_matches;
    use tempfile::TempDir;

    use crate::provision;

    use super::*;

    fn seeded_signal(channel: u16) -> (TempDir, Signal) {
        let dir = TempDir::new().unwrap();
        provision::seed(dir.path(), 16).unwrap();
        let signal = Signal::new(test_config(channel, dir.path())).unwrap();
        (dir, signal)
    }

    fn test_config(channel: u16, root: &Path) -> SignalConfig {
        SignalConfig {
            name: format!("Mic input #{channel}"),
            channel,
            max_channels: 16,
            direction: Direction::Input,
            connector: Connector::Xlr,
            format: Format::Analog,
            level: Level::Mic,
            register_root: root.to_path_buf(),
            read_policy: ReadPolicy::Eager,
        }
    }

    #[test]
    fn test_gain_reads_power_on_minimum() {
        let (_dir, mut signal) = seeded_signal(1);
        assert_eq!(signal.gain().unwrap(), 10);
    }

    #[test]
    fn test_set_gain_round_trips_and_writes_raw_value() {
        let (_dir, mut signal) = seeded_signal(3);
        signal.set_gain(23).unwrap();
        assert_eq!(signal.gain().unwrap(), 23);
        // 23 dB is raw 14.
        assert_eq!(signal.raw_gain().unwrap(), "14");
    }

    #[test]
    fn test_set_gain_rejects_out_of_range_without_writing() {
        let (_dir, mut signal) = seeded_signal(2);
        assert_matches!(signal.set_gain(9), Err(Error::Register(RegisterError::OutOfRange { .. })));
        assert_matches!(
            signal.set_gain(61),
            Err(Error::Register(RegisterError::OutOfRange { .. }))
        );
        assert_eq!(signal.raw_gain().unwrap(), "1");
    }

    #[test]
    fn test_gain_rejects_unsupported_register_value() {
        let (dir, mut signal) = seeded_signal(1);
        fs::write(dir.path().join("spi1.1/ch0_preamp_gain"), b"99\n").unwrap();
        assert_matches!(
            signal.gain(),
            Err(Error::Register(RegisterError::UnsupportedValue { what: "gain", value: 99 }))
        );
    }

    #[test]
    fn test_pad_round_trip() {
        let (_dir, mut signal) = seeded_signal(7);
        assert!(!signal.pad().unwrap());
        signal.set_pad(true).unwrap();
        assert!(signal.pad().unwrap());
        assert_eq!(signal.raw_pad().unwrap(), "1");
        signal.set_pad(false).unwrap();
        assert!(!signal.pad().unwrap());
    }

    #[test]
    fn test_phantom_round_trip_for_every_channel() {
        let dir = TempDir::new().unwrap();
        provision::seed(dir.path(), 16).unwrap();
        for channel in 1..=16 {
            let mut signal = Signal::new(test_config(channel, dir.path())).unwrap();
            signal.set_phantom(true).unwrap();
            assert!(signal.phantom().unwrap(), "channel {channel} should report phantom on");
            signal.set_phantom(false).unwrap();
            assert!(!signal.phantom().unwrap(), "channel {channel} should report phantom off");
        }
    }

    #[test]
    fn test_set_phantom_leaves_group_neighbors_alone() {
        let dir = TempDir::new().unwrap();
        provision::seed(dir.path(), 16).unwrap();
        // All four bits of the shared group register set.
        fs::write(dir.path().join("spi4.0/adc1_phantom_en"), b"15\n").unwrap();

        let mut second = Signal::new(test_config(2, dir.path())).unwrap();
        second.set_phantom(false).unwrap();

        // Exactly channel 2's bit (0b0100) cleared.
        assert_eq!(second.raw_phantom().unwrap(), "11");
        let mut first = Signal::new(test_config(1, dir.path())).unwrap();
        assert!(first.phantom().unwrap());
        let mut fourth = Signal::new(test_config(4, dir.path())).unwrap();
        assert!(fourth.phantom().unwrap());
    }

    #[test]
    fn test_construction_validates_channel_bounds() {
        let dir = TempDir::new().unwrap();
        assert_matches!(
            Signal::new(test_config(0, dir.path())),
            Err(Error::Register(RegisterError::OutOfRange { what: "channel", value: 0, .. }))
        );
        assert_matches!(
            Signal::new(test_config(17, dir.path())),
            Err(Error::Register(RegisterError::OutOfRange { what: "channel", value: 17, .. }))
        );
    }

    #[test]
    fn test_construction_validates_config_fields() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(1, dir.path());
        config.name = String::new();
        assert_matches!(Signal::new(config), Err(Error::InvalidConfig(_)));

        let mut config = test_config(1, dir.path());
        config.max_channels = 0;
        assert_matches!(Signal::new(config), Err(Error::InvalidConfig(_)));
    }

    #[test]
    fn test_deferred_construction_skips_missing_tree() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(5, dir.path());
        config.read_policy = ReadPolicy::Deferred;
        let mut signal = Signal::with_io(config, Arc::new(SysfsIo)).unwrap();
        assert_matches!(signal.gain(), Err(Error::Register(RegisterError::Io { .. })));
    }

    #[test]
    fn test_initialize_resets_to_power_on_defaults() {
        let (_dir, mut signal) = seeded_signal(9);
        signal.set_gain(42).unwrap();
        signal.set_pad(true).unwrap();
        signal.set_phantom(true).unwrap();

        signal.initialize().unwrap();
        assert_eq!(signal.gain().unwrap(), 10);
        assert!(!signal.pad().unwrap());
        assert!(!signal.phantom().unwrap());
    }

    #[test]
    fn test_mic_inputs_builds_full_set() {
        let dir = TempDir::new().unwrap();
        provision::seed(dir.path(), 16).unwrap();
        let io: Arc<dyn RegisterIo> = Arc::new(SysfsIo);
        let signals = mic_inputs(16, dir.path(), ReadPolicy::Eager, &io).unwrap();
        assert_eq!(signals.len(), 16);
        assert_eq!(signals[0].name(), "Mic input #1");
        assert_eq!(signals[15].channel(), 16);
    }

    #[test]
    fn test_mic_inputs_rejects_zero_count() {
        let dir = TempDir::new().unwrap();
        let io: Arc<dyn RegisterIo> = Arc::new(SysfsIo);
        assert_matches!(
            mic_inputs(0, dir.path(), ReadPolicy::Deferred, &io),
            Err(Error::InvalidConfig(_))
        );
    }
}
