//! Pure mapping from logical signals to register file paths.
//!
//! The mic inputs are spread across four SPI bus devices in groups of four.
//! The group wiring is not monotonic in channel order: inputs 5-8 land on
//! the bus device ordered before the one serving inputs 1-4, and the same
//! holds for the ADC phantom files. The tables below reproduce the physical
//! wiring exactly.

use std::fmt;
use std::path::PathBuf;

use crate::error::{RegisterError, Result};

/// Root of the kernel register tree on real hardware.
pub const SYSFS_REGISTER_ROOT: &str = "/sys/bus/spi/devices";

/// Highest mic-input channel the addressing tables cover.
pub const MAX_CHANNELS: u16 = 16;

/// The closed set of register families on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterKind {
    /// Front-panel power LED (tri-state).
    PowerLed,
    /// Front-panel status LED (tri-state).
    StatusLed,
    /// Front-panel mute LED (two-state).
    MuteLed,
    /// Per-channel preamp gain.
    Gain,
    /// Per-channel -20 dB pad.
    Pad,
    /// Phantom power, one shared register per group of four channels.
    Phantom,
}

impl RegisterKind {
    /// Short name used in error messages and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PowerLed => "power LED",
            Self::StatusLed => "status LED",
            Self::MuteLed => "mute LED",
            Self::Gain => "gain",
            Self::Pad => "pad",
            Self::Phantom => "phantom",
        }
    }

    /// Value the register holds after hardware power-on.
    ///
    /// Gain registers sit at the raw minimum (10 dB); everything else is off.
    #[must_use]
    pub fn power_on_default(self) -> u8 {
        match self {
            Self::Gain => 1,
            _ => 0,
        }
    }

    /// Path of the register serving this kind for `channel`, relative to
    /// the register root.
    ///
    /// The LED registers are fixed to one path each and ignore the channel.
    /// Note the power LED lives behind `status_led_1_en` and the status LED
    /// behind `status_led_0_en`; that is how the panel is wired.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if a per-channel kind is addressed outside 1..=16.
    pub fn relative_path(self, channel: u16) -> Result<PathBuf> {
        let path = match self {
            Self::PowerLed => PathBuf::from("spi4.0/status_led_1_en"),
            Self::StatusLed => PathBuf::from("spi4.0/status_led_0_en"),
            Self::MuteLed => PathBuf::from("spi4.0/mute_led_en"),
            Self::Gain => {
                input_device(channel)?.join(format!("ch{}_preamp_gain", local_channel(channel)))
            }
            Self::Pad => input_device(channel)?.join(format!("ch{}_pad_en", local_channel(channel))),
            Self::Phantom => PathBuf::from("spi4.0").join(phantom_file(channel)?),
        };
        Ok(path)
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn channel_out_of_range(channel: u16) -> RegisterError {
    RegisterError::OutOfRange {
        what: "channel",
        value: u32::from(channel),
        min: 1,
        max: u32::from(MAX_CHANNELS),
    }
}

/// SPI bus device directory serving `channel`'s gain and pad registers.
///
/// Group 5-8 sits on `spi1.0`, before the `spi1.1` device serving group
/// 1-4; the 9-12 and 13-16 groups are swapped the same way.
fn input_device(channel: u16) -> Result<PathBuf> {
    let dir = match channel {
        1..=4 => "spi1.1",
        5..=8 => "spi1.0",
        9..=12 => "spi1.3",
        13..=16 => "spi1.2",
        _ => return Err(channel_out_of_range(channel)),
    };
    Ok(PathBuf::from(dir))
}

/// Shared ADC phantom-power file for `channel`'s group of four.
fn phantom_file(channel: u16) -> Result<&'static str> {
    match channel {
        1..=4 => Ok("adc1_phantom_en"),
        5..=8 => Ok("adc0_phantom_en"),
        9..=12 => Ok("adc3_phantom_en"),
        13..=16 => Ok("adc2_phantom_en"),
        _ => Err(channel_out_of_range(channel)),
    }
}

/// Zero-based index of `channel` within its SPI device directory.
///
/// Only meaningful for a channel the group tables accept.
fn local_channel(channel: u16) -> u16 {
    (channel - 1) % 4
}
