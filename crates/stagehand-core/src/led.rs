//! Front-panel LED control.
//!
//! Each LED is backed by one register file and a small table mapping its
//! states to the raw byte that specific register accepts. The Power and
//! Status LEDs are tri-state; the Mute LED has no Alert state.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use stagehand_registers::error::Result as RegisterResult;
use stagehand_registers::{
    ReadPolicy, Register, RegisterError, RegisterFile, RegisterIo, RegisterKind, SysfsIo,
};

use crate::error::Result;

/// Front-panel LED states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedState {
    Off,
    Alert,
    On,
}

impl fmt::Display for LedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "Off",
            Self::Alert => "Alert",
            Self::On => "On",
        })
    }
}

/// State table for the tri-state LEDs.
const TRI_STATE: &[(LedState, u8)] =
    &[(LedState::Off, 0), (LedState::Alert, 1), (LedState::On, 2)];

/// State table for the Mute LED, which has no Alert state.
const MUTE_STATE: &[(LedState, u8)] = &[(LedState::Off, 0), (LedState::On, 1)];

/// One front-panel LED.
#[derive(Debug)]
pub struct Led {
    name: &'static str,
    register: RegisterFile,
    states: &'static [(LedState, u8)],
}

impl Led {
    fn with_io(
        name: &'static str,
        kind: RegisterKind,
        states: &'static [(LedState, u8)],
        register_root: &Path,
        read_policy: ReadPolicy,
        io: Arc<dyn RegisterIo>,
    ) -> Result<Self> {
        // LED registers are fixed; the channel argument is ignored for them.
        let path = register_root.join(kind.relative_path(0)?);
        let register = RegisterFile::with_io(kind, path, read_policy, io)?;
        debug!(name, "LED constructed");
        Ok(Self { name, register, states })
    }

    /// The active state of the LED.
    ///
    /// # Errors
    ///
    /// Read errors, and `UnrecognizedState` for a register byte missing
    /// from this LED's state table.
    pub fn state(&mut self) -> Result<LedState> {
        let value = self.register.read()?;
        self.states
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(s, _)| *s)
            .ok_or_else(|| {
                RegisterError::UnrecognizedState {
                    led: self.name.to_string(),
                    state: value.to_string(),
                }
                .into()
            })
    }

    /// Change the state of the LED.
    ///
    /// # Errors
    ///
    /// `UnrecognizedState` for a state this LED does not support (Alert on
    /// the Mute LED); write and verification errors otherwise.
    pub fn set_state(&mut self, state: LedState) -> Result<()> {
        let Some((_, value)) = self.states.iter().find(|(s, _)| *s == state) else {
            return Err(RegisterError::UnrecognizedState {
                led: self.name.to_string(),
                state: state.to_string(),
            }
            .into());
        };
        Ok(self.register.write(*value)?)
    }

    /// The current state rendered for display.
    ///
    /// Degrades to `"Unknown"` on any failure; rendering must never fail.
    pub fn state_text(&mut self) -> String {
        match self.state() {
            Ok(state) => state.to_string(),
            Err(_) => "Unknown".to_string(),
        }
    }
}

impl Register for Led {
    fn initialize(&mut self) -> RegisterResult<()> {
        self.register.initialize()
    }

    fn name(&self) -> &str {
        self.name
    }

    fn path(&self) -> &Path {
        self.register.path()
    }

    fn raw(&self) -> Option<&[u8]> {
        self.register.raw()
    }
}

/// The three front-panel LEDs.
#[derive(Debug)]
pub struct Leds {
    power: Led,
    status: Led,
    mute: Led,
}

impl Leds {
    /// Build the LED set against the production sysfs transport.
    ///
    /// # Errors
    ///
    /// Any eager-read failure.
    pub fn new(register_root: &Path, read_policy: ReadPolicy) -> Result<Self> {
        Self::with_io(register_root, read_policy, Arc::new(SysfsIo))
    }

    /// Build the LED set with an explicit register transport.
    ///
    /// # Errors
    ///
    /// Any eager-read failure.
    pub fn with_io(
        register_root: &Path,
        read_policy: ReadPolicy,
        io: Arc<dyn RegisterIo>,
    ) -> Result<Self> {
        Ok(Self {
            power: Led::with_io(
                "Power",
                RegisterKind::PowerLed,
                TRI_STATE,
                register_root,
                read_policy,
                Arc::clone(&io),
            )?,
            status: Led::with_io(
                "Status",
                RegisterKind::StatusLed,
                TRI_STATE,
                register_root,
                read_policy,
                Arc::clone(&io),
            )?,
            mute: Led::with_io(
                "Mute",
                RegisterKind::MuteLed,
                MUTE_STATE,
                register_root,
                read_policy,
                io,
            )?,
        })
    }

    pub fn power(&mut self) -> &mut Led {
        &mut self.power
    }

    pub fn status(&mut self) -> &mut Led {
        &mut self.status
    }

    pub fn mute(&mut self) -> &mut Led {
        &mut self.mute
    }

    /// Reset all three LEDs to off.
    ///
    /// # Errors
    ///
    /// Write and verification errors.
    pub fn initialize(&mut self) -> Result<()> {
        self.power.initialize()?;
        self.status.initialize()?;
        self.mute.initialize()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use assert_matches::assert_matches;
    use tempfile::TempDir;

    use crate::error::Error;
    use crate::provision;

    use super::*;

    fn seeded_leds() -> (TempDir, Leds) {
        let dir = TempDir::new().unwrap();
        provision::seed(dir.path(), 16).unwrap();
        let leds = Leds::new(dir.path(), ReadPolicy::Eager).unwrap();
        (dir, leds)
    }

    #[test]
    fn test_leds_start_off_after_seeding() {
        let (_dir, mut leds) = seeded_leds();
        assert_eq!(leds.power().state().unwrap(), LedState::Off);
        assert_eq!(leds.status().state().unwrap(), LedState::Off);
        assert_eq!(leds.mute().state().unwrap(), LedState::Off);
    }

    #[test]
    fn test_set_state_round_trips() {
        let (dir, mut leds) = seeded_leds();
        leds.power().set_state(LedState::On).unwrap();
        assert_eq!(leds.power().state().unwrap(), LedState::On);
        assert_eq!(fs::read(dir.path().join("spi4.0/status_led_1_en")).unwrap(), b"2\n");

        leds.status().set_state(LedState::Alert).unwrap();
        assert_eq!(leds.status().state().unwrap(), LedState::Alert);

        leds.mute().set_state(LedState::On).unwrap();
        assert_eq!(fs::read(dir.path().join("spi4.0/mute_led_en")).unwrap(), b"1\n");
    }

    #[test]
    fn test_raw_two_is_on_for_tri_state_but_not_mute() {
        let (dir, mut leds) = seeded_leds();
        fs::write(dir.path().join("spi4.0/status_led_1_en"), b"2\n").unwrap();
        fs::write(dir.path().join("spi4.0/mute_led_en"), b"2\n").unwrap();

        assert_eq!(leds.power().state().unwrap(), LedState::On);
        assert_matches!(
            leds.mute().state(),
            Err(Error::Register(RegisterError::UnrecognizedState { .. }))
        );
    }

    #[test]
    fn test_mute_rejects_alert() {
        let (_dir, mut leds) = seeded_leds();
        assert_matches!(
            leds.mute().set_state(LedState::Alert),
            Err(Error::Register(RegisterError::UnrecognizedState { .. }))
        );
        // The register was never touched.
        assert_eq!(leds.mute().state().unwrap(), LedState::Off);
    }

    #[test]
    fn test_state_text_degrades_to_unknown() {
        let (dir, mut leds) = seeded_leds();
        assert_eq!(leds.power().state_text(), "Off");

        fs::write(dir.path().join("spi4.0/status_led_1_en"), b"9\n").unwrap();
        assert_eq!(leds.power().state_text(), "Unknown");

        fs::remove_file(dir.path().join("spi4.0/status_led_1_en")).unwrap();
        assert_eq!(leds.power().state_text(), "Unknown");
    }

    #[test]
    fn test_register_capabilities() {
        let (dir, mut leds) = seeded_leds();
        leds.status().set_state(LedState::On).unwrap();
        leds.status().initialize().unwrap();
        assert_eq!(leds.status().state().unwrap(), LedState::Off);

        assert_eq!(Register::name(leds.power()), "Power");
        assert!(Register::path(leds.mute()).starts_with(dir.path()));
        assert_eq!(Register::raw(leds.status()), Some(b"0\n".as_slice()));
    }
}
