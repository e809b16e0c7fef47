//! Scratch register-tree provisioning.
//!
//! Creates the directory structure of the hardware register tree under a
//! scratch root and seeds every register file with its power-on default,
//! so the device can be exercised without the hardware.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use stagehand_registers::{RegisterError, RegisterKind, SYSFS_REGISTER_ROOT};

use crate::error::{Error, Result};

/// One register of the device's full map.
#[derive(Debug, Clone)]
pub struct RegisterMapEntry {
    pub kind: RegisterKind,
    /// Channel the register serves; `None` for the fixed LED registers.
    pub channel: Option<u16>,
    /// Path relative to the register root.
    pub path: PathBuf,
    /// Power-on default value.
    pub default: u8,
}

/// Enumerate every register of a device with `num_inputs` mic inputs.
///
/// The shared phantom registers appear once per channel they serve, so the
/// map lines up one-to-one with the signal accessors.
///
/// # Errors
///
/// `OutOfRange` if `num_inputs` exceeds the addressing tables.
pub fn register_map(num_inputs: u16) -> Result<Vec<RegisterMapEntry>> {
    let mut map = Vec::new();
    for kind in [RegisterKind::PowerLed, RegisterKind::StatusLed, RegisterKind::MuteLed] {
        map.push(RegisterMapEntry {
            kind,
            channel: None,
            path: kind.relative_path(0)?,
            default: kind.power_on_default(),
        });
    }
    for channel in 1..=num_inputs {
        for kind in [RegisterKind::Gain, RegisterKind::Pad, RegisterKind::Phantom] {
            map.push(RegisterMapEntry {
                kind,
                channel: Some(channel),
                path: kind.relative_path(channel)?,
                default: kind.power_on_default(),
            });
        }
    }
    Ok(map)
}

/// Create the register directory tree under `root` and seed every register
/// with its power-on default.
///
/// # Errors
///
/// `ProtectedRoot` when pointed at the live hardware tree; `OutOfRange`
/// for an input count the addressing tables cannot serve; `Io` for any
/// filesystem failure.
pub fn seed(root: &Path, num_inputs: u16) -> Result<()> {
    if root == Path::new(SYSFS_REGISTER_ROOT) {
        return Err(Error::ProtectedRoot(root.to_path_buf()));
    }

    let map = register_map(num_inputs)?;
    for entry in &map {
        let path = root.join(&entry.path);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|source| RegisterError::Io { path: dir.to_path_buf(), source })?;
        }
        fs::write(&path, format!("{}\n", entry.default))
            .map_err(|source| RegisterError::Io { path: path.clone(), source })?;
        debug!(path = %path.display(), default = entry.default, "register seeded");
    }
    info!(root = %root.display(), registers = map.len(), "register tree provisioned");
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    use crate::device::{DeviceConfig, Stage16};

    use super::*;

    #[test]
    fn test_register_map_covers_every_register() {
        let map = register_map(16).unwrap();
        // 3 LEDs + 16 channels x (gain, pad, phantom).
        assert_eq!(map.len(), 51);
        assert_eq!(map.iter().filter(|e| e.channel.is_none()).count(), 3);
        assert!(
            map.iter()
                .any(|e| e.kind == RegisterKind::Gain
                    && e.path == PathBuf::from("spi1.2/ch3_preamp_gain"))
        );
    }

    #[test]
    fn test_seed_writes_power_on_defaults() {
        let dir = TempDir::new().unwrap();
        seed(dir.path(), 16).unwrap();

        assert_eq!(fs::read(dir.path().join("spi1.1/ch0_preamp_gain")).unwrap(), b"1\n");
        assert_eq!(fs::read(dir.path().join("spi1.1/ch0_pad_en")).unwrap(), b"0\n");
        assert_eq!(fs::read(dir.path().join("spi4.0/adc2_phantom_en")).unwrap(), b"0\n");
        assert_eq!(fs::read(dir.path().join("spi4.0/mute_led_en")).unwrap(), b"0\n");
    }

    #[test]
    fn test_seed_refuses_live_tree() {
        assert_matches!(
            seed(Path::new(SYSFS_REGISTER_ROOT), 16),
            Err(Error::ProtectedRoot(_))
        );
    }

    #[test]
    fn test_seeded_tree_supports_eager_device() {
        let dir = TempDir::new().unwrap();
        seed(dir.path(), 16).unwrap();
        let config = DeviceConfig {
            register_root: dir.path().to_path_buf(),
            ..DeviceConfig::default()
        };
        let mut device = Stage16::new(config).unwrap();
        assert_eq!(device.mic_input(8).unwrap().gain().unwrap(), 10);
    }

    #[test]
    fn test_register_map_rejects_oversized_device() {
        assert_matches!(register_map(17), Err(Error::Register(RegisterError::OutOfRange { .. })));
    }
}
