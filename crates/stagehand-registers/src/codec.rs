//! Encoding and decoding of register byte values.
//!
//! Three register families carry typed values: preamp gain (a raw value at
//! a fixed offset from the real dB figure), the -20 dB pad (boolean), and
//! phantom power (a 4-bit field shared by the four channels of one ADC).

use crate::error::{RegisterError, Result};

/// Lowest supported preamp gain in dB.
pub const GAIN_DB_MIN: u8 = 10;
/// Highest supported preamp gain in dB.
pub const GAIN_DB_MAX: u8 = 60;
/// Offset between the raw register value and the real dB gain.
const GAIN_OFFSET: u8 = 9;
/// Lowest raw gain register value.
pub const GAIN_RAW_MIN: u8 = GAIN_DB_MIN - GAIN_OFFSET;
/// Highest raw gain register value.
pub const GAIN_RAW_MAX: u8 = GAIN_DB_MAX - GAIN_OFFSET;
/// Highest raw phantom register value, all four group bits set.
pub const PHANTOM_RAW_MAX: u8 = 0b0000_1111;

/// Decode a raw gain register value into dB.
///
/// The raw value is between 1-51, which represents a gain of 10-60 dB.
///
/// # Errors
///
/// `UnsupportedValue` for a raw value outside 1..=51.
pub fn gain_db_from_raw(raw: u8) -> Result<u8> {
    if !(GAIN_RAW_MIN..=GAIN_RAW_MAX).contains(&raw) {
        return Err(RegisterError::UnsupportedValue { what: "gain", value: raw });
    }
    Ok(raw + GAIN_OFFSET)
}

/// Encode a dB gain into the raw register value.
///
/// # Errors
///
/// `OutOfRange` for a gain outside 10..=60 dB; nothing is written in that
/// case.
pub fn gain_raw_from_db(db: u8) -> Result<u8> {
    if !(GAIN_DB_MIN..=GAIN_DB_MAX).contains(&db) {
        return Err(RegisterError::OutOfRange {
            what: "gain dB",
            value: u32::from(db),
            min: u32::from(GAIN_DB_MIN),
            max: u32::from(GAIN_DB_MAX),
        });
    }
    Ok(db - GAIN_OFFSET)
}

/// Decode a raw pad register value.
///
/// # Errors
///
/// `UnsupportedValue` for anything but 0 or 1.
pub fn pad_from_raw(raw: u8) -> Result<bool> {
    match raw {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(RegisterError::UnsupportedValue { what: "pad", value: raw }),
    }
}

/// Raw pad register value for the requested state.
#[must_use]
pub fn pad_to_raw(enabled: bool) -> u8 {
    u8::from(enabled)
}

/// Bit mask of `channel` within its group's shared phantom register.
///
/// The lowest channel of a group owns the most significant of the four
/// bits:
///
/// channel 1 = 8 (0b1000)
/// channel 2 = 4 (0b0100)
/// channel 3 = 2 (0b0010)
/// channel 4 = 1 (0b0001)
///
/// `channel` is 1-based and must already have passed the addressing tables.
#[must_use]
pub fn phantom_mask(channel: u16) -> u8 {
    1 << (3 - ((channel - 1) % 4))
}

/// Whether `channel`'s phantom bit is set in the shared register byte.
///
/// # Errors
///
/// `UnsupportedValue` for a byte above the 4-bit maximum.
pub fn phantom_from_raw(raw: u8, channel: u16) -> Result<bool> {
    if raw > PHANTOM_RAW_MAX {
        return Err(RegisterError::UnsupportedValue { what: "phantom", value: raw });
    }
    Ok(raw & phantom_mask(channel) != 0)
}

/// Set or clear only `channel`'s bit in the shared register byte.
///
/// The caller reads the current byte, applies this, and writes the result
/// back. That read-modify-write is not atomic across processes; a single
/// controlling process is assumed.
///
/// # Errors
///
/// `UnsupportedValue` for a byte above the 4-bit maximum.
pub fn phantom_apply(raw: u8, channel: u16, enabled: bool) -> Result<u8> {
    if raw > PHANTOM_RAW_MAX {
        return Err(RegisterError::UnsupportedValue { what: "phantom", value: raw });
    }
    let mask = phantom_mask(channel);
    Ok(if enabled { raw | mask } else { raw & !mask })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_gain_decode() {
        assert_eq!(gain_db_from_raw(1).unwrap(), 10);
        assert_eq!(gain_db_from_raw(4).unwrap(), 13);
        assert_eq!(gain_db_from_raw(51).unwrap(), 60);
    }

    #[test]
    fn test_gain_decode_rejects_unsupported_raw() {
        for raw in [0, 52, 99, 255] {
            assert_matches!(
                gain_db_from_raw(raw),
                Err(RegisterError::UnsupportedValue { what: "gain", value }) if value == raw
            );
        }
    }

    #[test]
    fn test_gain_encode_rejects_out_of_range_db() {
        for db in [0, 9, 61, 255] {
            assert_matches!(gain_raw_from_db(db), Err(RegisterError::OutOfRange { .. }));
        }
    }

    proptest! {
        #[test]
        fn test_gain_round_trips_over_full_db_range(db in GAIN_DB_MIN..=GAIN_DB_MAX) {
            let raw = gain_raw_from_db(db).unwrap();
            prop_assert!((GAIN_RAW_MIN..=GAIN_RAW_MAX).contains(&raw));
            prop_assert_eq!(gain_db_from_raw(raw).unwrap(), db);
        }
    }

    #[test]
    fn test_pad_codec() {
        assert!(!pad_from_raw(0).unwrap());
        assert!(pad_from_raw(1).unwrap());
        assert_matches!(
            pad_from_raw(2),
            Err(RegisterError::UnsupportedValue { what: "pad", value: 2 })
        );
        assert_eq!(pad_to_raw(false), 0);
        assert_eq!(pad_to_raw(true), 1);
    }

    #[test]
    fn test_phantom_mask_per_group_position() {
        assert_eq!(phantom_mask(1), 0b1000);
        assert_eq!(phantom_mask(2), 0b0100);
        assert_eq!(phantom_mask(3), 0b0010);
        assert_eq!(phantom_mask(4), 0b0001);
        // Positions repeat per group of four.
        assert_eq!(phantom_mask(5), 0b1000);
        assert_eq!(phantom_mask(16), 0b0001);
    }

    #[test]
    fn test_phantom_decode() {
        assert!(phantom_from_raw(0b1111, 3).unwrap());
        assert!(!phantom_from_raw(0b0000, 3).unwrap());
        assert!(phantom_from_raw(0b1000, 1).unwrap());
        assert!(!phantom_from_raw(0b1000, 2).unwrap());
        assert_matches!(
            phantom_from_raw(16, 1),
            Err(RegisterError::UnsupportedValue { what: "phantom", value: 16 })
        );
    }

    #[test]
    fn test_phantom_apply_touches_exactly_one_bit() {
        // Clearing one channel from a fully enabled group leaves the other
        // three bits set.
        assert_eq!(phantom_apply(0b1111, 1, false).unwrap(), 0b0111);
        assert_eq!(phantom_apply(0b1111, 2, false).unwrap(), 0b1011);
        assert_eq!(phantom_apply(0b1111, 3, false).unwrap(), 0b1101);
        assert_eq!(phantom_apply(0b1111, 4, false).unwrap(), 0b1110);
        assert_eq!(phantom_apply(0b0000, 2, true).unwrap(), 0b0100);
    }

    #[test]
    fn test_phantom_apply_is_idempotent() {
        assert_eq!(phantom_apply(0b0100, 2, true).unwrap(), 0b0100);
        assert_eq!(phantom_apply(0b1011, 2, false).unwrap(), 0b1011);
    }

    #[test]
    fn test_phantom_apply_rejects_wide_byte() {
        assert_matches!(phantom_apply(0b1_0000, 1, true), Err(RegisterError::UnsupportedValue { .. }));
    }
}
