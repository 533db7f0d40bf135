//! Packed PRJ status registers.
//!
//! Each register is a 4-byte little-endian bit field. Several flags use
//! inverted polarity (bit set means the feature is off).
//!
//! Writes to PRJ2/PRJ3 follow the firmware's set/clear convention: writing
//! the bare mask sets the bit, writing `mask + 65536` clears it. Bit 16 is a
//! write discriminator only and never appears in a read value.

use crate::error::Result;
use crate::protocol::codec::decode_uint;

/// PRJ1: heater enabled.
pub const MASK_PRJ1_HEATER: u32 = 0x0020;
/// PRJ1: automatic BLE shutdown enabled.
pub const MASK_PRJ1_AUTO_SHUTDOWN: u32 = 0x0200;
/// PRJ1: pump (fan) FET enabled.
pub const MASK_PRJ1_FAN: u32 = 0x2000;
/// PRJ1: any error bit.
pub const MASK_PRJ1_ERROR: u32 = 16408;

/// PRJ2: display in Fahrenheit.
pub const MASK_PRJ2_FAHRENHEIT: u32 = 0x0200;
/// PRJ2: display stays off while cooling.
pub const MASK_PRJ2_DISPLAY_ON_COOLING: u32 = 0x1000;
/// PRJ2: any error bit.
pub const MASK_PRJ2_ERROR: u32 = 59;

/// PRJ3: vibration disabled.
pub const MASK_PRJ3_VIBRATION: u32 = 0x0400;

/// Added to a mask to turn a register write into a clear.
pub const REGISTER_CLEAR_FLAG: u32 = 65536;

/// Decoded PRJ1 register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prj1Status {
    /// Heater is running.
    pub heater: bool,
    /// Fan (air pump) is running.
    pub fan: bool,
    /// Automatic shutdown is enabled.
    pub auto_shutdown: bool,
    /// One or more PRJ1 error bits are set.
    pub error: bool,
}

impl Prj1Status {
    /// Decode from the raw register value.
    pub fn from_raw(value: u32) -> Self {
        Self {
            heater: value & MASK_PRJ1_HEATER != 0,
            fan: value & MASK_PRJ1_FAN != 0,
            auto_shutdown: value & MASK_PRJ1_AUTO_SHUTDOWN != 0,
            error: value & MASK_PRJ1_ERROR != 0,
        }
    }

    /// Decode from a characteristic payload.
    pub fn parse(data: &[u8]) -> Result<Self> {
        decode_uint(data).map(Self::from_raw)
    }

    /// Whether the device is doing anything at all.
    pub fn is_on(&self) -> bool {
        self.heater || self.fan
    }
}

/// Decoded PRJ2 register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prj2Status {
    /// Display shows Celsius.
    pub showing_celsius: bool,
    /// Display stays on while cooling down.
    pub display_on_cooling: bool,
    /// One or more PRJ2 error bits are set.
    pub error: bool,
}

impl Prj2Status {
    /// Decode from the raw register value.
    pub fn from_raw(value: u32) -> Self {
        Self {
            showing_celsius: value & MASK_PRJ2_FAHRENHEIT == 0,
            display_on_cooling: value & MASK_PRJ2_DISPLAY_ON_COOLING == 0,
            error: value & MASK_PRJ2_ERROR != 0,
        }
    }

    /// Decode from a characteristic payload.
    pub fn parse(data: &[u8]) -> Result<Self> {
        decode_uint(data).map(Self::from_raw)
    }
}

/// Decoded PRJ3 register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prj3Status {
    /// Vibration feedback is enabled.
    pub vibration: bool,
}

impl Prj3Status {
    /// Decode from the raw register value.
    pub fn from_raw(value: u32) -> Self {
        Self {
            vibration: value & MASK_PRJ3_VIBRATION == 0,
        }
    }

    /// Decode from a characteristic payload.
    pub fn parse(data: &[u8]) -> Result<Self> {
        decode_uint(data).map(Self::from_raw)
    }
}

/// Encode a write to an inverted-polarity register flag.
///
/// Enabling the feature clears its bit, so it is written as `mask + 65536`;
/// disabling sets the bit with the bare mask.
fn encode_inverted_flag(mask: u32, enabled: bool) -> [u8; 4] {
    let value = if enabled {
        REGISTER_CLEAR_FLAG + mask
    } else {
        mask
    };
    value.to_le_bytes()
}

/// PRJ2 payload toggling Celsius display.
pub fn encode_showing_celsius(on: bool) -> [u8; 4] {
    encode_inverted_flag(MASK_PRJ2_FAHRENHEIT, on)
}

/// PRJ2 payload toggling display-on-cooling.
pub fn encode_display_on_cooling(on: bool) -> [u8; 4] {
    encode_inverted_flag(MASK_PRJ2_DISPLAY_ON_COOLING, on)
}

/// PRJ3 payload toggling vibration.
pub fn encode_vibration(on: bool) -> [u8; 4] {
    encode_inverted_flag(MASK_PRJ3_VIBRATION, on)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_prj1_heater_and_fan() {
        let status = Prj1Status::parse(&8224u32.to_le_bytes()).unwrap();
        assert_eq!(
            status,
            Prj1Status {
                heater: true,
                fan: true,
                auto_shutdown: false,
                error: false,
            }
        );
        assert!(status.is_on());
    }

    #[test]
    fn test_prj1_error_mask() {
        assert_eq!(MASK_PRJ1_ERROR, (1 << 3) | (1 << 4) | (1 << 14));
        assert!(Prj1Status::from_raw(1 << 3).error);
        assert!(Prj1Status::from_raw(1 << 14).error);
        assert!(!Prj1Status::from_raw(MASK_PRJ1_FAN).error);
        assert!(Prj1Status::from_raw(MASK_PRJ1_AUTO_SHUTDOWN).auto_shutdown);
        assert!(!Prj1Status::from_raw(0).is_on());
    }

    #[test]
    fn test_prj2_inverted_polarity() {
        let status = Prj2Status::from_raw(0);
        assert!(status.showing_celsius);
        assert!(status.display_on_cooling);
        assert!(!status.error);

        let status = Prj2Status::from_raw(MASK_PRJ2_FAHRENHEIT | MASK_PRJ2_DISPLAY_ON_COOLING | 1);
        assert!(!status.showing_celsius);
        assert!(!status.display_on_cooling);
        assert!(status.error);
    }

    #[test]
    fn test_prj3_vibration() {
        assert!(Prj3Status::from_raw(0).vibration);
        assert!(!Prj3Status::from_raw(MASK_PRJ3_VIBRATION).vibration);
    }

    #[test]
    fn test_register_write_encoding() {
        assert_eq!(encode_showing_celsius(true), 66048u32.to_le_bytes());
        assert_eq!(encode_showing_celsius(false), 512u32.to_le_bytes());
        assert_eq!(encode_display_on_cooling(true), 69632u32.to_le_bytes());
        assert_eq!(encode_display_on_cooling(false), 4096u32.to_le_bytes());
        assert_eq!(encode_vibration(true), 66560u32.to_le_bytes());
        assert_eq!(encode_vibration(false), 1024u32.to_le_bytes());
    }

    #[test]
    fn test_short_register_payload() {
        assert!(Prj1Status::parse(&[]).is_err());
        assert!(!Prj2Status::parse(&[0x00, 0x02]).unwrap().showing_celsius);
    }

    proptest! {
        #[test]
        fn prj1_flags_track_bits(value in any::<u32>()) {
            let status = Prj1Status::from_raw(value);
            prop_assert_eq!(status.heater, value & (1 << 5) != 0);
            prop_assert_eq!(status.fan, value & (1 << 13) != 0);
            prop_assert_eq!(status.auto_shutdown, value & (1 << 9) != 0);
            prop_assert_eq!(status.is_on(), status.heater || status.fan);
        }
    }
}
