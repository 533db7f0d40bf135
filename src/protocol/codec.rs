//! Scalar characteristic encodings.
//!
//! All integers on the wire are unsigned little-endian. Temperatures are
//! carried in deci-degrees Celsius and durations in seconds.

use crate::error::{Error, Result};

/// Widest integer payload the device sends.
pub const MAX_INT_WIDTH: usize = 4;

/// Decode an unsigned little-endian integer of 1 to 4 bytes.
pub fn decode_uint(data: &[u8]) -> Result<u32> {
    if data.is_empty() || data.len() > MAX_INT_WIDTH {
        return Err(Error::invalid_data(format!(
            "Integer payload must be 1-{} bytes, got {}",
            MAX_INT_WIDTH,
            data.len()
        )));
    }

    let mut bytes = [0u8; MAX_INT_WIDTH];
    bytes[..data.len()].copy_from_slice(data);
    Ok(u32::from_le_bytes(bytes))
}

/// Decode a UTF-8 identity or version string.
///
/// Surrounding whitespace and NUL padding are trimmed.
pub fn decode_string(data: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(data)
        .map_err(|e| Error::invalid_data(format!("Invalid UTF-8 in string payload: {}", e)))?;
    Ok(text
        .trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string())
}

/// Decode a temperature characteristic to whole degrees Celsius.
///
/// The raw value is in tenths of a degree and is truncated, so `2159` reads
/// as `215`.
pub fn decode_temperature(data: &[u8]) -> Result<u32> {
    Ok(decode_uint(data)? / 10)
}

/// Encode a target temperature in degrees Celsius.
pub fn encode_temperature(celsius: f64) -> Result<[u8; 2]> {
    let raw = (celsius * 10.0).round();
    if !raw.is_finite() || raw < 0.0 || raw > f64::from(u16::MAX) {
        return Err(Error::InvalidParameter {
            name: "celsius".to_string(),
            value: celsius.to_string(),
        });
    }
    Ok((raw as u16).to_le_bytes())
}

/// Decode a duration characteristic (seconds) to whole minutes.
pub fn decode_minutes(data: &[u8]) -> Result<u32> {
    Ok(decode_uint(data)? / 60)
}

/// Encode a duration in minutes as a 2-byte seconds field.
pub fn encode_minutes(minutes: u16) -> Result<[u8; 2]> {
    let seconds = u32::from(minutes) * 60;
    let seconds = u16::try_from(seconds).map_err(|_| Error::InvalidParameter {
        name: "minutes".to_string(),
        value: minutes.to_string(),
    })?;
    Ok(seconds.to_le_bytes())
}

/// Encode the payload written to a fan or heater switch characteristic.
pub fn encode_switch(on: bool) -> [u8; 1] {
    [u8::from(on)]
}

/// Encode an LED brightness value. No scaling is applied.
pub fn encode_led_brightness(brightness: u8) -> [u8; 2] {
    u16::from(brightness).to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_uint_widths() {
        assert_eq!(decode_uint(&[0x2A]).unwrap(), 42);
        assert_eq!(decode_uint(&[0x66, 0x08]).unwrap(), 2150);
        assert_eq!(decode_uint(&[0x20, 0x20, 0x00, 0x00]).unwrap(), 8224);
        assert_eq!(decode_uint(&[0x01, 0x00, 0x01]).unwrap(), 65537);
    }

    #[test]
    fn test_decode_uint_rejects_bad_lengths() {
        assert!(matches!(decode_uint(&[]), Err(Error::InvalidData { .. })));
        assert!(matches!(
            decode_uint(&[0, 0, 0, 0, 1]),
            Err(Error::InvalidData { .. })
        ));
    }

    #[test]
    fn test_decode_string_trims() {
        assert_eq!(decode_string(b"VH123456  \0\0").unwrap(), "VH123456");
        assert_eq!(decode_string(b" V01.2.3\n").unwrap(), "V01.2.3");
        assert!(decode_string(&[0xFF, 0xFE]).is_err());
    }

    #[test]
    fn test_target_temperature_encoding() {
        assert_eq!(encode_temperature(215.0).unwrap(), [0x66, 0x08]);
        // Rounded, not truncated
        assert_eq!(encode_temperature(180.46).unwrap(), 1805u16.to_le_bytes());
        assert!(encode_temperature(-1.0).is_err());
        assert!(encode_temperature(f64::NAN).is_err());
    }

    #[test]
    fn test_current_temperature_decoding() {
        assert_eq!(decode_temperature(&[0x66, 0x08]).unwrap(), 215);
        assert_eq!(decode_temperature(&2159u16.to_le_bytes()).unwrap(), 215);
        assert_eq!(decode_temperature(&[0x00, 0x00]).unwrap(), 0);
    }

    #[test]
    fn test_minutes() {
        assert_eq!(encode_minutes(30).unwrap(), 1800u16.to_le_bytes());
        assert_eq!(decode_minutes(&1800u16.to_le_bytes()).unwrap(), 30);
        assert_eq!(decode_minutes(&[59, 0]).unwrap(), 0);
        assert!(encode_minutes(1093).is_err());
    }

    #[test]
    fn test_switch_and_brightness() {
        assert_eq!(encode_switch(true), [1]);
        assert_eq!(encode_switch(false), [0]);
        assert_eq!(encode_led_brightness(70), [70, 0]);
    }
}
