//! Symbolic sensor keys for generic presentation code.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A readable field of the session state, addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SensorKey {
    /// Trust-gated current temperature, °C.
    CurrentTemp,
    /// Effective target temperature, °C.
    TargetTemp,
    /// Effective fan state.
    Fan,
    /// Effective heater state.
    Heater,
    /// Minutes remaining before auto-off.
    CurrentAutoOffTime,
    /// Minutes since the device was switched on.
    CurrentOnTime,
    /// Total heat time, minutes.
    HeatTime,
    /// Configured shut-off time, minutes.
    ShutOff,
    /// LED brightness.
    LedBrightness,
    /// Automatic shutdown enabled.
    AutoShutdown,
    /// PRJ1 error flag.
    Prv1Error,
    /// Display shows Celsius.
    ShowingCelsius,
    /// Display stays on while cooling.
    DisplayOnCooling,
    /// PRJ2 error flag.
    Prv2Error,
    /// Vibration enabled.
    Vibration,
    /// Link is up.
    Connected,
    /// Signal strength, dBm.
    Rssi,
    /// Device serial number.
    SerialNumber,
    /// Main firmware version.
    FirmwareVersion,
    /// BLE firmware version.
    FirmwareBleVersion,
    /// Bootloader version.
    BootloaderVersion,
    /// Firmware build.
    Firmware,
}

impl SensorKey {
    /// Every key, in presentation order.
    pub const ALL: [SensorKey; 22] = [
        Self::CurrentTemp,
        Self::TargetTemp,
        Self::Fan,
        Self::Heater,
        Self::CurrentAutoOffTime,
        Self::CurrentOnTime,
        Self::HeatTime,
        Self::ShutOff,
        Self::LedBrightness,
        Self::AutoShutdown,
        Self::Prv1Error,
        Self::ShowingCelsius,
        Self::DisplayOnCooling,
        Self::Prv2Error,
        Self::Vibration,
        Self::Connected,
        Self::Rssi,
        Self::SerialNumber,
        Self::FirmwareVersion,
        Self::FirmwareBleVersion,
        Self::BootloaderVersion,
        Self::Firmware,
    ];

    /// Stable snake_case name of the key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentTemp => "current_temp",
            Self::TargetTemp => "target_temp",
            Self::Fan => "fan",
            Self::Heater => "heater",
            Self::CurrentAutoOffTime => "current_auto_off_time",
            Self::CurrentOnTime => "current_on_time",
            Self::HeatTime => "heat_time",
            Self::ShutOff => "shut_off",
            Self::LedBrightness => "led_brightness",
            Self::AutoShutdown => "auto_shutdown",
            Self::Prv1Error => "prv1_error",
            Self::ShowingCelsius => "showing_celsius",
            Self::DisplayOnCooling => "display_on_cooling",
            Self::Prv2Error => "prv2_error",
            Self::Vibration => "vibration",
            Self::Connected => "connected",
            Self::Rssi => "rssi",
            Self::SerialNumber => "serial_number",
            Self::FirmwareVersion => "firmware_version",
            Self::FirmwareBleVersion => "firmware_ble_version",
            Self::BootloaderVersion => "bootloader_version",
            Self::Firmware => "firmware",
        }
    }
}

impl fmt::Display for SensorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| Error::InvalidParameter {
                name: "sensor_key".to_string(),
                value: s.to_string(),
            })
    }
}

/// Value of a sensor lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorValue {
    /// Not yet read, or not trustworthy.
    #[default]
    Unknown,
    /// Boolean flag.
    Bool(bool),
    /// Integer quantity.
    Int(i64),
    /// Text such as a version string.
    Text(String),
}

impl SensorValue {
    /// Check if the value is known.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Get the value as a bool, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the value as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<Option<bool>> for SensorValue {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Unknown, Self::Bool)
    }
}

impl From<Option<u32>> for SensorValue {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Self::Unknown, |v| Self::Int(i64::from(v)))
    }
}

impl From<Option<i64>> for SensorValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Self::Unknown, Self::Int)
    }
}

impl From<Option<i16>> for SensorValue {
    fn from(value: Option<i16>) -> Self {
        value.map_or(Self::Unknown, |v| Self::Int(i64::from(v)))
    }
}

impl From<Option<&String>> for SensorValue {
    fn from(value: Option<&String>) -> Self {
        value.map_or(Self::Unknown, |v| Self::Text(v.clone()))
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Bool(value) => write!(f, "{}", if *value { "on" } else { "off" }),
            Self::Int(value) => write!(f, "{}", value),
            Self::Text(value) => write!(f, "{}", value),
        }
    }
}
