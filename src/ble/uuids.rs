//! BLE Service and Characteristic UUIDs.
//!
//! The Volcano Hybrid exposes two vendor services: a control service carrying
//! temperatures, timers and the fan/heater switches, and a status service
//! carrying identity strings and the packed PRJ status registers.

use uuid::Uuid;

// Control Service (Storz & Bickel Custom)
/// Volcano control service UUID.
pub const CONTROL_SERVICE_UUID: Uuid = Uuid::from_u128(0x1011_0000_5354_4f52_5a26_4249434b454c);
/// Current temperature characteristic UUID (Read, Notify).
pub const CURRENT_TEMP_UUID: Uuid = Uuid::from_u128(0x1011_0001_5354_4f52_5a26_4249434b454c);
/// Target temperature characteristic UUID (Read, Write, Notify).
pub const SET_TEMP_UUID: Uuid = Uuid::from_u128(0x1011_0003_5354_4f52_5a26_4249434b454c);
/// LED brightness characteristic UUID (Read, Write).
pub const LED_BRIGHTNESS_UUID: Uuid = Uuid::from_u128(0x1011_0005_5354_4f52_5a26_4249434b454c);
/// Remaining auto-off time characteristic UUID, in seconds (Read, Notify).
pub const CURRENT_AUTO_OFF_TIME_UUID: Uuid =
    Uuid::from_u128(0x1011_000c_5354_4f52_5a26_4249434b454c);
/// Configured shut-off time characteristic UUID, in seconds (Read, Write).
pub const SHUT_OFF_UUID: Uuid = Uuid::from_u128(0x1011_000d_5354_4f52_5a26_4249434b454c);
/// Heater on characteristic UUID (Write).
pub const HEATER_ON_UUID: Uuid = Uuid::from_u128(0x1011_000f_5354_4f52_5a26_4249434b454c);
/// Heater off characteristic UUID (Write).
pub const HEATER_OFF_UUID: Uuid = Uuid::from_u128(0x1011_0010_5354_4f52_5a26_4249434b454c);
/// Fan on characteristic UUID (Write).
pub const FAN_ON_UUID: Uuid = Uuid::from_u128(0x1011_0013_5354_4f52_5a26_4249434b454c);
/// Fan off characteristic UUID (Write).
pub const FAN_OFF_UUID: Uuid = Uuid::from_u128(0x1011_0014_5354_4f52_5a26_4249434b454c);
/// Heat hours counter characteristic UUID (Read, Notify).
pub const HEAT_HOURS_UUID: Uuid = Uuid::from_u128(0x1011_0015_5354_4f52_5a26_4249434b454c);
/// Heat minutes counter characteristic UUID (Read, Notify).
pub const HEAT_MINUTES_UUID: Uuid = Uuid::from_u128(0x1011_0016_5354_4f52_5a26_4249434b454c);

// Status Service (Storz & Bickel Custom)
/// Volcano status service UUID.
pub const STATUS_SERVICE_UUID: Uuid = Uuid::from_u128(0x1010_0000_5354_4f52_5a26_4249434b454c);
/// Bootloader version characteristic UUID (Read).
pub const BOOTLOADER_VERSION_UUID: Uuid =
    Uuid::from_u128(0x1010_0001_5354_4f52_5a26_4249434b454c);
/// Firmware build characteristic UUID (Read).
pub const FIRMWARE_UUID: Uuid = Uuid::from_u128(0x1010_0003_5354_4f52_5a26_4249434b454c);
/// BLE firmware version characteristic UUID (Read).
pub const FIRMWARE_BLE_VERSION_UUID: Uuid =
    Uuid::from_u128(0x1010_0004_5354_4f52_5a26_4249434b454c);
/// Firmware version characteristic UUID (Read).
pub const FIRMWARE_VERSION_UUID: Uuid = Uuid::from_u128(0x1010_0005_5354_4f52_5a26_4249434b454c);
/// Serial number characteristic UUID (Read).
pub const SERIAL_NUMBER_UUID: Uuid = Uuid::from_u128(0x1010_0008_5354_4f52_5a26_4249434b454c);
/// PRJ1V status register characteristic UUID (Read, Notify).
pub const PRJ1V_UUID: Uuid = Uuid::from_u128(0x1010_000c_5354_4f52_5a26_4249434b454c);
/// PRJ2V status register characteristic UUID (Read, Write, Notify).
pub const PRJ2V_UUID: Uuid = Uuid::from_u128(0x1010_000d_5354_4f52_5a26_4249434b454c);
/// PRJ3V status register characteristic UUID (Read, Write, Notify).
pub const PRJ3V_UUID: Uuid = Uuid::from_u128(0x1010_000e_5354_4f52_5a26_4249434b454c);

// Storz & Bickel manufacturer ID for advertising data
/// Storz & Bickel's Bluetooth manufacturer ID.
pub const STORZ_BICKEL_MANUFACTURER_ID: u16 = 1736;

/// Substring of the advertised local name identifying a Volcano Hybrid.
pub const VOLCANO_NAME_FRAGMENT: &str = "VOLCANO H";

/// A characteristic of the fixed Volcano GATT schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacteristicId {
    /// Current temperature, deci-degrees Celsius.
    CurrentTemp,
    /// Target temperature, deci-degrees Celsius.
    SetTemp,
    /// LED brightness, 0-100.
    LedBrightness,
    /// Remaining auto-off time, seconds.
    CurrentAutoOffTime,
    /// Configured shut-off time, seconds.
    ShutOff,
    /// Heater on switch.
    HeaterOn,
    /// Heater off switch.
    HeaterOff,
    /// Fan on switch.
    FanOn,
    /// Fan off switch.
    FanOff,
    /// Heat hours counter.
    HeatHours,
    /// Heat minutes counter.
    HeatMinutes,
    /// Bootloader version string.
    BootloaderVersion,
    /// Firmware build string.
    Firmware,
    /// BLE firmware version string.
    FirmwareBleVersion,
    /// Firmware version string.
    FirmwareVersion,
    /// Serial number string.
    SerialNumber,
    /// Packed status register 1.
    Prj1v,
    /// Packed status register 2.
    Prj2v,
    /// Packed status register 3.
    Prj3v,
}

impl CharacteristicId {
    /// Every characteristic in the schema.
    pub const ALL: [CharacteristicId; 19] = [
        Self::CurrentTemp,
        Self::SetTemp,
        Self::LedBrightness,
        Self::CurrentAutoOffTime,
        Self::ShutOff,
        Self::HeaterOn,
        Self::HeaterOff,
        Self::FanOn,
        Self::FanOff,
        Self::HeatHours,
        Self::HeatMinutes,
        Self::BootloaderVersion,
        Self::Firmware,
        Self::FirmwareBleVersion,
        Self::FirmwareVersion,
        Self::SerialNumber,
        Self::Prj1v,
        Self::Prj2v,
        Self::Prj3v,
    ];

    /// UUID of the characteristic itself.
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::CurrentTemp => CURRENT_TEMP_UUID,
            Self::SetTemp => SET_TEMP_UUID,
            Self::LedBrightness => LED_BRIGHTNESS_UUID,
            Self::CurrentAutoOffTime => CURRENT_AUTO_OFF_TIME_UUID,
            Self::ShutOff => SHUT_OFF_UUID,
            Self::HeaterOn => HEATER_ON_UUID,
            Self::HeaterOff => HEATER_OFF_UUID,
            Self::FanOn => FAN_ON_UUID,
            Self::FanOff => FAN_OFF_UUID,
            Self::HeatHours => HEAT_HOURS_UUID,
            Self::HeatMinutes => HEAT_MINUTES_UUID,
            Self::BootloaderVersion => BOOTLOADER_VERSION_UUID,
            Self::Firmware => FIRMWARE_UUID,
            Self::FirmwareBleVersion => FIRMWARE_BLE_VERSION_UUID,
            Self::FirmwareVersion => FIRMWARE_VERSION_UUID,
            Self::SerialNumber => SERIAL_NUMBER_UUID,
            Self::Prj1v => PRJ1V_UUID,
            Self::Prj2v => PRJ2V_UUID,
            Self::Prj3v => PRJ3V_UUID,
        }
    }

    /// UUID of the service the characteristic lives in.
    pub fn service_uuid(&self) -> Uuid {
        match self {
            Self::CurrentTemp
            | Self::SetTemp
            | Self::LedBrightness
            | Self::CurrentAutoOffTime
            | Self::ShutOff
            | Self::HeaterOn
            | Self::HeaterOff
            | Self::FanOn
            | Self::FanOff
            | Self::HeatHours
            | Self::HeatMinutes => CONTROL_SERVICE_UUID,
            _ => STATUS_SERVICE_UUID,
        }
    }

    /// Look up a characteristic by its UUID.
    pub fn from_uuid(uuid: &Uuid) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.uuid() == *uuid)
    }
}

impl std::fmt::Display for CharacteristicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({})", self, self.uuid())
    }
}

/// Check if a service UUID is one of the Volcano vendor services.
pub fn is_volcano_service(uuid: &Uuid) -> bool {
    *uuid == CONTROL_SERVICE_UUID || *uuid == STATUS_SERVICE_UUID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_format() {
        assert_eq!(
            CONTROL_SERVICE_UUID.to_string(),
            "10110000-5354-4f52-5a26-4249434b454c"
        );
        assert_eq!(PRJ1V_UUID.to_string(), "1010000c-5354-4f52-5a26-4249434b454c");
        assert_eq!(HEATER_ON_UUID.to_string(), "1011000f-5354-4f52-5a26-4249434b454c");
    }

    #[test]
    fn test_service_assignment() {
        assert_eq!(
            CharacteristicId::CurrentTemp.service_uuid(),
            CONTROL_SERVICE_UUID
        );
        assert_eq!(CharacteristicId::FanOff.service_uuid(), CONTROL_SERVICE_UUID);
        assert_eq!(CharacteristicId::Prj2v.service_uuid(), STATUS_SERVICE_UUID);
        assert_eq!(
            CharacteristicId::SerialNumber.service_uuid(),
            STATUS_SERVICE_UUID
        );
    }

    #[test]
    fn test_from_uuid() {
        for characteristic in CharacteristicId::ALL {
            assert_eq!(
                CharacteristicId::from_uuid(&characteristic.uuid()),
                Some(characteristic)
            );
        }
        assert_eq!(CharacteristicId::from_uuid(&CONTROL_SERVICE_UUID), None);
    }

    #[test]
    fn test_is_volcano_service() {
        assert!(is_volcano_service(&CONTROL_SERVICE_UUID));
        assert!(is_volcano_service(&STATUS_SERVICE_UUID));
        assert!(!is_volcano_service(&PRJ1V_UUID));
    }
}
