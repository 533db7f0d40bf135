//! Typed session state for a Volcano Hybrid.
//!
//! Holds the last values seen from the device, the pending writes for the
//! fan, heater and target temperature, and the derived quantities exposed to
//! observers.

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::ble::uuids::CharacteristicId;
use crate::data::dual_state::DualState;
use crate::data::sensor::{SensorKey, SensorValue};
use crate::error::Result;
use crate::protocol::codec::{decode_minutes, decode_string, decode_temperature, decode_uint};
use crate::protocol::registers::{Prj1Status, Prj2Status, Prj3Status};

/// Highest current temperature reading that is believed, °C.
pub const MAX_TRUSTED_TEMP: u32 = 500;

/// Readings at or below this are ignored unless the heater is running, °C.
pub const IDLE_TEMP_FLOOR: u32 = 10;

/// Identity and version strings of the bound device.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceIdentity {
    /// Serial number.
    pub serial_number: Option<String>,
    /// Main firmware version.
    pub firmware_version: Option<String>,
    /// BLE firmware version.
    pub firmware_ble_version: Option<String>,
    /// Bootloader version.
    pub bootloader_version: Option<String>,
    /// Firmware build id.
    pub firmware: Option<String>,
}

/// Last-known and requested state of the device.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    current_temp: Option<u32>,
    target_temp: DualState<u32>,
    fan: DualState<bool>,
    heater: DualState<bool>,

    identity: DeviceIdentity,

    /// Remaining auto-off time in seconds, as sent.
    current_auto_off_secs: Option<u32>,
    heat_hours: Option<u32>,
    heat_minutes: Option<u32>,
    shut_off: Option<u32>,
    led_brightness: Option<u32>,

    auto_shutdown: Option<bool>,
    prv1_error: Option<bool>,
    showing_celsius: Option<bool>,
    display_on_cooling: Option<bool>,
    prv2_error: Option<bool>,
    vibration: Option<bool>,

    connected: bool,
    rssi: Option<i16>,
    last_update: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a characteristic payload and store it.
    ///
    /// Write-only switches carry nothing to store and are ignored.
    pub fn apply_reading(&mut self, characteristic: CharacteristicId, data: &[u8]) -> Result<()> {
        trace!("Applying {}: {:02X?}", characteristic, data);

        match characteristic {
            CharacteristicId::CurrentTemp => self.current_temp = Some(decode_temperature(data)?),
            CharacteristicId::SetTemp => self.observe_target_temp(decode_temperature(data)?),
            CharacteristicId::Prj1v => self.apply_prj1(Prj1Status::parse(data)?),
            CharacteristicId::Prj2v => self.apply_prj2(Prj2Status::parse(data)?),
            CharacteristicId::Prj3v => self.apply_prj3(Prj3Status::parse(data)?),
            CharacteristicId::CurrentAutoOffTime => {
                self.current_auto_off_secs = Some(decode_uint(data)?)
            }
            CharacteristicId::ShutOff => self.shut_off = Some(decode_minutes(data)?),
            CharacteristicId::HeatHours => self.heat_hours = Some(decode_uint(data)?),
            CharacteristicId::HeatMinutes => self.heat_minutes = Some(decode_uint(data)?),
            CharacteristicId::LedBrightness => self.led_brightness = Some(decode_uint(data)?),
            CharacteristicId::SerialNumber => {
                self.identity.serial_number = Some(decode_string(data)?)
            }
            CharacteristicId::FirmwareVersion => {
                self.identity.firmware_version = Some(decode_string(data)?)
            }
            CharacteristicId::FirmwareBleVersion => {
                self.identity.firmware_ble_version = Some(decode_string(data)?)
            }
            CharacteristicId::BootloaderVersion => {
                self.identity.bootloader_version = Some(decode_string(data)?)
            }
            CharacteristicId::Firmware => self.identity.firmware = Some(decode_string(data)?),
            CharacteristicId::FanOn
            | CharacteristicId::FanOff
            | CharacteristicId::HeaterOn
            | CharacteristicId::HeaterOff => {
                debug!("Ignoring payload for {}", characteristic);
                return Ok(());
            }
        }

        self.last_update = Some(Utc::now());
        Ok(())
    }

    /// Store a decoded PRJ1 register.
    pub fn apply_prj1(&mut self, status: Prj1Status) {
        if self.heater.observe(status.heater) {
            debug!("Heater write acknowledged: {}", status.heater);
        }
        if self.fan.observe(status.fan) {
            debug!("Fan write acknowledged: {}", status.fan);
        }
        self.auto_shutdown = Some(status.auto_shutdown);
        self.prv1_error = Some(status.error);
    }

    /// Store a decoded PRJ2 register.
    pub fn apply_prj2(&mut self, status: Prj2Status) {
        self.showing_celsius = Some(status.showing_celsius);
        self.display_on_cooling = Some(status.display_on_cooling);
        self.prv2_error = Some(status.error);
    }

    /// Store a decoded PRJ3 register.
    pub fn apply_prj3(&mut self, status: Prj3Status) {
        self.vibration = Some(status.vibration);
    }

    fn observe_target_temp(&mut self, celsius: u32) {
        if self.target_temp.observe(celsius) {
            debug!("Target temperature write acknowledged: {}", celsius);
        }
    }

    // === Dual-state properties ===

    /// Fan state, confirmed and pending.
    pub fn fan(&self) -> &DualState<bool> {
        &self.fan
    }

    /// Heater state, confirmed and pending.
    pub fn heater(&self) -> &DualState<bool> {
        &self.heater
    }

    /// Target temperature in °C, confirmed and pending.
    pub fn target_temp(&self) -> &DualState<u32> {
        &self.target_temp
    }

    /// Record a requested fan state.
    pub fn request_fan(&mut self, on: bool) {
        self.fan.request_write(on);
    }

    /// Record a requested heater state.
    pub fn request_heater(&mut self, on: bool) {
        self.heater.request_write(on);
    }

    /// Record a requested target temperature in °C.
    pub fn request_target_temp(&mut self, celsius: u32) {
        self.target_temp.request_write(celsius);
    }

    /// Treat a replayed fan write as accepted.
    pub(crate) fn assume_fan(&mut self, on: bool) {
        self.fan.assume_confirmed(on);
    }

    /// Treat a replayed heater write as accepted.
    pub(crate) fn assume_heater(&mut self, on: bool) {
        self.heater.assume_confirmed(on);
    }

    /// Whether any pending write differs from what the device reports.
    pub fn is_assumed(&self) -> bool {
        self.fan.needs_write() || self.heater.needs_write() || self.target_temp.needs_write()
    }

    /// Drop every pending write.
    pub fn clear_pending_writes(&mut self) {
        self.fan.clear_pending();
        self.heater.clear_pending();
        self.target_temp.clear_pending();
    }

    /// Whether the device reports the fan or heater running.
    pub fn is_on(&self) -> bool {
        self.fan.confirmed().unwrap_or(false) || self.heater.confirmed().unwrap_or(false)
    }

    // === Telemetry ===

    /// Current temperature in °C, if the reading is trustworthy.
    ///
    /// Readings outside `(0, 500]` are dropped, as are readings of 10 °C or
    /// less while the heater is off.
    pub fn current_temp(&self) -> Option<u32> {
        let temp = self.current_temp?;
        let heating = self.heater.confirmed().unwrap_or(false);
        if temp == 0 || temp > MAX_TRUSTED_TEMP {
            return None;
        }
        if !heating && temp <= IDLE_TEMP_FLOOR {
            return None;
        }
        Some(temp)
    }

    /// Raw current temperature in °C, without trust gating.
    pub fn raw_current_temp(&self) -> Option<u32> {
        self.current_temp
    }

    /// Minutes remaining before auto-off, `None` when not counting down.
    ///
    /// Partial minutes round up, so the last seconds of a countdown still
    /// read as one minute.
    pub fn current_auto_off_time(&self) -> Option<u32> {
        self.current_auto_off_secs
            .filter(|seconds| *seconds > 0)
            .map(|seconds| seconds / 60 + u32::from(seconds % 60 != 0))
    }

    /// Minutes the device has been on in the current auto-off window.
    pub fn current_on_time(&self) -> Option<i64> {
        let remaining = self.current_auto_off_time()?;
        let shut_off = self.shut_off?;
        Some(i64::from(shut_off) - i64::from(remaining))
    }

    /// Lifetime heat time in minutes, `None` if the counters overflow.
    pub fn heat_time(&self) -> Option<u32> {
        self.heat_hours?
            .checked_mul(60)?
            .checked_add(self.heat_minutes?)
    }

    /// Configured shut-off time in minutes.
    pub fn shut_off(&self) -> Option<u32> {
        self.shut_off
    }

    /// LED brightness.
    pub fn led_brightness(&self) -> Option<u32> {
        self.led_brightness
    }

    /// Automatic shutdown enabled.
    pub fn auto_shutdown(&self) -> Option<bool> {
        self.auto_shutdown
    }

    /// PRJ1 error flag.
    pub fn prv1_error(&self) -> Option<bool> {
        self.prv1_error
    }

    /// PRJ2 error flag.
    pub fn prv2_error(&self) -> Option<bool> {
        self.prv2_error
    }

    /// Display shows Celsius.
    pub fn showing_celsius(&self) -> Option<bool> {
        self.showing_celsius
    }

    /// Display stays on while cooling.
    pub fn display_on_cooling(&self) -> Option<bool> {
        self.display_on_cooling
    }

    /// Vibration enabled.
    pub fn vibration(&self) -> Option<bool> {
        self.vibration
    }

    /// Identity and version strings.
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Link state as last reported by the session.
    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Signal strength in dBm.
    pub fn rssi(&self) -> Option<i16> {
        self.rssi
    }

    /// When the last device observation was applied.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub(crate) fn set_rssi(&mut self, rssi: Option<i16>) {
        self.rssi = rssi;
    }

    pub(crate) fn set_shut_off(&mut self, minutes: u32) {
        self.shut_off = Some(minutes);
    }

    pub(crate) fn set_led_brightness(&mut self, brightness: u32) {
        self.led_brightness = Some(brightness);
    }

    /// Look up a field by key.
    pub fn get(&self, key: SensorKey) -> SensorValue {
        match key {
            SensorKey::CurrentTemp => self.current_temp().into(),
            SensorKey::TargetTemp => self.target_temp.effective().into(),
            SensorKey::Fan => self.fan.effective().into(),
            SensorKey::Heater => self.heater.effective().into(),
            SensorKey::CurrentAutoOffTime => self.current_auto_off_time().into(),
            SensorKey::CurrentOnTime => self.current_on_time().into(),
            SensorKey::HeatTime => self.heat_time().into(),
            SensorKey::ShutOff => self.shut_off.into(),
            SensorKey::LedBrightness => self.led_brightness.into(),
            SensorKey::AutoShutdown => self.auto_shutdown.into(),
            SensorKey::Prv1Error => self.prv1_error.into(),
            SensorKey::ShowingCelsius => self.showing_celsius.into(),
            SensorKey::DisplayOnCooling => self.display_on_cooling.into(),
            SensorKey::Prv2Error => self.prv2_error.into(),
            SensorKey::Vibration => self.vibration.into(),
            SensorKey::Connected => SensorValue::Bool(self.connected),
            SensorKey::Rssi => self.rssi.into(),
            SensorKey::SerialNumber => self.identity.serial_number.as_ref().into(),
            SensorKey::FirmwareVersion => self.identity.firmware_version.as_ref().into(),
            SensorKey::FirmwareBleVersion => self.identity.firmware_ble_version.as_ref().into(),
            SensorKey::BootloaderVersion => self.identity.bootloader_version.as_ref().into(),
            SensorKey::Firmware => self.identity.firmware.as_ref().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp_bytes(celsius: u32) -> Vec<u8> {
        ((celsius * 10) as u16).to_le_bytes().to_vec()
    }

    #[test]
    fn test_current_temp_trust_gating() {
        let mut state = SessionState::new();
        state
            .apply_reading(CharacteristicId::CurrentTemp, &temp_bytes(5))
            .unwrap();
        state
            .apply_reading(CharacteristicId::Prj1v, &0u32.to_le_bytes())
            .unwrap();
        assert_eq!(state.current_temp(), None);
        assert_eq!(state.raw_current_temp(), Some(5));

        // Heater on
        state
            .apply_reading(CharacteristicId::Prj1v, &0x20u32.to_le_bytes())
            .unwrap();
        assert_eq!(state.current_temp(), Some(5));
    }

    #[test]
    fn test_current_temp_bounds() {
        let mut state = SessionState::new();
        state.apply_prj1(Prj1Status::from_raw(0x20));

        state
            .apply_reading(CharacteristicId::CurrentTemp, &[0, 0])
            .unwrap();
        assert_eq!(state.current_temp(), None);

        state
            .apply_reading(CharacteristicId::CurrentTemp, &temp_bytes(500))
            .unwrap();
        assert_eq!(state.current_temp(), Some(500));

        state
            .apply_reading(CharacteristicId::CurrentTemp, &temp_bytes(501))
            .unwrap();
        assert_eq!(state.current_temp(), None);

        // Idle but clearly warm
        state.apply_prj1(Prj1Status::from_raw(0));
        state
            .apply_reading(CharacteristicId::CurrentTemp, &temp_bytes(11))
            .unwrap();
        assert_eq!(state.current_temp(), Some(11));
    }

    #[test]
    fn test_auto_off_and_on_time() {
        let mut state = SessionState::new();
        state
            .apply_reading(CharacteristicId::CurrentAutoOffTime, &[0, 0])
            .unwrap();
        assert_eq!(state.current_auto_off_time(), None);
        assert_eq!(state.current_on_time(), None);

        state
            .apply_reading(CharacteristicId::ShutOff, &(180u16 * 60).to_le_bytes())
            .unwrap();
        state
            .apply_reading(
                CharacteristicId::CurrentAutoOffTime,
                &(150u16 * 60).to_le_bytes(),
            )
            .unwrap();
        assert_eq!(state.current_auto_off_time(), Some(150));
        assert_eq!(state.current_on_time(), Some(30));
    }

    #[test]
    fn test_auto_off_last_minute_stays_known() {
        let mut state = SessionState::new();
        state
            .apply_reading(CharacteristicId::ShutOff, &(30u16 * 60).to_le_bytes())
            .unwrap();
        state
            .apply_reading(CharacteristicId::CurrentAutoOffTime, &59u16.to_le_bytes())
            .unwrap();
        assert_eq!(state.current_auto_off_time(), Some(1));
        assert_eq!(state.current_on_time(), Some(29));
        assert_eq!(state.get(SensorKey::CurrentOnTime), SensorValue::Int(29));

        state
            .apply_reading(CharacteristicId::CurrentAutoOffTime, &61u16.to_le_bytes())
            .unwrap();
        assert_eq!(state.current_auto_off_time(), Some(2));
    }

    #[test]
    fn test_on_time_can_go_negative() {
        let mut state = SessionState::new();
        state
            .apply_reading(CharacteristicId::ShutOff, &(10u16 * 60).to_le_bytes())
            .unwrap();
        state
            .apply_reading(CharacteristicId::CurrentAutoOffTime, &[0xFF, 0xFF, 0xFF, 0xFF])
            .unwrap();
        assert_eq!(
            state.current_on_time(),
            Some(10 - i64::from(u32::MAX / 60 + 1))
        );
    }

    #[test]
    fn test_heat_time() {
        let mut state = SessionState::new();
        state.apply_reading(CharacteristicId::HeatHours, &[12, 0]).unwrap();
        assert_eq!(state.heat_time(), None);
        state.apply_reading(CharacteristicId::HeatMinutes, &[34, 0]).unwrap();
        assert_eq!(state.heat_time(), Some(12 * 60 + 34));
    }

    #[test]
    fn test_heat_time_overflow_is_unknown() {
        let mut state = SessionState::new();
        state
            .apply_reading(CharacteristicId::HeatHours, &u32::MAX.to_le_bytes())
            .unwrap();
        state.apply_reading(CharacteristicId::HeatMinutes, &[1]).unwrap();
        assert_eq!(state.heat_time(), None);
        assert_eq!(state.get(SensorKey::HeatTime), SensorValue::Unknown);
    }

    #[test]
    fn test_prj1_confirms_pending_writes() {
        let mut state = SessionState::new();
        state.request_fan(true);
        state.request_heater(true);
        assert!(state.is_assumed());
        assert_eq!(state.get(SensorKey::Fan), SensorValue::Bool(true));

        state
            .apply_reading(CharacteristicId::Prj1v, &8224u32.to_le_bytes())
            .unwrap();
        assert_eq!(state.fan().pending(), None);
        assert_eq!(state.heater().pending(), None);
        assert!(!state.is_assumed());
        assert!(state.is_on());
    }

    #[test]
    fn test_set_temp_confirms_pending_write() {
        let mut state = SessionState::new();
        state.request_target_temp(215);
        state
            .apply_reading(CharacteristicId::SetTemp, &[0x66, 0x08])
            .unwrap();
        assert_eq!(state.target_temp().pending(), None);
        assert_eq!(state.target_temp().effective(), Some(215));
    }

    #[test]
    fn test_identity_strings() {
        let mut state = SessionState::new();
        state
            .apply_reading(CharacteristicId::SerialNumber, b"VH1234567\0")
            .unwrap();
        state
            .apply_reading(CharacteristicId::FirmwareVersion, b"V01.24 ")
            .unwrap();
        assert_eq!(state.identity().serial_number.as_deref(), Some("VH1234567"));
        assert_eq!(
            state.get(SensorKey::FirmwareVersion),
            SensorValue::Text("V01.24".to_string())
        );
        assert_eq!(state.get(SensorKey::BootloaderVersion), SensorValue::Unknown);
    }

    #[test]
    fn test_register_flags_via_get() {
        let mut state = SessionState::new();
        state
            .apply_reading(CharacteristicId::Prj2v, &512u32.to_le_bytes())
            .unwrap();
        state
            .apply_reading(CharacteristicId::Prj3v, &0u32.to_le_bytes())
            .unwrap();
        assert_eq!(state.get(SensorKey::ShowingCelsius), SensorValue::Bool(false));
        assert_eq!(state.get(SensorKey::DisplayOnCooling), SensorValue::Bool(true));
        assert_eq!(state.get(SensorKey::Vibration), SensorValue::Bool(true));
        assert_eq!(state.get(SensorKey::Prv2Error), SensorValue::Bool(false));
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        let mut state = SessionState::new();
        assert!(state.apply_reading(CharacteristicId::Prj1v, &[]).is_err());
        assert!(state.last_update().is_none());
        assert!(state
            .apply_reading(CharacteristicId::FanOn, &[])
            .is_ok());
    }
}
