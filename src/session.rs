//! Session management for a single Volcano Hybrid.
//!
//! A [`DeviceSession`] owns the link to one bound device and the
//! [`SessionState`] built from it. Commands are optimistic: the requested
//! value is recorded as pending before anything goes over the air, so it
//! survives disconnects and is replayed once the device is back and powered.
//!
//! Device events arrive on a channel handed to the transport at connect
//! time. Drive them with [`DeviceSession::run`], [`DeviceSession::next_event`]
//! or [`DeviceSession::process_pending_events`]; every operation also drains
//! whatever is already queued before acting.

use futures::future::try_join_all;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::ble::retry::retry_transient;
use crate::ble::transport::{GattTransport, TransportEvent};
use crate::ble::uuids::CharacteristicId;
use crate::config::SessionConfig;
use crate::data::{DeviceIdentity, SensorKey, SensorValue, SessionState};
use crate::error::{Error, Result};
use crate::protocol::codec::{
    encode_led_brightness, encode_minutes, encode_switch, encode_temperature,
};
use crate::protocol::registers::{
    encode_display_on_cooling, encode_showing_celsius, encode_vibration,
};

/// Lowest accepted target temperature in degrees Celsius.
pub const MIN_TARGET_TEMP: f64 = 40.0;

/// Highest accepted target temperature in degrees Celsius.
pub const MAX_TARGET_TEMP: f64 = 230.0;

/// Longest accepted auto shut-off delay in minutes.
pub const MAX_SHUT_OFF_MINUTES: u16 = 360;

/// Highest accepted LED brightness.
pub const MAX_LED_BRIGHTNESS: u8 = 100;

/// Read and subscribed first, one at a time, before anything else.
const LEADING_READS: [CharacteristicId; 2] =
    [CharacteristicId::CurrentTemp, CharacteristicId::Prj1v];

/// Read concurrently after the leading reads. The flag marks a subscription.
const BATCH_READS: [(CharacteristicId, bool); 13] = [
    (CharacteristicId::SetTemp, true),
    (CharacteristicId::Prj2v, true),
    (CharacteristicId::Prj3v, true),
    (CharacteristicId::CurrentAutoOffTime, true),
    (CharacteristicId::HeatHours, true),
    (CharacteristicId::HeatMinutes, true),
    (CharacteristicId::SerialNumber, false),
    (CharacteristicId::FirmwareVersion, false),
    (CharacteristicId::FirmwareBleVersion, false),
    (CharacteristicId::BootloaderVersion, false),
    (CharacteristicId::Firmware, false),
    (CharacteristicId::ShutOff, false),
    (CharacteristicId::LedBrightness, false),
];

/// Observer invoked after a state change.
pub type Callback = Box<dyn Fn() + Send + Sync>;

/// Lifecycle of a [`DeviceSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    /// No device has been bound.
    #[default]
    Unbound,
    /// A device is bound but there is no link.
    Disconnected,
    /// Waiting for the link to come up.
    Connecting,
    /// Link is up, initial reads in progress.
    Initializing,
    /// Initial reads done, commands go straight to the device.
    Ready,
}

impl SessionPhase {
    /// Whether a link exists or is being set up.
    pub fn is_link_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Initializing | Self::Ready)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbound => write!(f, "Unbound"),
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Initializing => write!(f, "Initializing"),
            Self::Ready => write!(f, "Ready"),
        }
    }
}

/// A session with one Volcano Hybrid.
pub struct DeviceSession<T: GattTransport> {
    config: SessionConfig,
    transport: Option<T>,
    phase: SessionPhase,
    state: SessionState,
    /// Receiving half for the current link only. Replaced on every connect.
    events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    on_data_changed: Callback,
    on_device_changed: Callback,
}

impl<T: GattTransport> DeviceSession<T> {
    /// Create an unbound session with the default configuration.
    ///
    /// `on_data_changed` fires after any change observers may care about.
    /// `on_device_changed` fires after each completed initial read, once the
    /// identity strings are known.
    pub fn new<D, C>(on_data_changed: D, on_device_changed: C) -> Self
    where
        D: Fn() + Send + Sync + 'static,
        C: Fn() + Send + Sync + 'static,
    {
        Self::with_config(SessionConfig::default(), on_data_changed, on_device_changed)
    }

    /// Create an unbound session.
    pub fn with_config<D, C>(config: SessionConfig, on_data_changed: D, on_device_changed: C) -> Self
    where
        D: Fn() + Send + Sync + 'static,
        C: Fn() + Send + Sync + 'static,
    {
        Self {
            config,
            transport: None,
            phase: SessionPhase::Unbound,
            state: SessionState::new(),
            events: None,
            on_data_changed: Box::new(on_data_changed),
            on_device_changed: Box::new(on_device_changed),
        }
    }

    // === Binding ===

    /// Bind the session to a device.
    ///
    /// Rebinding the same address only refreshes the signal strength. A
    /// different address tears down the current link and starts from an
    /// empty state, pending writes included.
    pub async fn bind(&mut self, device: T) {
        if let Some(current) = self.transport.as_ref() {
            if current.address() == device.address() {
                let rssi = device.rssi();
                if rssi.is_some() && rssi != self.state.rssi() {
                    trace!("RSSI for {} now {:?}", device.address(), rssi);
                    self.state.set_rssi(rssi);
                    self.notify_data_changed();
                }
                return;
            }

            info!("Rebinding from {} to {}", current.address(), device.address());
            self.disconnect().await;
        }

        info!("Bound to {}", device.address());
        self.events = None;
        self.state = SessionState::new();
        self.state.set_rssi(device.rssi());
        self.transport = Some(device);
        self.phase = SessionPhase::Disconnected;
        self.notify_data_changed();
    }

    /// Address of the bound device.
    pub fn address(&self) -> Option<String> {
        self.transport.as_ref().map(GattTransport::address)
    }

    // === Connection ===

    /// Connect and initialise if not already ready.
    ///
    /// Returns `true` once the session is ready. A session that is already
    /// ready returns immediately without touching the device. Failures leave
    /// the session disconnected, with pending writes kept, and return `false`.
    pub async fn ensure_connected(&mut self) -> bool {
        self.process_pending_events();

        let link_up = match self.transport.as_ref() {
            Some(transport) => transport.is_connected(),
            None => {
                warn!("No device bound, unable to connect");
                return false;
            }
        };

        if self.phase == SessionPhase::Ready && link_up {
            trace!("Already connected");
            return true;
        }

        if self.phase.is_link_active() {
            // Either an abandoned attempt or a link that died silently
            debug!("Discarding stale link in phase {}", self.phase);
            self.teardown().await;
        }

        match self.connect_and_initialize().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to connect to Volcano: {}", e);
                self.teardown().await;
                false
            }
        }
    }

    /// Drop the link. Pending writes are kept.
    pub async fn disconnect(&mut self) {
        if !self.phase.is_link_active() {
            trace!("Disconnect with no link in phase {}", self.phase);
            return;
        }

        info!("Disconnecting from Volcano");
        self.teardown().await;
    }

    /// Disconnect and connect again.
    pub async fn reconnect(&mut self) -> bool {
        self.disconnect().await;
        self.ensure_connected().await
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether the link to the bound device is up.
    pub fn is_connected(&self) -> bool {
        matches!(self.phase, SessionPhase::Initializing | SessionPhase::Ready)
            && self
                .transport
                .as_ref()
                .map_or(false, |transport| transport.is_connected())
    }

    /// Signal strength of the bound device.
    pub fn rssi(&self) -> Option<i16> {
        self.state.rssi()
    }

    // === Events ===

    /// Handle every event already queued, without waiting.
    ///
    /// Returns the number of events handled.
    pub fn process_pending_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.events.as_mut().and_then(|rx| rx.try_recv().ok()) {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Wait for the next event from the current link and handle it.
    ///
    /// Returns `false` if there is no link or its channel closed.
    pub async fn next_event(&mut self) -> bool {
        let Some(rx) = self.events.as_mut() else {
            return false;
        };

        match rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Handle events until the current link goes away.
    pub async fn run(&mut self) {
        while self.next_event().await {
            if self.phase == SessionPhase::Disconnected {
                break;
            }
        }
        debug!("Event loop finished in phase {}", self.phase);
    }

    fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Notification {
                characteristic,
                data,
            } => {
                if !matches!(self.phase, SessionPhase::Initializing | SessionPhase::Ready) {
                    trace!("Ignoring {} notification in phase {}", characteristic, self.phase);
                    return;
                }

                match self.state.apply_reading(characteristic, &data) {
                    Ok(()) => self.notify_data_changed(),
                    Err(e) => warn!("Dropping malformed {} notification: {}", characteristic, e),
                }
            }
            TransportEvent::Disconnected => {
                if !self.phase.is_link_active() {
                    return;
                }
                info!("Volcano disconnected");
                self.events = None;
                self.mark_disconnected();
            }
        }
    }

    // === State ===

    /// Everything known about the device.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Identity strings read during initialisation.
    pub fn identity(&self) -> &DeviceIdentity {
        self.state.identity()
    }

    /// Current value of a sensor.
    pub fn get(&self, key: SensorKey) -> SensorValue {
        match key {
            SensorKey::Connected => SensorValue::Bool(self.is_connected()),
            _ => self.state.get(key),
        }
    }

    // === Commands ===

    /// Switch the fan (air pump).
    ///
    /// The request is kept as pending even when the write fails, and is
    /// replayed on the next connect if the device is on.
    pub async fn set_fan(&mut self, on: bool) -> Result<()> {
        self.ensure_bound()?;
        self.process_pending_events();

        debug!("Setting fan {}", if on { "on" } else { "off" });
        self.state.request_fan(on);

        let characteristic = if on {
            CharacteristicId::FanOn
        } else {
            CharacteristicId::FanOff
        };
        let result = self.write(characteristic, &encode_switch(on)).await;
        self.notify_data_changed();
        result
    }

    /// Switch the heater.
    pub async fn set_heater(&mut self, on: bool) -> Result<()> {
        self.ensure_bound()?;
        self.process_pending_events();

        debug!("Setting heater {}", if on { "on" } else { "off" });
        self.state.request_heater(on);

        let characteristic = if on {
            CharacteristicId::HeaterOn
        } else {
            CharacteristicId::HeaterOff
        };
        let result = self.write(characteristic, &encode_switch(on)).await;
        self.notify_data_changed();
        result
    }

    /// Set the target temperature in degrees Celsius.
    ///
    /// A successful write is followed by a read-back so the new value is
    /// confirmed without waiting for a notification.
    pub async fn set_target_temperature(&mut self, celsius: f64) -> Result<()> {
        if !(MIN_TARGET_TEMP..=MAX_TARGET_TEMP).contains(&celsius) {
            return Err(Error::InvalidParameter {
                name: "target_temperature".to_string(),
                value: celsius.to_string(),
            });
        }
        self.ensure_bound()?;
        self.process_pending_events();

        let payload = encode_temperature(celsius)?;
        // Same truncation a read-back applies
        let whole = u32::from(u16::from_le_bytes(payload)) / 10;
        debug!("Setting target temperature to {}", whole);
        self.state.request_target_temp(whole);

        let result = self.write(CharacteristicId::SetTemp, &payload).await;
        if result.is_ok() {
            if let Err(e) = self.refresh(CharacteristicId::SetTemp).await {
                debug!("Target temperature read-back failed: {}", e);
            }
        }
        self.notify_data_changed();
        result
    }

    /// Show temperatures in Celsius (`true`) or Fahrenheit (`false`).
    pub async fn set_showing_celsius(&mut self, on: bool) -> Result<()> {
        self.ensure_bound()?;
        self.process_pending_events();
        let result = self.write(CharacteristicId::Prj2v, &encode_showing_celsius(on)).await;
        self.notify_data_changed();
        result
    }

    /// Keep the display lit while cooling down.
    pub async fn set_display_on_cooling(&mut self, on: bool) -> Result<()> {
        self.ensure_bound()?;
        self.process_pending_events();
        let result = self.write(CharacteristicId::Prj2v, &encode_display_on_cooling(on)).await;
        self.notify_data_changed();
        result
    }

    /// Enable vibration feedback.
    pub async fn set_vibration(&mut self, on: bool) -> Result<()> {
        self.ensure_bound()?;
        self.process_pending_events();
        let result = self.write(CharacteristicId::Prj3v, &encode_vibration(on)).await;
        self.notify_data_changed();
        result
    }

    /// Set the auto shut-off delay in minutes.
    pub async fn set_shut_off(&mut self, minutes: u16) -> Result<()> {
        if minutes > MAX_SHUT_OFF_MINUTES {
            return Err(Error::InvalidParameter {
                name: "shut_off".to_string(),
                value: minutes.to_string(),
            });
        }
        self.ensure_bound()?;
        self.process_pending_events();

        let result = self
            .write(CharacteristicId::ShutOff, &encode_minutes(minutes)?)
            .await;
        if result.is_ok() {
            self.state.set_shut_off(u32::from(minutes));
        }
        self.notify_data_changed();
        result
    }

    /// Set the display brightness (0-100).
    pub async fn set_led_brightness(&mut self, brightness: u8) -> Result<()> {
        if brightness > MAX_LED_BRIGHTNESS {
            return Err(Error::InvalidParameter {
                name: "led_brightness".to_string(),
                value: brightness.to_string(),
            });
        }
        self.ensure_bound()?;
        self.process_pending_events();

        let result = self
            .write(
                CharacteristicId::LedBrightness,
                &encode_led_brightness(brightness),
            )
            .await;
        if result.is_ok() {
            self.state.set_led_brightness(u32::from(brightness));
        }
        self.notify_data_changed();
        result
    }

    // === Internal ===

    async fn connect_and_initialize(&mut self) -> Result<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(rx);
        self.phase = SessionPhase::Connecting;

        let transport = self.transport.as_ref().ok_or(Error::NotBound)?;
        info!("Connecting to {}", transport.address());
        transport.connect(tx).await?;
        let rssi = transport.rssi();

        self.phase = SessionPhase::Initializing;
        self.state.set_connected(true);
        if rssi.is_some() {
            self.state.set_rssi(rssi);
        }
        self.notify_data_changed();

        self.read_initial_characteristics().await?;

        self.phase = SessionPhase::Ready;
        info!("Volcano ready");
        self.notify_data_changed();
        (self.on_device_changed)();

        self.reconcile_pending_writes().await
    }

    async fn read_initial_characteristics(&mut self) -> Result<()> {
        for characteristic in LEADING_READS {
            let transport = self.transport.as_ref().ok_or(Error::NotBound)?;
            let (characteristic, data) =
                read_and_subscribe(transport, &self.config, characteristic, true).await?;
            self.drain_events()?;
            self.state.apply_reading(characteristic, &data)?;
        }

        let transport = self.transport.as_ref().ok_or(Error::NotBound)?;
        let config = &self.config;
        let readings = try_join_all(BATCH_READS.iter().map(|&(characteristic, subscribe)| {
            read_and_subscribe(transport, config, characteristic, subscribe)
        }))
        .await?;

        self.drain_events()?;
        for (characteristic, data) in readings {
            self.state.apply_reading(characteristic, &data)?;
        }

        debug!("Initial read complete");
        Ok(())
    }

    /// Bring the device in line with what was requested while offline.
    async fn reconcile_pending_writes(&mut self) -> Result<()> {
        self.refresh(CharacteristicId::SetTemp).await?;

        if !self.state.is_assumed() {
            trace!("No pending writes to reconcile");
            return Ok(());
        }

        self.refresh(CharacteristicId::Prj1v).await?;

        if !self.state.is_on() {
            info!("Volcano is off, discarding pending writes");
            self.state.clear_pending_writes();
            self.notify_data_changed();
            return Ok(());
        }

        // Accepted replays count as confirmed until the device says otherwise
        if let Some(on) = self.state.fan().outstanding() {
            info!("Replaying fan write: {}", on);
            self.set_fan(on).await?;
            self.state.assume_fan(on);
            self.notify_data_changed();
        }
        if let Some(on) = self.state.heater().outstanding() {
            info!("Replaying heater write: {}", on);
            self.set_heater(on).await?;
            self.state.assume_heater(on);
            self.notify_data_changed();
        }
        // The read-back after the write confirms the target temperature
        if let Some(celsius) = self.state.target_temp().outstanding() {
            info!("Replaying target temperature write: {}", celsius);
            self.set_target_temperature(f64::from(celsius)).await?;
        }

        Ok(())
    }

    async fn refresh(&mut self, characteristic: CharacteristicId) -> Result<()> {
        let transport = self.transport.as_ref().ok_or(Error::NotBound)?;
        let data = transport.read(characteristic).await?;
        self.drain_events()?;
        self.state.apply_reading(characteristic, &data)
    }

    /// Handle everything queued ahead of a read so the read lands last.
    fn drain_events(&mut self) -> Result<()> {
        self.process_pending_events();
        if self.phase.is_link_active() {
            Ok(())
        } else {
            Err(Error::ConnectionLost)
        }
    }

    async fn write(&mut self, characteristic: CharacteristicId, data: &[u8]) -> Result<()> {
        if self.phase != SessionPhase::Ready {
            debug!("Not ready, {} write deferred", characteristic);
            return Err(Error::NotConnected);
        }

        let transport = self.transport.as_ref().ok_or(Error::NotBound)?;
        trace!("Writing {:02X?} to {}", data, characteristic);

        match transport.write(characteristic, data).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Write to {} failed: {}", characteristic, e);
                if e.is_transient() || !transport.is_connected() {
                    self.teardown().await;
                }
                Err(e)
            }
        }
    }

    async fn teardown(&mut self) {
        self.events = None;
        if let Some(transport) = self.transport.as_ref() {
            if let Err(e) = transport.disconnect().await {
                debug!("Error while disconnecting: {}", e);
            }
        }
        self.mark_disconnected();
    }

    fn mark_disconnected(&mut self) {
        self.phase = if self.transport.is_some() {
            SessionPhase::Disconnected
        } else {
            SessionPhase::Unbound
        };
        self.state.set_connected(false);
        self.notify_data_changed();
    }

    fn ensure_bound(&self) -> Result<()> {
        if self.transport.is_none() {
            warn!("Command issued with no device bound");
            return Err(Error::NotBound);
        }
        Ok(())
    }

    fn notify_data_changed(&self) {
        (self.on_data_changed)();
    }
}

impl<T: GattTransport> fmt::Debug for DeviceSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSession")
            .field("address", &self.address())
            .field("phase", &self.phase)
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

async fn read_and_subscribe<T: GattTransport>(
    transport: &T,
    config: &SessionConfig,
    characteristic: CharacteristicId,
    subscribe: bool,
) -> Result<(CharacteristicId, Vec<u8>)> {
    let data = retry_transient(config.initial_read_attempts, config.retry_delay, move || {
        transport.read(characteristic)
    })
    .await?;

    if subscribe {
        retry_transient(config.initial_read_attempts, config.retry_delay, move || {
            transport.subscribe(characteristic)
        })
        .await?;
    }

    Ok((characteristic, data))
}
