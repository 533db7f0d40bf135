//! BLE connection management.
//!
//! Tracks the link state of a single peripheral and performs the
//! connect/disconnect handshakes.

use btleplug::api::Peripheral as _;
use btleplug::platform::Peripheral;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::{Error, Result};

/// Connection state of a peripheral link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Not connected to the device.
    #[default]
    Disconnected,
    /// Currently attempting to connect.
    Connecting,
    /// Connected to the device.
    Connected,
    /// Currently disconnecting.
    Disconnecting,
}

impl ConnectionState {
    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if in a transitional state.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Connecting | Self::Disconnecting)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnecting => write!(f, "Disconnecting"),
        }
    }
}

/// Shared handle to a link's state, updated by background tasks.
pub type SharedConnectionState = Arc<RwLock<ConnectionState>>;

/// Manages the link to one Volcano peripheral.
pub struct ConnectionManager {
    /// The peripheral to manage.
    peripheral: Peripheral,
    /// Current connection state.
    state: SharedConnectionState,
}

impl ConnectionManager {
    /// Create a new connection manager for a peripheral.
    pub fn new(peripheral: Peripheral) -> Self {
        Self {
            peripheral,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
        }
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Shared handle used by the notification task to report link loss.
    pub fn state_handle(&self) -> SharedConnectionState {
        self.state.clone()
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Get the peripheral.
    pub fn peripheral(&self) -> &Peripheral {
        &self.peripheral
    }

    /// Connect and discover services.
    ///
    /// A single attempt is made; retry policy belongs to the caller.
    pub async fn connect(&self) -> Result<()> {
        let current_state = self.state();

        if current_state.is_connected() {
            debug!("Already connected");
            return Ok(());
        }

        if current_state.is_transitioning() {
            return Err(Error::ConnectionFailed {
                reason: "Connection already in progress".to_string(),
            });
        }

        self.set_state(ConnectionState::Connecting);

        let already_up = self.peripheral.is_connected().await.unwrap_or(false);
        if already_up {
            info!("Peripheral already connected at BLE level");
        } else if let Err(e) = self.peripheral.connect().await {
            debug!("Connection attempt failed: {}", e);
            self.set_state(ConnectionState::Disconnected);
            return Err(Error::Bluetooth(e));
        }

        if let Err(e) = self.peripheral.discover_services().await {
            error!("Failed to discover services: {}", e);
            let _ = self.peripheral.disconnect().await;
            self.set_state(ConnectionState::Disconnected);
            return Err(Error::Bluetooth(e));
        }

        info!("Connected to {}", self.peripheral.address());
        self.set_state(ConnectionState::Connected);
        Ok(())
    }

    /// Disconnect from the device.
    pub async fn disconnect(&self) -> Result<()> {
        let current_state = self.state();

        if matches!(
            current_state,
            ConnectionState::Disconnected | ConnectionState::Disconnecting
        ) {
            return Ok(());
        }

        self.set_state(ConnectionState::Disconnecting);

        match self.peripheral.disconnect().await {
            Ok(_) => {
                info!("Disconnected from {}", self.peripheral.address());
                self.set_state(ConnectionState::Disconnected);
                Ok(())
            }
            Err(e) => {
                error!("Failed to disconnect: {}", e);
                self.set_state(ConnectionState::Disconnected);
                Err(Error::Bluetooth(e))
            }
        }
    }

    /// Update the connection state.
    fn set_state(&self, new_state: ConnectionState) {
        let old_state = std::mem::replace(&mut *self.state.write(), new_state);

        if old_state != new_state {
            debug!("Connection state changed: {} -> {}", old_state, new_state);
        }
    }
}
