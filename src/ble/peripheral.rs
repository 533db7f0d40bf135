//! [`GattTransport`] over a btleplug peripheral.

use async_trait::async_trait;
use btleplug::api::Peripheral as _;
use btleplug::platform::Peripheral;
use tracing::{debug, warn};

use crate::ble::characteristics::CharacteristicHandler;
use crate::ble::connection::{ConnectionManager, ConnectionState};
use crate::ble::transport::{EventSender, GattTransport};
use crate::ble::uuids::CharacteristicId;
use crate::error::{Error, Result};

/// A Volcano reached through the platform Bluetooth stack.
pub struct BtleplugTransport {
    /// Device address as reported by the adapter.
    address: String,
    /// Signal strength captured from the last advertisement.
    rssi: Option<i16>,
    /// Link state and handshakes.
    connection: ConnectionManager,
    /// Characteristic access and notification forwarding.
    characteristics: CharacteristicHandler,
}

impl BtleplugTransport {
    /// Wrap a peripheral.
    pub fn new(peripheral: Peripheral) -> Self {
        Self {
            address: peripheral.address().to_string(),
            rssi: None,
            characteristics: CharacteristicHandler::new(peripheral.clone()),
            connection: ConnectionManager::new(peripheral),
        }
    }

    /// Wrap a peripheral, capturing its advertised RSSI.
    pub async fn from_peripheral(peripheral: Peripheral) -> Result<Self> {
        let rssi = peripheral
            .properties()
            .await
            .map_err(Error::Bluetooth)?
            .and_then(|properties| properties.rssi);

        Ok(Self::new(peripheral).with_rssi(rssi))
    }

    /// Set the signal strength reported by [`GattTransport::rssi`].
    pub fn with_rssi(mut self, rssi: Option<i16>) -> Self {
        self.rssi = rssi;
        self
    }

    /// Current link state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// The wrapped peripheral.
    pub fn peripheral(&self) -> &Peripheral {
        self.connection.peripheral()
    }
}

#[async_trait]
impl GattTransport for BtleplugTransport {
    fn address(&self) -> String {
        self.address.clone()
    }

    fn rssi(&self) -> Option<i16> {
        self.rssi
    }

    fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    async fn connect(&self, events: EventSender) -> Result<()> {
        self.connection.connect().await?;

        let setup = async move {
            self.characteristics.discover_characteristics()?;
            self.characteristics
                .start_notifications(events, self.connection.state_handle())
                .await
        };

        if let Err(e) = setup.await {
            warn!("Link to {} unusable: {}", self.address, e);
            let _ = self.connection.disconnect().await;
            return Err(e);
        }

        debug!("Transport to {} ready", self.address);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.characteristics.stop_notifications();
        self.connection.disconnect().await
    }

    async fn read(&self, characteristic: CharacteristicId) -> Result<Vec<u8>> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        self.characteristics.read(characteristic).await
    }

    async fn write(&self, characteristic: CharacteristicId, data: &[u8]) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        self.characteristics.write(characteristic, data).await
    }

    async fn subscribe(&self, characteristic: CharacteristicId) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        self.characteristics.subscribe(characteristic).await
    }
}

impl std::fmt::Debug for BtleplugTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BtleplugTransport")
            .field("address", &self.address)
            .field("rssi", &self.rssi)
            .field("connection_state", &self.connection.state())
            .finish()
    }
}
