//! GATT characteristic handling.
//!
//! Resolves the fixed Volcano schema against the services a peripheral
//! actually exposes, and forwards notifications to the session's event
//! channel.

use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;
use bytes::Bytes;
use futures::stream::StreamExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

use crate::ble::connection::{ConnectionState, SharedConnectionState};
use crate::ble::transport::{EventSender, TransportEvent};
use crate::ble::uuids::{
    is_volcano_service, CharacteristicId, CONTROL_SERVICE_UUID, STATUS_SERVICE_UUID,
};
use crate::error::{Error, Result};

/// Handler for the GATT characteristics of one peripheral.
pub struct CharacteristicHandler {
    /// The peripheral to communicate with.
    peripheral: Peripheral,
    /// Resolved characteristics of the Volcano schema.
    characteristics: RwLock<HashMap<CharacteristicId, Characteristic>>,
    /// Handle to the notification forwarding task.
    listener_handle: RwLock<Option<tokio::task::JoinHandle<()>>>,
}

impl CharacteristicHandler {
    /// Create a new characteristic handler for a peripheral.
    pub fn new(peripheral: Peripheral) -> Self {
        Self {
            peripheral,
            characteristics: RwLock::new(HashMap::new()),
            listener_handle: RwLock::new(None),
        }
    }

    /// Resolve the schema against the discovered services.
    ///
    /// Services must already be discovered. Fails if either Volcano service
    /// is missing.
    pub fn discover_characteristics(&self) -> Result<()> {
        let services = self.peripheral.services();

        for required in [CONTROL_SERVICE_UUID, STATUS_SERVICE_UUID] {
            if !services.iter().any(|service| service.uuid == required) {
                return Err(Error::ServiceNotFound {
                    uuid: required.to_string(),
                });
            }
        }

        let mut chars = self.characteristics.write();
        chars.clear();

        for service in services {
            if !is_volcano_service(&service.uuid) {
                trace!("Skipping service {}", service.uuid);
                continue;
            }

            for characteristic in service.characteristics {
                match CharacteristicId::from_uuid(&characteristic.uuid) {
                    Some(id) if id.service_uuid() == service.uuid => {
                        trace!("Resolved {} in service {}", id, service.uuid);
                        chars.insert(id, characteristic);
                    }
                    _ => trace!(
                        "Skipping characteristic {} in service {}",
                        characteristic.uuid,
                        service.uuid
                    ),
                }
            }
        }

        debug!("Resolved {} Volcano characteristics", chars.len());

        Ok(())
    }

    fn characteristic(&self, id: CharacteristicId) -> Result<Characteristic> {
        self.characteristics
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::CharacteristicNotFound {
                uuid: id.uuid().to_string(),
            })
    }

    /// Read a characteristic value.
    pub async fn read(&self, id: CharacteristicId) -> Result<Vec<u8>> {
        let characteristic = self.characteristic(id)?;

        let data = self
            .peripheral
            .read(&characteristic)
            .await
            .map_err(Error::from_gatt)?;

        trace!("Read {} bytes from {}", data.len(), id);

        Ok(data)
    }

    /// Write to a characteristic, waiting for the device's response.
    pub async fn write(&self, id: CharacteristicId, data: &[u8]) -> Result<()> {
        let characteristic = self.characteristic(id)?;

        self.peripheral
            .write(&characteristic, data, WriteType::WithResponse)
            .await
            .map_err(Error::from_gatt)?;

        trace!("Wrote {:02X?} to {}", data, id);

        Ok(())
    }

    /// Subscribe to notifications from a characteristic.
    pub async fn subscribe(&self, id: CharacteristicId) -> Result<()> {
        let characteristic = self.characteristic(id)?;

        self.peripheral.subscribe(&characteristic).await.map_err(|e| {
            debug!("Failed to subscribe to {}: {:?}", id, e);
            Error::from_gatt(e)
        })?;

        debug!("Subscribed to notifications from {}", id);

        Ok(())
    }

    /// Start forwarding notifications to `events`.
    ///
    /// When the peripheral's notification stream ends the link is marked
    /// disconnected and [`TransportEvent::Disconnected`] is sent.
    pub async fn start_notifications(
        &self,
        events: EventSender,
        state: SharedConnectionState,
    ) -> Result<()> {
        self.stop_notifications();

        let mut notifications = self
            .peripheral
            .notifications()
            .await
            .map_err(Error::Bluetooth)?;

        let handle = tokio::spawn(async move {
            debug!("Notification listener started");

            while let Some(notification) = notifications.next().await {
                let Some(characteristic) = CharacteristicId::from_uuid(&notification.uuid) else {
                    trace!("Ignoring notification from {}", notification.uuid);
                    continue;
                };

                let event = TransportEvent::Notification {
                    characteristic,
                    data: Bytes::from(notification.value),
                };

                if events.send(event).is_err() {
                    debug!("Session dropped its event channel, stopping listener");
                    return;
                }
            }

            warn!("Notification stream ended, link lost");
            *state.write() = ConnectionState::Disconnected;
            let _ = events.send(TransportEvent::Disconnected);
        });

        *self.listener_handle.write() = Some(handle);

        Ok(())
    }

    /// Stop forwarding notifications.
    pub fn stop_notifications(&self) {
        if let Some(handle) = self.listener_handle.write().take() {
            handle.abort();
        }
    }
}

impl Drop for CharacteristicHandler {
    fn drop(&mut self) {
        self.stop_notifications();
    }
}
