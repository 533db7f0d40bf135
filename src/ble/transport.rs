//! GATT transport abstraction.
//!
//! The session talks to the device only through [`GattTransport`], so the
//! reconciliation logic can be exercised without a radio.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::ble::uuids::CharacteristicId;
use crate::error::Result;

/// Device-initiated event delivered to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A subscribed characteristic pushed a new value.
    Notification {
        /// The characteristic that changed.
        characteristic: CharacteristicId,
        /// The new payload.
        data: Bytes,
    },
    /// The link dropped without being asked to.
    Disconnected,
}

/// Sending half of a session's event channel.
pub type EventSender = mpsc::UnboundedSender<TransportEvent>;

/// Link to a single Volcano device.
///
/// Implementations must deliver every notification and unsolicited
/// disconnect for the current connection on the sender passed to
/// [`GattTransport::connect`], in arrival order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GattTransport: Send + Sync {
    /// Stable address of the physical device.
    fn address(&self) -> String;

    /// Last known signal strength in dBm.
    fn rssi(&self) -> Option<i16>;

    /// Whether the link is currently up.
    fn is_connected(&self) -> bool;

    /// Bring the link up. Succeeds immediately if already connected.
    async fn connect(&self, events: EventSender) -> Result<()>;

    /// Tear the link down. Safe to call when already disconnected.
    async fn disconnect(&self) -> Result<()>;

    /// Read the current value of a characteristic.
    async fn read(&self, characteristic: CharacteristicId) -> Result<Vec<u8>>;

    /// Write a value to a characteristic.
    async fn write(&self, characteristic: CharacteristicId, data: &[u8]) -> Result<()>;

    /// Enable notifications for a characteristic.
    async fn subscribe(&self, characteristic: CharacteristicId) -> Result<()>;
}
