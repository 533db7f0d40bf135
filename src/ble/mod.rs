//! BLE communication module.
//!
//! This module provides the GATT transport used by the session, its
//! btleplug implementation, and the fixed Volcano UUID table.

pub mod characteristics;
pub mod connection;
pub mod discovery;
pub mod peripheral;
pub mod retry;
pub mod transport;
pub mod uuids;

pub use characteristics::CharacteristicHandler;
pub use connection::{ConnectionManager, ConnectionState};
pub use discovery::{is_supported, matches_properties};
pub use peripheral::BtleplugTransport;
pub use retry::retry_transient;
pub use transport::{EventSender, GattTransport, TransportEvent};
pub use uuids::*;
