// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # volcano-hybrid-ble
//!
//! A Rust library for controlling a Storz & Bickel Volcano Hybrid vaporizer
//! over Bluetooth Low Energy.
//!
//! The device exposes two GATT services. The session reads and subscribes
//! to the status characteristics, decodes the packed PRJ registers, and
//! tracks every mutable property as a confirmed value plus an optional
//! pending write.
//!
//! ## Features
//!
//! - **Discovery**: Recognise a Volcano from its advertisement
//! - **Optimistic Commands**: Fan, heater and target temperature changes are
//!   visible immediately and survive disconnects
//! - **Reconciliation**: Pending writes are replayed on reconnect, or
//!   dropped if the device has been switched off
//! - **Settings**: Display units, display-on-cooling, vibration, auto
//!   shut-off and LED brightness
//! - **Transport Seam**: All radio access goes through [`GattTransport`],
//!   with a btleplug implementation in [`BtleplugTransport`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use btleplug::api::{Central, Manager as _, ScanFilter};
//! use btleplug::platform::Manager;
//! use volcano_hybrid_ble::{BtleplugTransport, DeviceSession, Error, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let manager = Manager::new().await?;
//!     let adapter = manager
//!         .adapters()
//!         .await?
//!         .into_iter()
//!         .next()
//!         .ok_or(Error::BluetoothUnavailable)?;
//!     adapter.start_scan(ScanFilter::default()).await?;
//!     tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//!
//!     let peripheral = adapter
//!         .peripherals()
//!         .await?
//!         .into_iter()
//!         .next()
//!         .ok_or(Error::NotBound)?;
//!
//!     let mut session = DeviceSession::new(|| {}, || {});
//!     session
//!         .bind(BtleplugTransport::from_peripheral(peripheral).await?)
//!         .await;
//!
//!     if session.ensure_connected().await {
//!         session.set_target_temperature(185.0).await?;
//!         session.set_heater(true).await?;
//!         println!("Target: {:?}", session.state().target_temp().effective());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod config;
pub mod data;
pub mod error;
pub mod protocol;
pub mod session;

// Re-exports for convenience
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use session::{DeviceSession, SessionPhase};

// Re-export commonly used types from submodules
pub use ble::discovery::{is_supported, matches_properties};
pub use ble::peripheral::BtleplugTransport;
pub use ble::transport::{GattTransport, TransportEvent};
pub use ble::uuids::CharacteristicId;
pub use data::{DeviceIdentity, DualState, SensorKey, SensorValue, SessionState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that key types are exported
        let _ = std::any::TypeId::of::<DeviceSession<BtleplugTransport>>();
        let _ = std::any::TypeId::of::<SessionPhase>();
        let _ = std::any::TypeId::of::<SessionConfig>();
        let _ = std::any::TypeId::of::<Error>();
        let _ = std::any::TypeId::of::<SessionState>();
        let _ = std::any::TypeId::of::<DualState<bool>>();
        let _ = std::any::TypeId::of::<SensorValue>();
        let _ = std::any::TypeId::of::<CharacteristicId>();
    }

    #[test]
    fn test_volcano_advertisement_is_supported() {
        assert!(is_supported(&[1736], Some("S&B VOLCANO H")));
        assert!(!is_supported(&[76], Some("Keyboard")));
    }
}
