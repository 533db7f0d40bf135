//! Error types for the volcano-hybrid-ble crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// No device has been bound to the session yet.
    #[error("No device bound to the session")]
    NotBound,

    /// Operation requires a connection but the device is not connected.
    #[error("Device not connected")]
    NotConnected,

    /// Failed to establish a connection to the device.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// The connection to the device was lost.
    #[error("Connection lost")]
    ConnectionLost,

    /// A GATT operation timed out.
    #[error("GATT operation timed out")]
    Timeout,

    /// Invalid data was received from the device.
    #[error("Invalid data received: {context}")]
    InvalidData {
        /// Description of what was invalid about the data.
        context: String,
    },

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter {
        /// The name of the parameter.
        name: String,
        /// The invalid value that was provided.
        value: String,
    },

    /// Characteristic not found on the device.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },

    /// Service not found on the device.
    #[error("Service not found: {uuid}")]
    ServiceNotFound {
        /// The UUID of the service that was not found.
        uuid: String,
    },
}

impl Error {
    /// Whether this error came from the BLE stack and may succeed on retry.
    ///
    /// Decode failures and caller misuse are never transient.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Bluetooth(_) | Self::Timeout | Self::ConnectionLost
        )
    }

    /// Classify an error from a GATT operation on an established link.
    ///
    /// Timeouts and a vanished link get their own variants so retry and
    /// teardown can tell them apart from other stack failures.
    pub(crate) fn from_gatt(error: btleplug::Error) -> Self {
        match error {
            btleplug::Error::TimedOut(_) => Self::Timeout,
            btleplug::Error::NotConnected => Self::ConnectionLost,
            other => Self::Bluetooth(other),
        }
    }

    pub(crate) fn invalid_data(context: impl Into<String>) -> Self {
        Self::InvalidData {
            context: context.into(),
        }
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
