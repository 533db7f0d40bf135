//! Session configuration.

use std::time::Duration;

/// Tunables for a [`DeviceSession`](crate::DeviceSession).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Attempts per characteristic during the initial read before giving up.
    pub initial_read_attempts: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
}

impl SessionConfig {
    /// Default attempts per initial read.
    pub const DEFAULT_INITIAL_READ_ATTEMPTS: u32 = 3;

    /// Default pause between attempts.
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(250);

    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of attempts per initial read.
    pub fn with_initial_read_attempts(mut self, attempts: u32) -> Self {
        self.initial_read_attempts = attempts;
        self
    }

    /// Set the pause between attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_read_attempts: Self::DEFAULT_INITIAL_READ_ATTEMPTS,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
        }
    }
}
