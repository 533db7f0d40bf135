//! Data structures for Volcano Hybrid state.
//!
//! This module contains the types used to represent device state, pending
//! writes and symbolic sensor lookups.

pub mod dual_state;
pub mod sensor;
pub mod state;

pub use dual_state::DualState;
pub use sensor::{SensorKey, SensorValue};
pub use state::{DeviceIdentity, SessionState};
