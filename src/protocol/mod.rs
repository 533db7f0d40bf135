//! Volcano wire protocol.
//!
//! Pure encoding and decoding of characteristic payloads. Nothing in here
//! touches the BLE link.

pub mod codec;
pub mod registers;

pub use codec::*;
pub use registers::{Prj1Status, Prj2Status, Prj3Status};
