//! Emulated firmware of the Rainbow network expansion chip.
//!
//! The emulated CPU drives the chip one byte at a time through the
//! [`Firmware`] capability; a WebSocket link to the game server is pumped
//! cooperatively from those calls, and an HTTP admin surface on its own
//! thread shares the same state record.

mod admin;
mod config;
mod dispatch;
mod engine;
mod link;
mod state;

pub use config::{DEFAULT_ADMIN_PORT, DEFAULT_SERVER_URL, FirmwareConfig};
pub use engine::{Firmware, FirmwareKind, RainbowFirmware};
