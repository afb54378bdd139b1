//! `grind_client`
//!
//! Client side of the room game:
//! - Input sampling into per-tick commands
//! - Fixed-tick prediction for the local player
//! - Interpolation of every other entity toward server state
//! - Entity lifecycle driven by room notifications
//! - Room transport (join handshake, reader/writer tasks)

pub mod console;
pub mod entities;
pub mod input;
pub mod interp;
pub mod room;
pub mod scene;

pub use room::{Room, RoomClient};
pub use scene::GameScene;
