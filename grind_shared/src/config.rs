//! Configuration system.
//!
//! Loads client configuration from JSON strings/files. Every field has a
//! default so a partial file is valid.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Root configuration for the room client and its scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Room server address, e.g. `127.0.0.1:2567`.
    pub server_addr: String,
    /// Name of the room to join or create.
    pub room_name: String,
    /// Fixed simulation tick rate.
    pub tick_hz: u32,
    /// Render frame rate of the headless host.
    pub frame_hz: u32,
    /// Fraction of the remaining distance to the server position closed per tick.
    pub blend_factor: f32,
    /// Local prediction speed, in units per tick.
    pub move_speed: f32,
    /// Texture used for player sprites.
    pub player_texture: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:2567".to_string(),
            room_name: "main_room_grind".to_string(),
            tick_hz: 60,
            frame_hz: 60,
            blend_factor: 0.2,
            move_speed: 2.0,
            player_texture: "player".to_string(),
        }
    }
}

impl ClientConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    /// Length of one fixed tick, truncated to whole nanoseconds.
    pub fn fixed_step(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.tick_hz.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = ClientConfig::from_json_str(r#"{ "room_name": "arena" }"#).unwrap();
        assert_eq!(cfg.room_name, "arena");
        assert_eq!(cfg.tick_hz, 60);
        assert_eq!(cfg.blend_factor, 0.2);
        assert_eq!(cfg.server_addr, "127.0.0.1:2567");
    }

    #[test]
    fn fixed_step_is_sixtieth_of_a_second() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.fixed_step(), Duration::from_nanos(16_666_666));
    }

    #[test]
    fn zero_tick_rate_does_not_divide_by_zero() {
        let cfg = ClientConfig {
            tick_hz: 0,
            ..ClientConfig::default()
        };
        assert_eq!(cfg.fixed_step(), Duration::from_secs(1));
    }
}
