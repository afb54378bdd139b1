//! Input handling.
//!
//! The host updates a [`KeyboardState`] from device events; once per fixed
//! tick the [`InputSampler`] turns it into a [`Command`]. Directions are level
//! triggered, the action key is edge triggered.

use std::collections::HashSet;

use grind_shared::net::Command;

/// Keys the scene cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    A,
    D,
    W,
    S,
    Left,
    Right,
    Up,
    Down,
    Space,
}

impl Key {
    /// Parses a console key name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name.to_ascii_lowercase().as_str() {
            "a" => Key::A,
            "d" => Key::D,
            "w" => Key::W,
            "s" => Key::S,
            "left" => Key::Left,
            "right" => Key::Right,
            "up" => Key::Up,
            "down" => Key::Down,
            "space" => Key::Space,
            _ => return None,
        };
        Some(key)
    }
}

/// Keys currently held down.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    down: HashSet<Key>,
}

impl KeyboardState {
    pub fn press(&mut self, key: Key) {
        self.down.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.down.remove(&key);
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.down.contains(&key)
    }

    fn any_down(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.is_down(*k))
    }
}

/// Which keys drive which command field.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub left: Vec<Key>,
    pub right: Vec<Key>,
    pub up: Vec<Key>,
    pub down: Vec<Key>,
    pub action: Vec<Key>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            left: vec![Key::A, Key::Left],
            right: vec![Key::D, Key::Right],
            up: vec![Key::W, Key::Up],
            down: vec![Key::S, Key::Down],
            action: vec![Key::Space],
        }
    }
}

/// Samples keyboard state into the per-tick command payload.
#[derive(Debug, Default)]
pub struct InputSampler {
    bindings: KeyBindings,
    payload: Command,
    action_was_down: bool,
}

impl InputSampler {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            payload: Command::default(),
            action_was_down: false,
        }
    }

    /// Refreshes the payload from `keys` and returns it.
    ///
    /// A pending action stays set until [`InputSampler::clear_action`].
    pub fn sample(&mut self, keys: &KeyboardState) -> Command {
        let b = &self.bindings;
        self.payload.move_left = keys.any_down(&b.left);
        self.payload.move_right = keys.any_down(&b.right);
        self.payload.move_up = keys.any_down(&b.up);
        self.payload.move_down = keys.any_down(&b.down);

        let action_down = keys.any_down(&b.action);
        if action_down && !self.action_was_down {
            self.payload.action_triggered = true;
        }
        self.action_was_down = action_down;

        self.payload
    }

    /// Called right after the command went out.
    pub fn clear_action(&mut self) {
        self.payload.action_triggered = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directional_and_cursor_keys_are_equivalent() {
        let mut sampler = InputSampler::default();
        let mut keys = KeyboardState::default();

        keys.press(Key::Left);
        assert!(sampler.sample(&keys).move_left);
        keys.release(Key::Left);
        keys.press(Key::A);
        assert!(sampler.sample(&keys).move_left);
        keys.release(Key::A);
        assert!(!sampler.sample(&keys).move_left);
    }

    #[test]
    fn action_fires_once_while_held() {
        let mut sampler = InputSampler::default();
        let mut keys = KeyboardState::default();
        keys.press(Key::Space);

        assert!(sampler.sample(&keys).action_triggered);
        sampler.clear_action();
        assert!(!sampler.sample(&keys).action_triggered);
        assert!(!sampler.sample(&keys).action_triggered);

        keys.release(Key::Space);
        assert!(!sampler.sample(&keys).action_triggered);
        keys.press(Key::Space);
        assert!(sampler.sample(&keys).action_triggered);
    }

    #[test]
    fn unsent_action_stays_pending() {
        let mut sampler = InputSampler::default();
        let mut keys = KeyboardState::default();
        keys.press(Key::Space);
        sampler.sample(&keys);
        keys.release(Key::Space);
        assert!(sampler.sample(&keys).action_triggered);
    }

    #[test]
    fn custom_bindings() {
        let mut sampler = InputSampler::new(KeyBindings {
            action: vec![Key::W],
            up: vec![Key::Up],
            ..KeyBindings::default()
        });
        let mut keys = KeyboardState::default();
        keys.press(Key::W);
        let cmd = sampler.sample(&keys);
        assert!(cmd.action_triggered);
        assert!(!cmd.move_up);
    }

    #[test]
    fn key_names_parse() {
        assert_eq!(Key::from_name("SPACE"), Some(Key::Space));
        assert_eq!(Key::from_name("left"), Some(Key::Left));
        assert_eq!(Key::from_name("q"), None);
    }
}
