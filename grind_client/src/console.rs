//! Console commands for the headless client.
//!
//! Stands in for a keyboard: lines typed on stdin press and release keys.

use crate::input::Key;

/// A parsed console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Press(Key),
    Release(Key),
    /// Press now, release after the next frame.
    Tap(Key),
    ToggleInventory,
    Status,
    Quit,
}

impl ConsoleCommand {
    /// Parses one line. `Ok(None)` for a blank line, `Err` carries a usage hint.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&head) = tokens.first() else {
            return Ok(None);
        };

        let key_arg = |usage: &str| -> Result<Key, String> {
            let name = tokens.get(1).ok_or_else(|| format!("Usage: {usage} <key>"))?;
            Key::from_name(name).ok_or_else(|| format!("Unknown key '{name}'"))
        };

        let cmd = match head {
            "press" => Self::Press(key_arg("press")?),
            "release" => Self::Release(key_arg("release")?),
            "tap" => Self::Tap(key_arg("tap")?),
            "inventory" | "inv" => Self::ToggleInventory,
            "status" => Self::Status,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("Unknown command '{other}'")),
        };
        Ok(Some(cmd))
    }
}
