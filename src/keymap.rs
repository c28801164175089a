use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::error::ConfigError;
use crate::session::Keystroke;

/// What a key press means to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Type(Keystroke),
    Restart,
    ToggleStats,
    Quit,
    Ignore,
}

/// A single key combination such as `ctrl+r` or `f5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    code: KeyCode,
    modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        // shift is implied by the character itself
        let pressed = key.modifiers.difference(KeyModifiers::SHIFT);
        let wanted = self.modifiers.difference(KeyModifiers::SHIFT);
        let code = match key.code {
            KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
            other => other,
        };
        code == self.code && pressed == wanted
    }

    /// Keys the typing test itself needs: typing, word boundary, backspace,
    /// the stats toggle and ctrl+c quit.
    pub fn is_reserved(&self) -> bool {
        let mods = self.modifiers.difference(KeyModifiers::SHIFT);
        match self.code {
            KeyCode::Tab | KeyCode::Backspace => true,
            KeyCode::Char('c') if mods == KeyModifiers::CONTROL => true,
            KeyCode::Char(c) => mods.is_empty() && !c.is_control(),
            _ => false,
        }
    }
}

impl FromStr for KeyBinding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ConfigError::KeyBinding(s.to_string());
        let lowered = s.trim().to_ascii_lowercase();
        let mut parts: Vec<&str> = lowered.split('+').map(str::trim).collect();
        let key = parts.pop().filter(|k| !k.is_empty()).ok_or_else(err)?;

        let mut modifiers = KeyModifiers::NONE;
        for part in parts {
            modifiers |= match part {
                "ctrl" | "control" => KeyModifiers::CONTROL,
                "alt" | "meta" => KeyModifiers::ALT,
                "shift" => KeyModifiers::SHIFT,
                _ => return Err(err()),
            };
        }

        let code = match key {
            "tab" => KeyCode::Tab,
            "esc" | "escape" => KeyCode::Esc,
            "enter" | "return" => KeyCode::Enter,
            "backspace" => KeyCode::Backspace,
            "space" => KeyCode::Char(' '),
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            f if f.len() > 1 && f.starts_with('f') => {
                let n: u8 = f[1..].parse().map_err(|_| err())?;
                if !(1..=12).contains(&n) {
                    return Err(err());
                }
                KeyCode::F(n)
            }
            c if c.chars().count() == 1 => KeyCode::Char(c.chars().next().ok_or_else(err)?),
            _ => return Err(err()),
        };

        Ok(Self { code, modifiers })
    }
}

/// Resolves raw key events into [`Command`]s.
#[derive(Debug, Clone)]
pub struct Keymap {
    restart: KeyBinding,
}

impl Keymap {
    pub fn new(restart: KeyBinding) -> Self {
        Self { restart }
    }

    pub fn resolve(&self, key: &KeyEvent) -> Command {
        if self.restart.matches(key) {
            return Command::Restart;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Char('c') if ctrl => Command::Quit,
            KeyCode::Esc => Command::Quit,
            KeyCode::Tab => Command::ToggleStats,
            KeyCode::Backspace => Command::Type(Keystroke::Backspace),
            KeyCode::Char(' ') if !ctrl && !alt => Command::Type(Keystroke::Boundary),
            KeyCode::Char(c) if !ctrl && !alt && !c.is_control() => {
                Command::Type(Keystroke::Char(c))
            }
            _ => Command::Ignore,
        }
    }
}
