use crate::config::{ConfigError, KeyBinds};
use crate::controller::{Input, Mode};
use crate::input::Edit;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// A single key chord such as `ctrl+c` or `k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    code: KeyCode,
    modifiers: KeyModifiers,
}

/// Translates terminal key events into controller inputs.
#[derive(Debug, Clone)]
pub struct Keymap {
    browse: Vec<(KeyBinding, Input)>,
}

impl KeyBinding {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidKey(raw.to_string());
        let mut modifiers = KeyModifiers::NONE;
        let mut parts: Vec<&str> = raw.split('+').collect();
        // "+" on its own, or a chord ending in "+", binds the plus key.
        if raw.ends_with('+') {
            parts.retain(|p| !p.is_empty());
            parts.push("+");
        }
        let key = parts.pop().filter(|k| !k.is_empty()).ok_or_else(invalid)?;
        for modifier in parts {
            modifiers |= match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => KeyModifiers::CONTROL,
                "alt" => KeyModifiers::ALT,
                "shift" => KeyModifiers::SHIFT,
                _ => return Err(invalid()),
            };
        }
        let code = match key.to_ascii_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "backtab" => KeyCode::BackTab,
            "space" => KeyCode::Char(' '),
            "backspace" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" => KeyCode::PageUp,
            "pagedown" => KeyCode::PageDown,
            other => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => KeyCode::Char(ch),
                    _ => match other.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                        Some(n) if (1..=12).contains(&n) => KeyCode::F(n),
                        _ => return Err(invalid()),
                    },
                }
            }
        };
        let code = match code {
            // Terminals report shifted letters as the uppercase char.
            KeyCode::Char(ch) if modifiers.contains(KeyModifiers::SHIFT) => {
                if !ch.is_ascii_alphabetic() {
                    return Err(invalid());
                }
                modifiers.remove(KeyModifiers::SHIFT);
                KeyCode::Char(ch.to_ascii_uppercase())
            }
            other => other,
        };
        Ok(KeyBinding { code, modifiers })
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        normalize(key) == (self.code, self.modifiers)
    }
}

impl Keymap {
    pub fn from_config(binds: &KeyBinds) -> Result<Self, ConfigError> {
        let groups: [(&[String], Input); 7] = [
            (&binds.quit, Input::Quit),
            (&binds.up, Input::Up),
            (&binds.down, Input::Down),
            (&binds.focus, Input::ToggleFocus),
            (&binds.toggle, Input::ToggleStatus),
            (&binds.add, Input::Add),
            (&binds.delete, Input::Delete),
        ];
        let mut browse = Vec::new();
        for (keys, input) in groups {
            for raw in keys {
                browse.push((KeyBinding::parse(raw)?, input));
            }
        }
        Ok(Keymap { browse })
    }

    pub fn resolve(&self, mode: Mode, key: &KeyEvent) -> Option<Input> {
        match mode {
            Mode::Browse => self
                .browse
                .iter()
                .find(|(binding, _)| binding.matches(key))
                .map(|(_, input)| *input),
            Mode::Compose => compose_input(key),
        }
    }
}

fn compose_input(key: &KeyEvent) -> Option<Input> {
    let control = key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    let input = match key.code {
        KeyCode::Enter => Input::Confirm,
        KeyCode::Esc => Input::Cancel,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Input::Cancel,
        KeyCode::Backspace => Input::Edit(Edit::Backspace),
        KeyCode::Delete => Input::Edit(Edit::Delete),
        KeyCode::Left => Input::Edit(Edit::Left),
        KeyCode::Right => Input::Edit(Edit::Right),
        KeyCode::Home => Input::Edit(Edit::Home),
        KeyCode::End => Input::Edit(Edit::End),
        KeyCode::Char(ch) if !control => Input::Edit(Edit::Insert(ch)),
        _ => return None,
    };
    Some(input)
}

// Shift is already folded into the character for printable keys.
fn normalize(key: &KeyEvent) -> (KeyCode, KeyModifiers) {
    match key.code {
        KeyCode::Char(_) => (key.code, key.modifiers - KeyModifiers::SHIFT),
        _ => (key.code, key.modifiers),
    }
}
