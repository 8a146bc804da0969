use std::fmt;
use std::str::FromStr;

/// A physical key as reported by the input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Ctrl,
    Alt,
    Shift,
    Meta,
    /// Printable key, always stored lowercase.
    Char(char),
    /// Focus loss or an explicit reset; releases every held modifier.
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Down(Key),
    Up(Key),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    fn set(&mut self, key: Key, pressed: bool) -> bool {
        match key {
            Key::Ctrl => self.ctrl = pressed,
            Key::Alt => self.alt = pressed,
            Key::Shift => self.shift = pressed,
            Key::Meta => self.meta = pressed,
            Key::Char(_) | Key::Escape => return false,
        }
        true
    }

    fn keys(self) -> Vec<Key> {
        let mut keys = Vec::with_capacity(4);
        if self.ctrl {
            keys.push(Key::Ctrl);
        }
        if self.alt {
            keys.push(Key::Alt);
        }
        if self.shift {
            keys.push(Key::Shift);
        }
        if self.meta {
            keys.push(Key::Meta);
        }
        keys
    }
}

/// User-facing actions reachable from the key bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Scan the current page and append new links to the queue.
    Harvest,
    CopyQueue,
    ClearQueue,
    PreviewQueue,
}

/// A modifier combination plus one printable key, e.g. `Ctrl+Alt+H`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub modifiers: Modifiers,
    pub key: char,
}

impl KeyChord {
    pub const fn new(modifiers: Modifiers, key: char) -> Self {
        Self {
            modifiers,
            key: key.to_ascii_lowercase(),
        }
    }

    /// Expands the chord into the press/release sequence a keyboard would produce.
    pub fn key_events(&self) -> Vec<KeyEvent> {
        let modifier_keys = self.modifiers.keys();
        let mut events = Vec::with_capacity(modifier_keys.len() * 2 + 2);
        events.extend(modifier_keys.iter().copied().map(KeyEvent::Down));
        events.push(KeyEvent::Down(Key::Char(self.key)));
        events.push(KeyEvent::Up(Key::Char(self.key)));
        events.extend(modifier_keys.iter().rev().copied().map(KeyEvent::Up));
        events
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in self.modifiers.keys() {
            let label = match key {
                Key::Ctrl => "Ctrl",
                Key::Alt => "Alt",
                Key::Shift => "Shift",
                Key::Meta => "Meta",
                Key::Char(_) | Key::Escape => continue,
            };
            write!(f, "{label}+")?;
        }
        write!(f, "{}", self.key.to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseChordError {
    #[error("empty key chord")]
    Empty,
    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),
    #[error("key `{0}` is not a single printable character")]
    InvalidKey(String),
}

impl FromStr for KeyChord {
    type Err = ParseChordError;

    /// Parses chords such as `ctrl+alt+h` (case-insensitive, `+` or `-` separated).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw
            .split(['+', '-'])
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        let (key_part, modifier_parts) = parts.split_last().ok_or(ParseChordError::Empty)?;

        let mut modifiers = Modifiers::default();
        for part in modifier_parts {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "meta" | "cmd" | "super" => modifiers.meta = true,
                other => return Err(ParseChordError::UnknownModifier(other.to_string())),
            }
        }

        let mut chars = key_part.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if !ch.is_control() => Ok(KeyChord::new(modifiers, ch)),
            _ => Err(ParseChordError::InvalidKey((*key_part).to_string())),
        }
    }
}

const CTRL_ALT: Modifiers = Modifiers {
    ctrl: true,
    alt: true,
    shift: false,
    meta: false,
};

/// Ordered chord-to-command table; the first matching entry wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    entries: Vec<(KeyChord, Command)>,
}

impl KeyBindings {
    pub fn new(entries: Vec<(KeyChord, Command)>) -> Self {
        Self { entries }
    }

    pub fn lookup(&self, chord: &KeyChord) -> Option<Command> {
        self.entries
            .iter()
            .find(|(bound, _)| bound == chord)
            .map(|(_, command)| *command)
    }

    pub fn entries(&self) -> &[(KeyChord, Command)] {
        &self.entries
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new(vec![
            (KeyChord::new(CTRL_ALT, 'h'), Command::Harvest),
            (KeyChord::new(CTRL_ALT, 'c'), Command::CopyQueue),
            (KeyChord::new(CTRL_ALT, 'x'), Command::ClearQueue),
            (KeyChord::new(CTRL_ALT, 'v'), Command::PreviewQueue),
        ])
    }
}

/// Modifier keys currently held down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    modifiers: Modifiers,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }
}

/// Applies one key event to the input state and returns the bound command, if any.
///
/// Commands fire on key-down of a printable key; modifier events only update state.
pub fn dispatch(input: &mut InputState, event: KeyEvent, bindings: &KeyBindings) -> Option<Command> {
    match event {
        KeyEvent::Down(Key::Escape) | KeyEvent::Up(Key::Escape) => {
            input.modifiers = Modifiers::default();
            None
        }
        KeyEvent::Down(Key::Char(ch)) => {
            let chord = KeyChord::new(input.modifiers, ch);
            bindings.lookup(&chord)
        }
        KeyEvent::Up(Key::Char(_)) => None,
        KeyEvent::Down(key) => {
            input.modifiers.set(key, true);
            None
        }
        KeyEvent::Up(key) => {
            input.modifiers.set(key, false);
            None
        }
    }
}
