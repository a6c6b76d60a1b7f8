//! Abstract key event, independent of any UI toolkit.
//!
//! Frontends convert their native key events into [`KeyEvent`] at the
//! boundary; the controller only reads the fields its keyboard rules need.

use serde::Deserialize;

/// Key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKey {
    /// Left arrow key
    Left,
    /// Right arrow key
    Right,
    /// Escape key
    Esc,
    /// Character key, case as typed
    Char(char),
}

/// Modifier keys held with a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

/// A key press as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct KeyEvent {
    pub key: InputKey,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Focus was in a text input when the key was pressed.
    #[serde(default)]
    pub in_text_input: bool,
}

impl KeyEvent {
    pub fn new(key: InputKey) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
            in_text_input: false,
        }
    }

    pub fn with_ctrl_shift(mut self) -> Self {
        self.modifiers.ctrl = true;
        self.modifiers.shift = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.modifiers.alt = true;
        self
    }

    pub fn in_text_input(mut self) -> Self {
        self.in_text_input = true;
        self
    }

    /// Neither Ctrl nor Shift held.
    pub fn is_plain(&self) -> bool {
        !self.modifiers.ctrl && !self.modifiers.shift
    }

    pub fn is_char_ignore_case(&self, c: char) -> bool {
        matches!(self.key, InputKey::Char(k) if k.eq_ignore_ascii_case(&c))
    }
}
