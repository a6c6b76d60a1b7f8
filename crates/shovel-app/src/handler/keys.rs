//! Keyboard rules

use crate::input_key::{InputKey, KeyEvent};
use crate::message::Message;
use crate::pager::Direction;
use crate::state::AppState;

/// Convert a key event to a message.
///
/// Keys typed into a text input or held with Alt are left to the page.
pub fn handle_key(state: &AppState, key: KeyEvent) -> Option<Message> {
    if key.in_text_input || key.modifiers.alt {
        return None;
    }

    if key.modifiers.ctrl && key.modifiers.shift && key.is_char_ignore_case('f') {
        return state
            .text_selection
            .clone()
            .map(Message::SubmitSearch);
    }

    if !key.is_plain() {
        return None;
    }

    match key.key {
        InputKey::Left => Some(Message::SelectAdjacent(Direction::Previous)),
        InputKey::Right => Some(Message::SelectAdjacent(Direction::Next)),
        InputKey::Esc if state.selected_flow.is_some() => Some(Message::ClearSelection),
        _ => None,
    }
}
