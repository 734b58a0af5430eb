//! Key event handlers for each UI mode

use devdeck_core::DataKind;

use crate::input_key::InputKey;
use crate::message::Message;
use crate::state::{AppState, UiMode};

/// Convert key events to messages based on current UI mode
pub fn handle_key(state: &AppState, key: InputKey) -> Option<Message> {
    match state.ui_mode() {
        UiMode::Dashboard => handle_key_dashboard(key),
        UiMode::Editor => handle_key_editor(key),
    }
}

/// Handle key events on the dashboard
fn handle_key_dashboard(key: InputKey) -> Option<Message> {
    match key {
        InputKey::Char('q') | InputKey::CharCtrl('c') => Some(Message::Quit),

        // Panels
        InputKey::Tab | InputKey::Right | InputKey::Char('l') => Some(Message::NextPanel),
        InputKey::BackTab | InputKey::Left | InputKey::Char('h') => Some(Message::PreviousPanel),
        InputKey::Char(c @ '1'..='9') => {
            let index = c.to_digit(10)? as usize - 1;
            DataKind::ALL.get(index).copied().map(Message::SelectPanel)
        }

        // Devices
        InputKey::Char('d') | InputKey::Char(']') => Some(Message::NextDevice),
        InputKey::Char('D') | InputKey::Char('[') => Some(Message::PreviousDevice),

        InputKey::Char('r') => Some(Message::ForceRefresh),
        InputKey::Enter | InputKey::Char('e') => Some(Message::OpenEditor),

        _ => None,
    }
}

/// Handle key events while a settings editor is open
fn handle_key_editor(key: InputKey) -> Option<Message> {
    match key {
        InputKey::CharCtrl('c') => Some(Message::Quit),

        InputKey::Enter | InputKey::CharCtrl('s') => Some(Message::EditorConfirm),
        InputKey::Esc => Some(Message::EditorCancel),

        InputKey::Down | InputKey::Tab => Some(Message::EditorNextField),
        InputKey::Up | InputKey::BackTab => Some(Message::EditorPreviousField),

        InputKey::Left => Some(Message::EditorAdjust { delta: -1 }),
        InputKey::Right => Some(Message::EditorAdjust { delta: 1 }),

        InputKey::Char(' ') => Some(Message::EditorToggle),
        InputKey::Char(c) => Some(Message::EditorInput(c)),
        InputKey::Backspace => Some(Message::EditorBackspace),

        _ => None,
    }
}
