//! Main update function - handles state transitions (TEA pattern)

use devdeck_core::prelude::*;

use super::{editor, keys, panel, UpdateResult};
use crate::message::Message;
use crate::state::{AppPhase, AppState};

/// Process a message and update state.
///
/// Never performs I/O: anything that must talk to a device is returned as an
/// action for the event loop to dispatch.
pub fn update(state: &mut AppState, message: Message) -> UpdateResult {
    match message {
        Message::Key(key) => keys::handle_key(state, key)
            .map(UpdateResult::message)
            .unwrap_or_default(),

        Message::Tick => panel::handle_tick(state),

        Message::Quit => {
            info!("Quit requested");
            state.phase = AppPhase::Quitting;
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Panels and devices
        // ─────────────────────────────────────────────────────────
        Message::NextPanel => panel::handle_cycle_panel(state, 1),
        Message::PreviousPanel => panel::handle_cycle_panel(state, -1),
        Message::SelectPanel(kind) => panel::handle_select_panel(state, kind),

        Message::NextDevice => panel::handle_cycle_device(state, 1),
        Message::PreviousDevice => panel::handle_cycle_device(state, -1),
        Message::SwitchDevice(device) => panel::handle_switch_device(state, device),

        // ─────────────────────────────────────────────────────────
        // Data freshness
        // ─────────────────────────────────────────────────────────
        Message::RequestData { kind } => panel::handle_request_data(state, kind),
        Message::ForceRefresh => panel::handle_force_refresh(state),
        Message::CacheHit {
            key,
            payload,
            stale,
        } => panel::handle_cache_hit(state, key, payload, stale),
        Message::CacheMiss { key } => panel::handle_cache_miss(state, key),
        Message::RefreshComplete {
            key,
            generation,
            result,
        } => panel::handle_refresh_complete(state, key, generation, result),

        // ─────────────────────────────────────────────────────────
        // Settings editor
        // ─────────────────────────────────────────────────────────
        Message::OpenEditor => editor::handle_open(state),
        Message::EditorNextField => editor::with_editor(state, |e| e.next_field()),
        Message::EditorPreviousField => editor::with_editor(state, |e| e.previous_field()),
        Message::EditorToggle => editor::with_editor(state, |e| e.toggle()),
        Message::EditorAdjust { delta } => editor::with_editor(state, |e| e.adjust(delta)),
        Message::EditorInput(c) => editor::with_editor(state, |e| e.input_char(c)),
        Message::EditorBackspace => editor::with_editor(state, |e| e.backspace()),
        Message::EditorConfirm => editor::handle_confirm(state),
        Message::EditorCancel => editor::handle_cancel(state),
        Message::SaveResult {
            editor: id,
            key,
            success,
            err,
        } => editor::handle_save_result(state, id, key, success, err),
        Message::DestructiveActionResult {
            editor: id,
            key,
            err,
        } => editor::handle_destructive_result(state, id, key, err),
    }
}
