//! Settings editor handlers

use devdeck_core::prelude::*;
use devdeck_core::CacheKey;

use super::{UpdateAction, UpdateResult};
use crate::editor::{form_for, EditorId, EditorOutcome, EditorState};
use crate::message::Message;
use crate::panel::PanelState;
use crate::state::AppState;

/// Open the active panel's editor, seeded from the data on screen
pub fn handle_open(state: &mut AppState) -> UpdateResult {
    let panel = state.active_panel();
    if panel.editor.is_some() {
        return UpdateResult::none();
    }
    let kind = panel.kind;
    let Some(form) = form_for(kind) else {
        debug!("{} has no settings editor", kind);
        return UpdateResult::none();
    };
    let (Some(key), Some(payload)) = (panel.current_key(), panel.view.payload().cloned()) else {
        debug!("No {} data to edit yet", kind);
        return UpdateResult::none();
    };

    let id = state.allocate_editor_id();
    match EditorState::open(id, key, form, &payload) {
        Ok(editor) => {
            debug!("Opened {} for {}", id, editor.key);
            let panel = state.active_panel_mut();
            panel.editor = Some(editor);
            panel.last_saved = None;
        }
        Err(e) => warn!("Cannot edit {}: {}", kind, e),
    }
    UpdateResult::none()
}

/// Apply a field-level edit to the open editor, if any
pub fn with_editor(state: &mut AppState, f: impl FnOnce(&mut EditorState)) -> UpdateResult {
    if let Some(editor) = state.active_panel_mut().editor.as_mut() {
        f(editor);
    }
    UpdateResult::none()
}

pub fn handle_confirm(state: &mut AppState) -> UpdateResult {
    let timeout = state.settings.rpc.write_timeout();
    let panel = state.active_panel_mut();
    let Some(editor) = panel.editor.as_mut() else {
        return UpdateResult::none();
    };
    let outcome = editor.confirm();
    let (id, key) = (editor.id, editor.key.clone());
    apply_outcome(panel, outcome, id, key, timeout)
}

pub fn handle_cancel(state: &mut AppState) -> UpdateResult {
    let timeout = state.settings.rpc.write_timeout();
    let panel = state.active_panel_mut();
    let Some(editor) = panel.editor.as_mut() else {
        return UpdateResult::none();
    };
    let outcome = editor.cancel();
    let (id, key) = (editor.id, editor.key.clone());
    apply_outcome(panel, outcome, id, key, timeout)
}

fn apply_outcome(
    panel: &mut PanelState,
    outcome: EditorOutcome,
    editor: EditorId,
    key: CacheKey,
    timeout: std::time::Duration,
) -> UpdateResult {
    match outcome {
        EditorOutcome::Stay => UpdateResult::none(),
        EditorOutcome::Close { saved } => {
            debug!("Closed {} (saved={})", editor, saved);
            panel.close_editor(saved);
            UpdateResult::none()
        }
        EditorOutcome::Save { diff } => {
            info!("Saving {} field(s) to {}", diff.len(), key);
            UpdateResult::action(UpdateAction::SaveSettings {
                editor,
                key,
                diff,
                timeout,
            })
        }
        EditorOutcome::Destructive { action } => {
            info!("Running {} on {}", action.label(), key);
            UpdateResult::action(UpdateAction::RunDestructive {
                editor,
                key,
                action,
                timeout,
            })
        }
    }
}

pub fn handle_save_result(
    state: &mut AppState,
    id: EditorId,
    key: CacheKey,
    success: bool,
    err: Option<String>,
) -> UpdateResult {
    if let Some(e) = &err {
        warn!("Save to {} failed: {}", key, e);
    }
    apply_result(state, id, key, success, |editor| {
        editor.apply_save_result(success, err)
    })
}

pub fn handle_destructive_result(
    state: &mut AppState,
    id: EditorId,
    key: CacheKey,
    err: Option<String>,
) -> UpdateResult {
    if let Some(e) = &err {
        warn!("Destructive action on {} failed: {}", key, e);
    }
    let success = err.is_none();
    apply_result(state, id, key, success, |editor| {
        editor.apply_destructive_result(err)
    })
}

/// A write that reached the device invalidates its cache entry whether or
/// not the editor that sent it is still open. Only the editor with the
/// matching id sees the outcome.
fn apply_result(
    state: &mut AppState,
    id: EditorId,
    key: CacheKey,
    success: bool,
    apply: impl FnOnce(&mut EditorState) -> EditorOutcome,
) -> UpdateResult {
    if success {
        state.cache.invalidate(&key);
    }

    let Some(panel) = state.panel_mut(key.kind) else {
        return UpdateResult::none();
    };

    let outcome = match panel.editor.as_mut() {
        Some(editor) if editor.id == id && editor.key == key => Some(apply(editor)),
        _ => None,
    };
    match outcome {
        Some(EditorOutcome::Close { saved }) => panel.close_editor(saved),
        Some(_) => {}
        None => debug!("Discarding result for {}: editor no longer open", id),
    }

    if success && panel.shows(&key) {
        UpdateResult::message(Message::RequestData { kind: key.kind })
    } else {
        UpdateResult::none()
    }
}
