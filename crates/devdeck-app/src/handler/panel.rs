//! Data freshness, panel and device switching handlers

use std::sync::Arc;

use devdeck_core::prelude::*;
use devdeck_core::{CacheKey, DataKind, DeviceId, Payload};

use super::{UpdateAction, UpdateResult};
use crate::cache::RefreshDecision;
use crate::message::Message;
use crate::state::{AppState, UiMode};

/// Serve a panel from the cache, dispatching a fetch when the cache says so
pub fn handle_request_data(state: &mut AppState, kind: DataKind) -> UpdateResult {
    let Some(index) = state.panel_index(kind) else {
        return UpdateResult::none();
    };
    let timeout = state.settings.rpc.read_timeout();

    let panel = &state.panels[index];
    let Some(key) = panel.current_key() else {
        return UpdateResult::none();
    };
    // A refresh racing a write on the same key would show pre-write data
    let allow_fetch = !panel.is_mutating();
    let Some(decision) = panel.request(&mut state.cache, allow_fetch) else {
        return UpdateResult::none();
    };

    let generation = state.cache.generation(&key);
    let action = decision.should_fetch().then(|| UpdateAction::FetchData {
        key: key.clone(),
        generation,
        background: decision.is_background(),
        timeout,
    });

    let message = match decision {
        RefreshDecision::Hit { payload } => Message::CacheHit {
            key,
            payload,
            stale: false,
        },
        RefreshDecision::StaleHit { payload, .. } => Message::CacheHit {
            key,
            payload,
            stale: true,
        },
        RefreshDecision::Miss { .. } => Message::CacheMiss { key },
    };

    UpdateResult::message(message).with_action(action)
}

pub fn handle_cache_hit(
    state: &mut AppState,
    key: CacheKey,
    payload: Arc<Payload>,
    stale: bool,
) -> UpdateResult {
    let refreshing = state.cache.is_refreshing(&key);
    if let Some(panel) = state.panel_mut(key.kind) {
        if panel.shows(&key) {
            panel.apply_cache_hit(payload, stale, refreshing);
        }
    }
    UpdateResult::none()
}

pub fn handle_cache_miss(state: &mut AppState, key: CacheKey) -> UpdateResult {
    if let Some(panel) = state.panel_mut(key.kind) {
        if panel.shows(&key) {
            panel.apply_cache_miss();
        }
    }
    UpdateResult::none()
}

/// Apply a finished fetch: the cache unless the key was invalidated since
/// dispatch, the panel only if it still shows the key the fetch was for
pub fn handle_refresh_complete(
    state: &mut AppState,
    key: CacheKey,
    generation: u64,
    result: std::result::Result<Arc<Payload>, String>,
) -> UpdateResult {
    let Some(index) = state.panel_index(key.kind) else {
        return UpdateResult::none();
    };

    let coordinator = *state.panels[index].coordinator();
    let Some(result) = coordinator.complete(&mut state.cache, &key, generation, result) else {
        return UpdateResult::none();
    };

    let panel = &mut state.panels[index];
    if !panel.shows(&key) {
        debug!("Ignoring reply for {}: panel moved on", key);
        return UpdateResult::none();
    }
    panel.apply_refresh(result);
    UpdateResult::none()
}

pub fn handle_force_refresh(state: &mut AppState) -> UpdateResult {
    let panel = state.active_panel();
    if panel.is_mutating() {
        return UpdateResult::none();
    }
    let Some(key) = panel.current_key() else {
        return UpdateResult::none();
    };
    let kind = panel.kind;

    debug!("Force refresh {}", key);
    state.cache.invalidate(&key);
    UpdateResult::message(Message::RequestData { kind })
}

/// Revalidate the active panel. Free on a fresh hit; coalesced when stale.
pub fn handle_tick(state: &mut AppState) -> UpdateResult {
    if !state.settings.behavior.revalidate_on_tick
        || state.ui_mode() != UiMode::Dashboard
        || state.current_device().is_none()
    {
        return UpdateResult::none();
    }
    UpdateResult::message(Message::RequestData {
        kind: state.active_panel().kind,
    })
}

pub fn handle_cycle_panel(state: &mut AppState, delta: isize) -> UpdateResult {
    if state.ui_mode() == UiMode::Editor {
        return UpdateResult::none();
    }
    let len = state.panels.len() as isize;
    state.active_panel = (state.active_panel as isize + delta).rem_euclid(len) as usize;
    UpdateResult::message(Message::RequestData {
        kind: state.active_panel().kind,
    })
}

pub fn handle_select_panel(state: &mut AppState, kind: DataKind) -> UpdateResult {
    if state.ui_mode() == UiMode::Editor {
        return UpdateResult::none();
    }
    let Some(index) = state.panel_index(kind) else {
        return UpdateResult::none();
    };
    state.active_panel = index;
    UpdateResult::message(Message::RequestData { kind })
}

pub fn handle_cycle_device(state: &mut AppState, delta: isize) -> UpdateResult {
    if state.devices.is_empty() {
        return UpdateResult::none();
    }
    let len = state.devices.len() as isize;
    let current = state.selected_device.unwrap_or(0) as isize;
    let next = (current + delta).rem_euclid(len) as usize;
    select_device(state, next)
}

pub fn handle_switch_device(state: &mut AppState, device: DeviceId) -> UpdateResult {
    let index = match state.devices.iter().position(|d| *d == device) {
        Some(index) => index,
        None => {
            state.devices.push(device);
            state.devices.len() - 1
        }
    };
    select_device(state, index)
}

/// Commands already dispatched for the old device are not cancelled; their
/// replies fail the panel key check and are ignored.
fn select_device(state: &mut AppState, index: usize) -> UpdateResult {
    state.select_device(index);
    if let Some(device) = state.current_device() {
        info!("Showing device {}", device);
    }
    UpdateResult::message(Message::RequestData {
        kind: state.active_panel().kind,
    })
}
