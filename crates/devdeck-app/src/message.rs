//! Message types for the application (TEA pattern)

use std::sync::Arc;

use devdeck_core::{CacheKey, DataKind, DeviceId, Payload};

use crate::editor::EditorId;
use crate::input_key::InputKey;

/// All possible messages in the application.
///
/// Input events come from the frontend; `RefreshComplete`, `SaveResult` and
/// `DestructiveActionResult` each come from exactly one dispatched action;
/// `CacheHit`/`CacheMiss` are follow-ups produced by `RequestData`.
#[derive(Debug, Clone)]
pub enum Message {
    /// Keyboard event from the frontend
    Key(InputKey),

    /// Periodic timer tick
    Tick,

    /// Request application quit
    Quit,

    // ─────────────────────────────────────────────────────────
    // Dashboard navigation
    // ─────────────────────────────────────────────────────────
    NextPanel,
    PreviousPanel,
    SelectPanel(DataKind),

    NextDevice,
    PreviousDevice,
    /// Show another device (added to the device list if new)
    SwitchDevice(DeviceId),

    // ─────────────────────────────────────────────────────────
    // Data freshness
    // ─────────────────────────────────────────────────────────
    /// Ask the cache for a panel's data on the current device
    RequestData { kind: DataKind },

    /// Drop the active panel's cache entry and fetch again
    ForceRefresh,

    /// Cached data served to a panel
    CacheHit {
        key: CacheKey,
        payload: Arc<Payload>,
        stale: bool,
    },

    /// Nothing cached for the key
    CacheMiss { key: CacheKey },

    /// A fetch finished (errors as strings so messages stay `Clone`).
    /// `generation` is the cache generation the fetch was dispatched under.
    RefreshComplete {
        key: CacheKey,
        generation: u64,
        result: Result<Arc<Payload>, String>,
    },

    // ─────────────────────────────────────────────────────────
    // Settings editor
    // ─────────────────────────────────────────────────────────
    /// Open the editor for the active panel
    OpenEditor,
    EditorNextField,
    EditorPreviousField,
    /// Flip a toggle / cycle a choice
    EditorToggle,
    /// Step a number or choice by `delta`
    EditorAdjust { delta: i64 },
    EditorInput(char),
    EditorBackspace,
    /// Enter / Ctrl+S
    EditorConfirm,
    /// Escape
    EditorCancel,

    /// A save dispatched by `editor` finished
    SaveResult {
        editor: EditorId,
        key: CacheKey,
        success: bool,
        err: Option<String>,
    },

    /// A destructive action dispatched by `editor` finished
    DestructiveActionResult {
        editor: EditorId,
        key: CacheKey,
        err: Option<String>,
    },
}
