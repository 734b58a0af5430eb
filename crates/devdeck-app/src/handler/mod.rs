//! Handler module - TEA update function and event handlers
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `keys`: Key event handlers for UI modes
//! - `panel`: Data freshness, panel and device switching
//! - `editor`: Settings editor handlers

pub(crate) mod editor;
pub(crate) mod keys;
pub(crate) mod panel;
pub(crate) mod update;


use std::time::Duration;

use devdeck_core::{CacheKey, DestructiveAction, SettingsDiff};

use crate::editor::EditorId;
use crate::message::Message;

// Re-export main entry point
pub use update::update;

#[cfg(test)]
pub(crate) use keys::handle_key;

/// Commands for the event loop to execute off the reconciler.
///
/// Each one runs as its own task and reports back with exactly one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateAction {
    /// Fetch `key` from the device; replies with `RefreshComplete`
    FetchData {
        key: CacheKey,
        /// Cache generation of `key` when the fetch was claimed
        generation: u64,
        /// Stale data is already on screen
        background: bool,
        timeout: Duration,
    },

    /// Write changed settings; replies with `SaveResult`
    SaveSettings {
        editor: EditorId,
        key: CacheKey,
        diff: SettingsDiff,
        timeout: Duration,
    },

    /// Run a confirmed destructive action; replies with
    /// `DestructiveActionResult`
    RunDestructive {
        editor: EditorId,
        key: CacheKey,
        action: DestructiveAction,
        timeout: Duration,
    },
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Optional action for the event loop to perform
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }

    pub fn with_action(mut self, action: Option<UpdateAction>) -> Self {
        self.action = action;
        self
    }
}
