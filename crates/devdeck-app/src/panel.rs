//! Per-kind panel model
//!
//! A panel shows one data kind for the currently selected device. Every
//! reply that reaches a panel is checked against the key it is showing right
//! now; a mismatch means the panel moved on and the reply is ignored.

use std::sync::Arc;

use devdeck_core::{CacheKey, DataKind, DeviceId, Payload};

use crate::cache::{CacheStore, RefreshCoordinator, RefreshDecision};
use crate::editor::EditorState;

/// What the panel body displays
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PanelView {
    /// No device selected
    #[default]
    Empty,
    /// First fetch in flight, nothing cached
    Loading,
    Ready {
        payload: Arc<Payload>,
        stale: bool,
    },
    /// Nothing cached and the last fetch failed
    Unavailable { error: String },
}

impl PanelView {
    pub fn payload(&self) -> Option<&Arc<Payload>> {
        match self {
            PanelView::Ready { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PanelState {
    pub kind: DataKind,
    /// Device whose data this panel currently shows
    pub device: Option<DeviceId>,
    pub view: PanelView,
    /// Last background refresh error, shown next to stale data
    pub last_error: Option<String>,
    /// A background refresh for the shown key is in flight
    pub refreshing: bool,
    pub editor: Option<EditorState>,
    /// Result of the last closed editor (`true` when it saved)
    pub last_saved: Option<bool>,
    coordinator: RefreshCoordinator,
}

impl PanelState {
    pub fn new(kind: DataKind) -> Self {
        Self {
            kind,
            device: None,
            view: PanelView::Empty,
            last_error: None,
            refreshing: false,
            editor: None,
            last_saved: None,
            coordinator: RefreshCoordinator::new(kind),
        }
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub fn current_key(&self) -> Option<CacheKey> {
        self.device
            .as_ref()
            .map(|device| self.coordinator.key_for(device))
    }

    /// Stale-reply guard: is this panel still showing `key`?
    pub fn shows(&self, key: &CacheKey) -> bool {
        key.kind == self.kind && self.device.as_ref() == Some(&key.device)
    }

    /// Point the panel at another device, dropping everything local
    pub fn reset_for(&mut self, device: Option<DeviceId>) {
        self.device = device;
        self.view = PanelView::Empty;
        self.last_error = None;
        self.refreshing = false;
        self.editor = None;
        self.last_saved = None;
    }

    /// Ask the cache for this panel's data. `allow_fetch = false` serves
    /// whatever is cached without claiming a fetch.
    pub fn request(&self, store: &mut CacheStore, allow_fetch: bool) -> Option<RefreshDecision> {
        let device = self.device.as_ref()?;
        Some(if allow_fetch {
            self.coordinator.request(store, device)
        } else {
            self.coordinator.peek(store, device)
        })
    }

    /// A mutation for this panel's key is in flight
    pub fn is_mutating(&self) -> bool {
        self.editor.as_ref().is_some_and(EditorState::is_saving)
    }

    pub fn apply_cache_hit(&mut self, payload: Arc<Payload>, stale: bool, refreshing: bool) {
        self.view = PanelView::Ready { payload, stale };
        self.refreshing = refreshing;
    }

    pub fn apply_cache_miss(&mut self) {
        if !matches!(self.view, PanelView::Ready { .. }) {
            self.view = PanelView::Loading;
        }
        self.refreshing = false;
    }

    /// Show the outcome of a finished fetch. Failures keep stale data on
    /// screen and only blank the panel when nothing was cached.
    pub fn apply_refresh(&mut self, result: std::result::Result<Arc<Payload>, String>) {
        self.refreshing = false;
        match result {
            Ok(payload) => {
                self.view = PanelView::Ready {
                    payload,
                    stale: false,
                };
                self.last_error = None;
            }
            Err(error) => match self.view {
                PanelView::Ready { .. } => self.last_error = Some(error),
                _ => self.view = PanelView::Unavailable { error },
            },
        }
    }

    /// Close the editor, remembering whether it saved
    pub fn close_editor(&mut self, saved: bool) {
        self.editor = None;
        self.last_saved = Some(saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devdeck_core::SystemInfo;

    fn info(host: &str) -> Arc<Payload> {
        Arc::new(Payload::SystemInfo(SystemInfo {
            hostname: host.into(),
            ..Default::default()
        }))
    }

    fn panel_on(device: &str) -> PanelState {
        let mut panel = PanelState::new(DataKind::SystemInfo);
        panel.reset_for(Some(device.into()));
        panel
    }

    #[test]
    fn test_shows_matches_device_and_kind() {
        let panel = panel_on("a");
        assert!(panel.shows(&CacheKey::new("a", DataKind::SystemInfo)));
        assert!(!panel.shows(&CacheKey::new("b", DataKind::SystemInfo)));
        assert!(!panel.shows(&CacheKey::new("a", DataKind::BleStatus)));
        assert!(!PanelState::new(DataKind::SystemInfo)
            .shows(&CacheKey::new("a", DataKind::SystemInfo)));
    }

    #[test]
    fn test_refresh_error_keeps_stale_data() {
        let mut panel = panel_on("a");
        panel.apply_cache_hit(info("old"), true, true);

        panel.apply_refresh(Err("timeout".into()));

        assert_eq!(panel.view.payload(), Some(&info("old")));
        assert_eq!(panel.last_error.as_deref(), Some("timeout"));
        assert!(!panel.refreshing);
    }

    #[test]
    fn test_refresh_error_without_data_is_unavailable() {
        let mut panel = panel_on("a");
        panel.apply_cache_miss();
        assert_eq!(panel.view, PanelView::Loading);

        panel.apply_refresh(Err("unreachable".into()));

        assert_eq!(
            panel.view,
            PanelView::Unavailable {
                error: "unreachable".into()
            }
        );
    }

    #[test]
    fn test_refresh_success_clears_error() {
        let mut panel = panel_on("a");
        panel.apply_cache_hit(info("old"), true, true);
        panel.apply_refresh(Err("timeout".into()));

        panel.apply_refresh(Ok(info("new")));

        assert_eq!(
            panel.view,
            PanelView::Ready {
                payload: info("new"),
                stale: false
            }
        );
        assert!(panel.last_error.is_none());
    }

    #[test]
    fn test_reset_drops_local_state() {
        let mut panel = panel_on("a");
        panel.apply_cache_hit(info("old"), false, false);
        panel.last_saved = Some(true);

        panel.reset_for(Some("b".into()));

        assert_eq!(panel.view, PanelView::Empty);
        assert_eq!(panel.device, Some(DeviceId::new("b")));
        assert!(panel.last_saved.is_none());
    }
}
