//! Application state (Model in TEA pattern)

use std::sync::Arc;

use devdeck_core::{DataKind, DeviceId};

use crate::cache::{CacheStore, SystemClock};
use crate::config::Settings;
use crate::editor::EditorId;
use crate::panel::PanelState;

/// Current UI mode, derived from state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiMode {
    /// Panels, device and panel switching
    #[default]
    Dashboard,
    /// A settings editor modal is open on the active panel
    Editor,
}

/// Application lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppPhase {
    #[default]
    Running,
    Quitting,
}

/// Complete application state. Only `handler::update` writes to it.
#[derive(Debug)]
pub struct AppState {
    pub phase: AppPhase,
    pub settings: Settings,
    /// Devices cycled by the dashboard
    pub devices: Vec<DeviceId>,
    /// Index into `devices`, `None` when there are no devices
    pub selected_device: Option<usize>,
    /// One panel per [`DataKind`], in [`DataKind::ALL`] order
    pub panels: Vec<PanelState>,
    pub active_panel: usize,
    /// Shared by every panel
    pub cache: CacheStore,
    next_editor_id: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// State with a wall-clock cache built from `settings`
    pub fn with_settings(settings: Settings) -> Self {
        let cache = CacheStore::new(settings.cache.ttl_policy(), Arc::new(SystemClock));
        Self::with_cache(settings, cache)
    }

    pub fn with_cache(settings: Settings, cache: CacheStore) -> Self {
        let devices = settings.devices.known.clone();
        let selected_device = if devices.is_empty() { None } else { Some(0) };

        let mut panels: Vec<PanelState> = DataKind::ALL.into_iter().map(PanelState::new).collect();
        if let Some(device) = selected_device.map(|i| devices[i].clone()) {
            for panel in &mut panels {
                panel.reset_for(Some(device.clone()));
            }
        }

        Self {
            phase: AppPhase::Running,
            settings,
            devices,
            selected_device,
            panels,
            active_panel: 0,
            cache,
            next_editor_id: 0,
        }
    }

    pub fn ui_mode(&self) -> UiMode {
        if self.active_panel().editor.is_some() {
            UiMode::Editor
        } else {
            UiMode::Dashboard
        }
    }

    pub fn should_quit(&self) -> bool {
        self.phase == AppPhase::Quitting
    }

    pub fn current_device(&self) -> Option<&DeviceId> {
        self.selected_device.and_then(|i| self.devices.get(i))
    }

    pub fn active_panel(&self) -> &PanelState {
        &self.panels[self.active_panel]
    }

    pub fn active_panel_mut(&mut self) -> &mut PanelState {
        &mut self.panels[self.active_panel]
    }

    pub fn panel(&self, kind: DataKind) -> Option<&PanelState> {
        self.panels.iter().find(|p| p.kind == kind)
    }

    pub fn panel_mut(&mut self, kind: DataKind) -> Option<&mut PanelState> {
        self.panels.iter_mut().find(|p| p.kind == kind)
    }

    pub fn panel_index(&self, kind: DataKind) -> Option<usize> {
        self.panels.iter().position(|p| p.kind == kind)
    }

    /// Select the device at `index` and reset every panel to it
    pub fn select_device(&mut self, index: usize) {
        let Some(device) = self.devices.get(index).cloned() else {
            return;
        };
        self.selected_device = Some(index);
        for panel in &mut self.panels {
            panel.reset_for(Some(device.clone()));
        }
    }

    pub fn allocate_editor_id(&mut self) -> EditorId {
        self.next_editor_id += 1;
        EditorId(self.next_editor_id)
    }
}
