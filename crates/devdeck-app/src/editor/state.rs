//! Per-modal editor state machine
//!
//! Phases are `Idle`, `PendingConfirm` and `Saving`. Edits touch `pending`
//! only; `committed` changes only when the device accepts a save. At most
//! one write is outstanding per editor, since every edit and confirm is
//! refused while `Saving`.

use devdeck_core::prelude::*;
use devdeck_core::{CacheKey, DestructiveAction, Payload, SettingValue, SettingsDiff, SettingsValues};

use super::form::{FieldKind, FieldSpec, SettingsForm};

/// Identity of one opened editor; replies carry it back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EditorId(pub u64);

impl std::fmt::Display for EditorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "editor#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditorPhase {
    #[default]
    Idle,
    /// A destructive field was confirmed once; the next key decides
    PendingConfirm,
    /// A write is in flight
    Saving,
}

/// What the caller must do after an editor transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOutcome {
    /// State changed (or not); nothing else to do
    Stay,
    /// Close the modal
    Close { saved: bool },
    /// Dispatch a save of these changes
    Save { diff: SettingsDiff },
    /// Dispatch this destructive action
    Destructive { action: DestructiveAction },
}

#[derive(Debug, Clone)]
pub struct EditorState {
    pub id: EditorId,
    /// Cache key of the data being edited
    pub key: CacheKey,
    form: &'static dyn SettingsForm,
    pub cursor: usize,
    pub committed: SettingsValues,
    pub pending: SettingsValues,
    pub phase: EditorPhase,
    /// Last validation or save error, shown inline
    pub err: Option<String>,
}

impl EditorState {
    /// Open an editor seeded from the current remote state
    pub fn open(
        id: EditorId,
        key: CacheKey,
        form: &'static dyn SettingsForm,
        payload: &Payload,
    ) -> Result<Self> {
        let committed = form.values_from(payload)?;
        Ok(Self {
            id,
            key,
            form,
            cursor: 0,
            pending: committed.clone(),
            committed,
            phase: EditorPhase::Idle,
            err: None,
        })
    }

    pub fn form(&self) -> &'static dyn SettingsForm {
        self.form
    }

    pub fn title(&self) -> &'static str {
        self.form.title()
    }

    pub fn field_count(&self) -> usize {
        self.form.fields().len()
    }

    pub fn focused_field(&self) -> Option<&'static FieldSpec> {
        self.form.fields().get(self.cursor)
    }

    pub fn is_saving(&self) -> bool {
        self.phase == EditorPhase::Saving
    }

    pub fn is_pending_confirm(&self) -> bool {
        self.phase == EditorPhase::PendingConfirm
    }

    pub fn is_dirty(&self) -> bool {
        self.pending != self.committed
    }

    // ─────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────

    /// Move focus down, wrapping. Clears a pending confirmation.
    pub fn next_field(&mut self) {
        if self.is_saving() || self.field_count() == 0 {
            return;
        }
        self.cursor = (self.cursor + 1) % self.field_count();
        self.phase = EditorPhase::Idle;
    }

    /// Move focus up, wrapping. Clears a pending confirmation.
    pub fn previous_field(&mut self) {
        if self.is_saving() || self.field_count() == 0 {
            return;
        }
        self.cursor = if self.cursor == 0 {
            self.field_count() - 1
        } else {
            self.cursor - 1
        };
        self.phase = EditorPhase::Idle;
    }

    // ─────────────────────────────────────────────────────────
    // Edits (pending only)
    // ─────────────────────────────────────────────────────────

    /// Returns the focused field if an edit may proceed. A key other than
    /// confirm while a confirmation is pending only cancels it.
    fn editable_field(&mut self) -> Option<&'static FieldSpec> {
        match self.phase {
            EditorPhase::Saving => None,
            EditorPhase::PendingConfirm => {
                self.phase = EditorPhase::Idle;
                None
            }
            EditorPhase::Idle => self.focused_field(),
        }
    }

    /// Flip a toggle or cycle a choice. On a text field this types a space.
    pub fn toggle(&mut self) {
        let Some(field) = self.editable_field() else {
            return;
        };
        match field.kind {
            FieldKind::Toggle => {
                let current = self.bool_at(field.id);
                self.set_pending(field.id, SettingValue::Bool(!current));
            }
            FieldKind::Choice { .. } => self.step(field, 1),
            FieldKind::Text { .. } => self.push_char(field, ' '),
            FieldKind::Number { .. } | FieldKind::Destructive(_) => {}
        }
    }

    /// Step a number by `delta` steps, or move through a choice list
    pub fn adjust(&mut self, delta: i64) {
        let Some(field) = self.editable_field() else {
            return;
        };
        self.step(field, delta);
    }

    pub fn input_char(&mut self, c: char) {
        let Some(field) = self.editable_field() else {
            return;
        };
        self.push_char(field, c);
    }

    pub fn backspace(&mut self) {
        let Some(field) = self.editable_field() else {
            return;
        };
        if let FieldKind::Text { .. } = field.kind {
            let mut text = self.text_at(field.id);
            if text.pop().is_some() {
                self.set_pending(field.id, SettingValue::Text(text));
            }
        }
    }

    fn step(&mut self, field: &FieldSpec, delta: i64) {
        match field.kind {
            FieldKind::Number { min, max, step } => {
                let current = self
                    .pending
                    .get(field.id)
                    .and_then(SettingValue::as_number)
                    .unwrap_or(min);
                let next = current
                    .saturating_add(delta.saturating_mul(step))
                    .clamp(min, max);
                self.set_pending(field.id, SettingValue::Number(next));
            }
            FieldKind::Choice { options } if !options.is_empty() => {
                let current = self.text_at(field.id);
                let len = options.len() as i64;
                let index = options
                    .iter()
                    .position(|o| *o == current)
                    .map(|i| i as i64)
                    .unwrap_or(-1);
                let next = (index + delta).rem_euclid(len) as usize;
                self.set_pending(field.id, SettingValue::Text(options[next].to_string()));
            }
            _ => {}
        }
    }

    fn push_char(&mut self, field: &FieldSpec, c: char) {
        if let FieldKind::Text { max_len } = field.kind {
            let mut text = self.text_at(field.id);
            if text.chars().count() < max_len && !c.is_control() {
                text.push(c);
                self.set_pending(field.id, SettingValue::Text(text));
            }
        }
    }

    fn bool_at(&self, field: &str) -> bool {
        self.pending
            .get(field)
            .and_then(SettingValue::as_bool)
            .unwrap_or(false)
    }

    fn text_at(&self, field: &str) -> String {
        self.pending
            .get(field)
            .and_then(SettingValue::as_text)
            .unwrap_or_default()
            .to_string()
    }

    fn set_pending(&mut self, field: &str, value: SettingValue) {
        self.pending.set(field, value);
        self.err = None;
    }

    // ─────────────────────────────────────────────────────────
    // Confirm / cancel
    // ─────────────────────────────────────────────────────────

    /// Enter / Ctrl+S
    pub fn confirm(&mut self) -> EditorOutcome {
        let Some(field) = self.focused_field() else {
            return EditorOutcome::Stay;
        };

        if let Some(action) = self.form.destructive_action(field) {
            return match self.phase {
                EditorPhase::Idle => {
                    self.phase = EditorPhase::PendingConfirm;
                    EditorOutcome::Stay
                }
                EditorPhase::PendingConfirm => {
                    self.phase = EditorPhase::Saving;
                    self.err = None;
                    EditorOutcome::Destructive { action }
                }
                EditorPhase::Saving => EditorOutcome::Stay,
            };
        }

        if self.is_saving() {
            return EditorOutcome::Stay;
        }
        self.phase = EditorPhase::Idle;

        if !self.is_dirty() {
            return EditorOutcome::Close { saved: false };
        }

        let diff = self.pending.diff_from(&self.committed);
        if let Err(e) = self.form.validate(&self.pending, &diff) {
            debug!("{} validation failed: {}", self.id, e);
            self.err = Some(e.to_string());
            return EditorOutcome::Stay;
        }

        self.phase = EditorPhase::Saving;
        self.err = None;
        EditorOutcome::Save { diff }
    }

    /// Escape. Refused while a write is in flight.
    pub fn cancel(&mut self) -> EditorOutcome {
        if self.is_saving() {
            return EditorOutcome::Stay;
        }
        EditorOutcome::Close { saved: false }
    }

    // ─────────────────────────────────────────────────────────
    // Results
    // ─────────────────────────────────────────────────────────

    /// Apply the reply to a save dispatched by this editor
    pub fn apply_save_result(&mut self, success: bool, err: Option<String>) -> EditorOutcome {
        if !self.is_saving() {
            warn!("{} got a save result while not saving", self.id);
            return EditorOutcome::Stay;
        }
        if success {
            self.committed = self.pending.clone();
            self.phase = EditorPhase::Idle;
            EditorOutcome::Close { saved: true }
        } else {
            self.phase = EditorPhase::Idle;
            self.err = Some(err.unwrap_or_else(|| "save failed".to_string()));
            EditorOutcome::Stay
        }
    }

    /// Apply the reply to a destructive action dispatched by this editor
    pub fn apply_destructive_result(&mut self, err: Option<String>) -> EditorOutcome {
        if !self.is_saving() {
            warn!("{} got a destructive result while not saving", self.id);
            return EditorOutcome::Stay;
        }
        self.phase = EditorPhase::Idle;
        match err {
            None => EditorOutcome::Close { saved: true },
            Some(e) => {
                self.err = Some(e);
                EditorOutcome::Stay
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::protocols::{BluetoothForm, LoraForm, ModbusForm, ZigbeeForm};
    use devdeck_core::{BleStatus, DataKind, LoraStatus, ModbusMode, ModbusStatus, ZigbeeStatus};

    static BLE_FORM: BluetoothForm = BluetoothForm;
    static LORA_FORM: LoraForm = LoraForm;
    static ZIGBEE_FORM: ZigbeeForm = ZigbeeForm;
    static MODBUS_FORM: ModbusForm = ModbusForm;

    fn ble_editor() -> EditorState {
        let payload = Payload::BleStatus(BleStatus {
            enabled: true,
            advertising: false,
            name: "hub".into(),
            connected_peers: 2,
        });
        EditorState::open(
            EditorId(1),
            CacheKey::new("dev1", DataKind::BleStatus),
            &BLE_FORM,
            &payload,
        )
        .unwrap()
    }

    fn focus(editor: &mut EditorState, id: &str) {
        while editor.focused_field().unwrap().id != id {
            editor.next_field();
        }
    }

    #[test]
    fn test_open_copies_committed_into_pending() {
        let editor = ble_editor();
        assert_eq!(editor.pending, editor.committed);
        assert_eq!(editor.phase, EditorPhase::Idle);
        assert_eq!(editor.cursor, 0);
    }

    #[test]
    fn test_navigation_wraps_both_ways() {
        let mut editor = ble_editor();
        editor.previous_field();
        assert_eq!(editor.cursor, editor.field_count() - 1);
        editor.next_field();
        assert_eq!(editor.cursor, 0);
    }

    #[test]
    fn test_toggle_changes_pending_only() {
        let mut editor = ble_editor();
        editor.toggle();

        assert_eq!(editor.pending.get("enabled"), Some(&SettingValue::Bool(false)));
        assert_eq!(editor.committed.get("enabled"), Some(&SettingValue::Bool(true)));
        assert!(editor.is_dirty());
    }

    #[test]
    fn test_confirm_without_changes_closes_unsaved() {
        let mut editor = ble_editor();
        editor.toggle();
        editor.toggle();

        assert_eq!(editor.confirm(), EditorOutcome::Close { saved: false });
        assert_eq!(editor.phase, EditorPhase::Idle);
    }

    #[test]
    fn test_confirm_with_changes_saves_diff() {
        let mut editor = ble_editor();
        editor.toggle();

        match editor.confirm() {
            EditorOutcome::Save { diff } => {
                assert_eq!(diff.len(), 1);
                assert_eq!(diff.get("enabled"), Some(&SettingValue::Bool(false)));
            }
            other => panic!("expected save, got {:?}", other),
        }
        assert!(editor.is_saving());
    }

    #[test]
    fn test_saving_refuses_edits_navigation_and_escape() {
        let mut editor = ble_editor();
        editor.toggle();
        editor.confirm();
        let pending = editor.pending.clone();

        editor.toggle();
        editor.next_field();
        assert_eq!(editor.cancel(), EditorOutcome::Stay);
        assert_eq!(editor.confirm(), EditorOutcome::Stay);

        assert_eq!(editor.pending, pending);
        assert_eq!(editor.cursor, 0);
        assert!(editor.is_saving());
    }

    #[test]
    fn test_save_success_commits_and_closes() {
        let mut editor = ble_editor();
        editor.toggle();
        editor.confirm();

        assert_eq!(
            editor.apply_save_result(true, None),
            EditorOutcome::Close { saved: true }
        );
        assert_eq!(editor.committed, editor.pending);
    }

    #[test]
    fn test_save_failure_keeps_pending_and_surfaces_error() {
        let mut editor = ble_editor();
        editor.toggle();
        editor.confirm();

        let outcome = editor.apply_save_result(false, Some("device busy".into()));

        assert_eq!(outcome, EditorOutcome::Stay);
        assert_eq!(editor.phase, EditorPhase::Idle);
        assert_eq!(editor.err.as_deref(), Some("device busy"));
        assert!(editor.is_dirty());
    }

    #[test]
    fn test_destructive_needs_two_consecutive_confirms() {
        let mut editor = ble_editor();
        focus(&mut editor, "factory_reset");

        assert_eq!(editor.confirm(), EditorOutcome::Stay);
        assert!(editor.is_pending_confirm());

        assert_eq!(
            editor.confirm(),
            EditorOutcome::Destructive {
                action: DestructiveAction::FactoryReset
            }
        );
        assert!(editor.is_saving());
    }

    #[test]
    fn test_navigation_between_confirms_resets() {
        let mut editor = ble_editor();
        focus(&mut editor, "factory_reset");
        editor.confirm();

        editor.next_field();
        assert_eq!(editor.phase, EditorPhase::Idle);
        editor.previous_field();

        assert_eq!(editor.confirm(), EditorOutcome::Stay);
        assert!(editor.is_pending_confirm());
    }

    #[test]
    fn test_other_key_cancels_pending_confirm_without_editing() {
        let mut editor = ble_editor();
        focus(&mut editor, "factory_reset");
        editor.confirm();

        editor.input_char('x');

        assert_eq!(editor.phase, EditorPhase::Idle);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_escape_discards_pending() {
        let mut editor = ble_editor();
        editor.toggle();
        assert_eq!(editor.cancel(), EditorOutcome::Close { saved: false });
    }

    #[test]
    fn test_validation_blocks_save() {
        let mut editor = ble_editor();
        focus(&mut editor, "name");
        editor.input_char('"');

        assert_eq!(editor.confirm(), EditorOutcome::Stay);
        assert_eq!(editor.phase, EditorPhase::Idle);
        assert!(editor.err.as_deref().unwrap().contains("Device Name"));
    }

    #[test]
    fn test_unlisted_remote_value_does_not_block_save() {
        let payload = Payload::ModbusStatus(ModbusStatus {
            enabled: true,
            mode: ModbusMode::Rtu,
            unit_id: 1,
            gateway: String::new(),
            baud_rate: 4800,
        });
        let mut editor = EditorState::open(
            EditorId(7),
            CacheKey::new("dev1", DataKind::ModbusStatus),
            &MODBUS_FORM,
            &payload,
        )
        .unwrap();

        editor.toggle();

        match editor.confirm() {
            EditorOutcome::Save { diff } => {
                assert_eq!(diff.len(), 1);
                assert_eq!(diff.get("enabled"), Some(&SettingValue::Bool(false)));
            }
            other => panic!("expected save, got {:?}", other),
        }
        assert!(editor.err.is_none());
    }

    #[test]
    fn test_text_editing() {
        let mut editor = ble_editor();
        focus(&mut editor, "name");
        editor.backspace();
        editor.input_char('B');
        editor.toggle();

        assert_eq!(editor.pending.get("name"), Some(&SettingValue::Text("huB ".into())));
    }

    #[test]
    fn test_adjust_clamps_numbers_and_cycles_choices() {
        let payload = Payload::LoraStatus(LoraStatus {
            enabled: true,
            region: "EU868".into(),
            spreading_factor: 12,
            tx_power_dbm: 14,
        });
        let mut editor = EditorState::open(
            EditorId(2),
            CacheKey::new("dev1", DataKind::LoraStatus),
            &LORA_FORM,
            &payload,
        )
        .unwrap();

        focus(&mut editor, "spreading_factor");
        editor.adjust(1);
        assert_eq!(editor.pending.get("spreading_factor"), Some(&SettingValue::Number(12)));
        editor.adjust(-2);
        assert_eq!(editor.pending.get("spreading_factor"), Some(&SettingValue::Number(10)));

        focus(&mut editor, "region");
        editor.adjust(-1);
        assert_eq!(editor.pending.get("region"), Some(&SettingValue::Text("IN865".into())));
        editor.toggle();
        assert_eq!(editor.pending.get("region"), Some(&SettingValue::Text("EU868".into())));
    }

    #[test]
    fn test_destructive_failure_returns_to_idle() {
        let payload = Payload::ZigbeeStatus(ZigbeeStatus {
            enabled: true,
            channel: 15,
            pan_id: 0x1a62,
            permit_join: false,
            joined_devices: 0,
        });
        let mut editor = EditorState::open(
            EditorId(3),
            CacheKey::new("dev1", DataKind::ZigbeeStatus),
            &ZIGBEE_FORM,
            &payload,
        )
        .unwrap();
        focus(&mut editor, "leave_network");
        editor.confirm();
        editor.confirm();

        let outcome = editor.apply_destructive_result(Some("not joined".into()));

        assert_eq!(outcome, EditorOutcome::Stay);
        assert_eq!(editor.phase, EditorPhase::Idle);
        assert_eq!(editor.err.as_deref(), Some("not joined"));
    }

    #[test]
    fn test_result_while_idle_is_ignored() {
        let mut editor = ble_editor();
        assert_eq!(editor.apply_save_result(true, None), EditorOutcome::Stay);
        assert!(!editor.is_dirty());
    }
}
