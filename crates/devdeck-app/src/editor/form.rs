//! Settings form abstraction shared by every protocol editor

use devdeck_core::prelude::*;
use devdeck_core::{DataKind, DestructiveAction, Payload, SettingValue, SettingsDiff, SettingsValues};

/// How a field is edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// On/off switch, flipped with toggle
    Toggle,
    /// One of a fixed set of strings, cycled with toggle or adjust
    Choice { options: &'static [&'static str] },
    /// Integer stepped with adjust, clamped to `min..=max`
    Number { min: i64, max: i64, step: i64 },
    /// Free text typed character by character
    Text { max_len: usize },
    /// Irreversible action; confirm twice to run it. Holds no value.
    Destructive(DestructiveAction),
}

/// One row of a settings form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Key into [`SettingsValues`] and the wire diff
    pub id: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn toggle(id: &'static str, label: &'static str) -> Self {
        Self {
            id,
            label,
            kind: FieldKind::Toggle,
        }
    }

    pub const fn choice(
        id: &'static str,
        label: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            id,
            label,
            kind: FieldKind::Choice { options },
        }
    }

    pub const fn number(id: &'static str, label: &'static str, min: i64, max: i64) -> Self {
        Self {
            id,
            label,
            kind: FieldKind::Number { min, max, step: 1 },
        }
    }

    pub const fn text(id: &'static str, label: &'static str, max_len: usize) -> Self {
        Self {
            id,
            label,
            kind: FieldKind::Text { max_len },
        }
    }

    pub const fn destructive(
        id: &'static str,
        label: &'static str,
        action: DestructiveAction,
    ) -> Self {
        Self {
            id,
            label,
            kind: FieldKind::Destructive(action),
        }
    }

    pub fn is_destructive(&self) -> bool {
        matches!(self.kind, FieldKind::Destructive(_))
    }
}

/// An editable settings form for one data kind.
///
/// Implementors are static descriptions: a field list, how to read current
/// values out of a payload, and how to check values before they are sent.
/// Saving goes through the device collaborator for [`kind`](Self::kind).
pub trait SettingsForm: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> DataKind;

    fn title(&self) -> &'static str {
        self.kind().title()
    }

    fn fields(&self) -> &'static [FieldSpec];

    /// Current remote values, read from the panel's payload
    fn values_from(&self, payload: &Payload) -> Result<SettingsValues>;

    /// Check a save before it is dispatched. `values` is the full pending
    /// set; only the fields in `changed` are checked, so a remote value the
    /// form does not list never blocks a save of some other field.
    fn validate(&self, _values: &SettingsValues, changed: &SettingsDiff) -> Result<()> {
        validate_fields(self.fields(), changed)
    }

    fn destructive_action(&self, field: &FieldSpec) -> Option<DestructiveAction> {
        match field.kind {
            FieldKind::Destructive(action) => Some(action),
            _ => None,
        }
    }
}

/// Type and range checks implied by the field list, for changed fields only
pub fn validate_fields(fields: &[FieldSpec], changed: &SettingsDiff) -> Result<()> {
    for field in fields {
        let Some(value) = changed.get(field.id) else {
            continue;
        };
        match (field.kind, value) {
            (FieldKind::Toggle, SettingValue::Bool(_)) => {}
            (FieldKind::Number { min, max, .. }, SettingValue::Number(n)) => {
                if *n < min || *n > max {
                    return Err(Error::validation(
                        field.label,
                        format!("{} is outside {}..={}", n, min, max),
                    ));
                }
            }
            (FieldKind::Choice { options }, SettingValue::Text(s)) => {
                if !options.contains(&s.as_str()) {
                    return Err(Error::validation(
                        field.label,
                        format!("'{}' is not one of {}", s, options.join(", ")),
                    ));
                }
            }
            (FieldKind::Text { max_len }, SettingValue::Text(s)) => {
                if s.chars().count() > max_len {
                    return Err(Error::validation(
                        field.label,
                        format!("longer than {} characters", max_len),
                    ));
                }
            }
            (FieldKind::Destructive(_), _) => {}
            (_, other) => {
                return Err(Error::validation(
                    field.label,
                    format!("unexpected {} value", other.type_name()),
                ));
            }
        }
    }
    Ok(())
}

/// Error for a form handed a payload of another kind
pub(crate) fn wrong_payload(form: DataKind, payload: &Payload) -> Error {
    Error::KindMismatch {
        expected: form,
        actual: payload.kind(),
    }
}
