//! Editable setting values and the diff sent to a device on save

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single editable value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl SettingValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Bool(b) => if *b { "on" } else { "off" }.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A full set of field values for one settings form, keyed by field id
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsValues(BTreeMap<String, SettingValue>);

impl SettingsValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: SettingValue) -> Self {
        self.0.insert(field.into(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&SettingValue> {
        self.0.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut SettingValue> {
        self.0.get_mut(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: SettingValue) {
        self.0.insert(field.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SettingValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fields whose value in `self` differs from `base`
    pub fn diff_from(&self, base: &SettingsValues) -> SettingsDiff {
        let changes = self
            .0
            .iter()
            .filter(|(field, value)| base.get(field) != Some(*value))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        SettingsDiff { changes }
    }
}

/// The changed fields of a save, as sent to the device
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SettingsDiff {
    pub changes: BTreeMap<String, SettingValue>,
}

impl SettingsDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn get(&self, field: &str) -> Option<&SettingValue> {
        self.changes.get(field)
    }
}
