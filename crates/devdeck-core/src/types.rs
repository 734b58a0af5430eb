//! Core identity types: devices, data kinds and cache keys

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Address of a remote device (usually its IP or hostname)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A category of cacheable device data, one per dashboard panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    BleStatus,
    ZigbeeStatus,
    MatterStatus,
    LoraStatus,
    ModbusStatus,
    ZwaveStatus,
    SystemInfo,
}

impl DataKind {
    /// All kinds in dashboard order
    pub const ALL: [DataKind; 7] = [
        DataKind::SystemInfo,
        DataKind::BleStatus,
        DataKind::ZigbeeStatus,
        DataKind::MatterStatus,
        DataKind::LoraStatus,
        DataKind::ModbusStatus,
        DataKind::ZwaveStatus,
    ];

    /// Stable snake_case name, used in config files and the cache file
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::BleStatus => "ble_status",
            DataKind::ZigbeeStatus => "zigbee_status",
            DataKind::MatterStatus => "matter_status",
            DataKind::LoraStatus => "lora_status",
            DataKind::ModbusStatus => "modbus_status",
            DataKind::ZwaveStatus => "zwave_status",
            DataKind::SystemInfo => "system_info",
        }
    }

    /// Panel title
    pub fn title(&self) -> &'static str {
        match self {
            DataKind::BleStatus => "Bluetooth",
            DataKind::ZigbeeStatus => "Zigbee",
            DataKind::MatterStatus => "Matter",
            DataKind::LoraStatus => "LoRa",
            DataKind::ModbusStatus => "Modbus",
            DataKind::ZwaveStatus => "Z-Wave",
            DataKind::SystemInfo => "System",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DataKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| Error::config(format!("unknown data kind '{}'", s)))
    }
}

/// Identity of one cacheable fact: which device, which kind of data
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub device: DeviceId,
    pub kind: DataKind,
}

impl CacheKey {
    pub fn new(device: impl Into<DeviceId>, kind: DataKind) -> Self {
        Self {
            device: device.into(),
            kind,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device, self.kind)
    }
}

/// Irreversible remote operations that require a two-step confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestructiveAction {
    /// Wipe the radio stack's configuration and pairings
    FactoryReset,
    /// Leave the joined network/fabric
    LeaveNetwork,
}

impl DestructiveAction {
    pub fn label(&self) -> &'static str {
        match self {
            DestructiveAction::FactoryReset => "Factory Reset",
            DestructiveAction::LeaveNetwork => "Leave Network",
        }
    }
}
