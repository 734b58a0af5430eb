//! Typed device payloads, one variant per [`DataKind`]
//!
//! The cache stores [`Payload`] values. Because every variant is bound to
//! exactly one kind, a reply decoded for the wrong kind is detected by
//! comparing [`Payload::kind`] with the key it is stored under, never by
//! downcasting.

use serde::{Deserialize, Serialize};

use crate::types::DataKind;

/// Bluetooth Low Energy radio state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BleStatus {
    pub enabled: bool,
    pub advertising: bool,
    /// Advertised local name
    pub name: String,
    pub connected_peers: u32,
}

/// Zigbee coordinator state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZigbeeStatus {
    pub enabled: bool,
    /// 802.15.4 channel (11-26)
    pub channel: u8,
    pub pan_id: u16,
    pub permit_join: bool,
    pub joined_devices: u32,
}

/// Matter bridge state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatterStatus {
    pub enabled: bool,
    pub commissioned: bool,
    pub commissioning_open: bool,
    pub fabric_count: u32,
}

/// LoRa concentrator state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoraStatus {
    pub enabled: bool,
    pub region: String,
    pub spreading_factor: u8,
    pub tx_power_dbm: i8,
}

/// Modbus link mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModbusMode {
    #[default]
    Tcp,
    Rtu,
}

impl ModbusMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModbusMode::Tcp => "tcp",
            ModbusMode::Rtu => "rtu",
        }
    }
}

/// Modbus gateway state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModbusStatus {
    pub enabled: bool,
    pub mode: ModbusMode,
    pub unit_id: u8,
    /// Upstream gateway as `host:port` (TCP mode)
    pub gateway: String,
    pub baud_rate: u32,
}

/// Z-Wave controller state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZwaveStatus {
    pub enabled: bool,
    pub region: String,
    pub inclusion_mode: bool,
    pub node_count: u32,
}

/// Read-only device summary
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    pub hostname: String,
    pub firmware_version: String,
    pub uptime_secs: u64,
}

/// Last-known-good data for one cache key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
    BleStatus(BleStatus),
    ZigbeeStatus(ZigbeeStatus),
    MatterStatus(MatterStatus),
    LoraStatus(LoraStatus),
    ModbusStatus(ModbusStatus),
    ZwaveStatus(ZwaveStatus),
    SystemInfo(SystemInfo),
}

impl Payload {
    /// The data kind this payload belongs to
    pub fn kind(&self) -> DataKind {
        match self {
            Payload::BleStatus(_) => DataKind::BleStatus,
            Payload::ZigbeeStatus(_) => DataKind::ZigbeeStatus,
            Payload::MatterStatus(_) => DataKind::MatterStatus,
            Payload::LoraStatus(_) => DataKind::LoraStatus,
            Payload::ModbusStatus(_) => DataKind::ModbusStatus,
            Payload::ZwaveStatus(_) => DataKind::ZwaveStatus,
            Payload::SystemInfo(_) => DataKind::SystemInfo,
        }
    }

    /// One-line summary for the panel header
    pub fn summary(&self) -> String {
        fn on_off(b: bool) -> &'static str {
            if b {
                "on"
            } else {
                "off"
            }
        }

        match self {
            Payload::BleStatus(s) => format!(
                "{} ({}), {} peer(s)",
                s.name,
                on_off(s.enabled),
                s.connected_peers
            ),
            Payload::ZigbeeStatus(s) => format!(
                "ch {} pan {:#06x} ({}), {} device(s)",
                s.channel,
                s.pan_id,
                on_off(s.enabled),
                s.joined_devices
            ),
            Payload::MatterStatus(s) => format!(
                "{} fabric(s) ({})",
                s.fabric_count,
                on_off(s.enabled)
            ),
            Payload::LoraStatus(s) => format!(
                "{} SF{} {}dBm ({})",
                s.region,
                s.spreading_factor,
                s.tx_power_dbm,
                on_off(s.enabled)
            ),
            Payload::ModbusStatus(s) => format!(
                "{} unit {} ({})",
                s.mode.as_str(),
                s.unit_id,
                on_off(s.enabled)
            ),
            Payload::ZwaveStatus(s) => format!(
                "{} {} node(s) ({})",
                s.region,
                s.node_count,
                on_off(s.enabled)
            ),
            Payload::SystemInfo(s) => format!("{} fw {}", s.hostname, s.firmware_version),
        }
    }
}
