//! The six protocol settings forms
//!
//! Each form is static data plus the mapping from its payload to editable
//! values. Protocol-specific checks layer on top of [`validate_fields`].

use std::sync::LazyLock;

use devdeck_core::prelude::*;
use devdeck_core::{
    DataKind, DestructiveAction, Payload, SettingValue, SettingsDiff, SettingsValues,
};
use regex::Regex;

use super::form::{validate_fields, wrong_payload, FieldSpec, SettingsForm};

/// BLE local names: printable ASCII without quotes, as accepted by the radio
static BLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9 _.\-]+$").expect("Invalid BLE name regex"));

/// `host:port`, where host is a hostname or dotted IPv4 address
static GATEWAY_ADDR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<host>[A-Za-z0-9](?:[A-Za-z0-9.\-]*[A-Za-z0-9])?):(?P<port>\d{1,5})$")
        .expect("Invalid gateway address regex")
});

fn bool_value(b: bool) -> SettingValue {
    SettingValue::Bool(b)
}

fn number_value(n: impl Into<i64>) -> SettingValue {
    SettingValue::Number(n.into())
}

fn text_value(s: impl Into<String>) -> SettingValue {
    SettingValue::Text(s.into())
}

// ─────────────────────────────────────────────────────────
// Bluetooth
// ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct BluetoothForm;

const BLUETOOTH_FIELDS: &[FieldSpec] = &[
    FieldSpec::toggle("enabled", "Enabled"),
    FieldSpec::toggle("advertising", "Advertising"),
    FieldSpec::text("name", "Device Name", 29),
    FieldSpec::destructive("factory_reset", "Factory Reset", DestructiveAction::FactoryReset),
];

impl SettingsForm for BluetoothForm {
    fn kind(&self) -> DataKind {
        DataKind::BleStatus
    }

    fn fields(&self) -> &'static [FieldSpec] {
        BLUETOOTH_FIELDS
    }

    fn values_from(&self, payload: &Payload) -> Result<SettingsValues> {
        let Payload::BleStatus(s) = payload else {
            return Err(wrong_payload(self.kind(), payload));
        };
        Ok(SettingsValues::new()
            .with("enabled", bool_value(s.enabled))
            .with("advertising", bool_value(s.advertising))
            .with("name", text_value(&s.name)))
    }

    fn validate(&self, _values: &SettingsValues, changed: &SettingsDiff) -> Result<()> {
        validate_fields(self.fields(), changed)?;
        if let Some(name) = changed.get("name").and_then(SettingValue::as_text) {
            if !BLE_NAME.is_match(name) {
                return Err(Error::validation(
                    "Device Name",
                    "use letters, digits, spaces, '.', '_' or '-'",
                ));
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────
// Zigbee
// ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ZigbeeForm;

const ZIGBEE_FIELDS: &[FieldSpec] = &[
    FieldSpec::toggle("enabled", "Enabled"),
    FieldSpec::number("channel", "Channel", 11, 26),
    // 0x0000 and 0xFFFF are reserved
    FieldSpec::number("pan_id", "PAN ID", 0x0001, 0xFFFE),
    FieldSpec::toggle("permit_join", "Permit Join"),
    FieldSpec::destructive("leave_network", "Leave Network", DestructiveAction::LeaveNetwork),
];

impl SettingsForm for ZigbeeForm {
    fn kind(&self) -> DataKind {
        DataKind::ZigbeeStatus
    }

    fn fields(&self) -> &'static [FieldSpec] {
        ZIGBEE_FIELDS
    }

    fn values_from(&self, payload: &Payload) -> Result<SettingsValues> {
        let Payload::ZigbeeStatus(s) = payload else {
            return Err(wrong_payload(self.kind(), payload));
        };
        Ok(SettingsValues::new()
            .with("enabled", bool_value(s.enabled))
            .with("channel", number_value(s.channel))
            .with("pan_id", number_value(s.pan_id))
            .with("permit_join", bool_value(s.permit_join)))
    }
}

// ─────────────────────────────────────────────────────────
// Matter
// ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct MatterForm;

const MATTER_FIELDS: &[FieldSpec] = &[
    FieldSpec::toggle("enabled", "Enabled"),
    FieldSpec::toggle("commissioning_open", "Open Commissioning Window"),
    FieldSpec::destructive("factory_reset", "Factory Reset", DestructiveAction::FactoryReset),
];

impl SettingsForm for MatterForm {
    fn kind(&self) -> DataKind {
        DataKind::MatterStatus
    }

    fn fields(&self) -> &'static [FieldSpec] {
        MATTER_FIELDS
    }

    fn values_from(&self, payload: &Payload) -> Result<SettingsValues> {
        let Payload::MatterStatus(s) = payload else {
            return Err(wrong_payload(self.kind(), payload));
        };
        Ok(SettingsValues::new()
            .with("enabled", bool_value(s.enabled))
            .with("commissioning_open", bool_value(s.commissioning_open)))
    }
}

// ─────────────────────────────────────────────────────────
// LoRa
// ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct LoraForm;

const LORA_FIELDS: &[FieldSpec] = &[
    FieldSpec::toggle("enabled", "Enabled"),
    FieldSpec::choice("region", "Region", &["EU868", "US915", "AS923", "AU915", "IN865"]),
    FieldSpec::number("spreading_factor", "Spreading Factor", 7, 12),
    FieldSpec::number("tx_power_dbm", "TX Power (dBm)", 2, 20),
];

impl SettingsForm for LoraForm {
    fn kind(&self) -> DataKind {
        DataKind::LoraStatus
    }

    fn fields(&self) -> &'static [FieldSpec] {
        LORA_FIELDS
    }

    fn values_from(&self, payload: &Payload) -> Result<SettingsValues> {
        let Payload::LoraStatus(s) = payload else {
            return Err(wrong_payload(self.kind(), payload));
        };
        Ok(SettingsValues::new()
            .with("enabled", bool_value(s.enabled))
            .with("region", text_value(&s.region))
            .with("spreading_factor", number_value(s.spreading_factor))
            .with("tx_power_dbm", number_value(s.tx_power_dbm)))
    }
}

// ─────────────────────────────────────────────────────────
// Modbus
// ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ModbusForm;

const MODBUS_FIELDS: &[FieldSpec] = &[
    FieldSpec::toggle("enabled", "Enabled"),
    FieldSpec::choice("mode", "Mode", &["tcp", "rtu"]),
    FieldSpec::number("unit_id", "Unit ID", 1, 247),
    FieldSpec::text("gateway", "Gateway (host:port)", 64),
    FieldSpec::choice(
        "baud_rate",
        "Baud Rate",
        &["9600", "19200", "38400", "57600", "115200"],
    ),
];

impl SettingsForm for ModbusForm {
    fn kind(&self) -> DataKind {
        DataKind::ModbusStatus
    }

    fn fields(&self) -> &'static [FieldSpec] {
        MODBUS_FIELDS
    }

    fn values_from(&self, payload: &Payload) -> Result<SettingsValues> {
        let Payload::ModbusStatus(s) = payload else {
            return Err(wrong_payload(self.kind(), payload));
        };
        Ok(SettingsValues::new()
            .with("enabled", bool_value(s.enabled))
            .with("mode", text_value(s.mode.as_str()))
            .with("unit_id", number_value(s.unit_id))
            .with("gateway", text_value(&s.gateway))
            .with("baud_rate", text_value(s.baud_rate.to_string())))
    }

    fn validate(&self, values: &SettingsValues, changed: &SettingsDiff) -> Result<()> {
        validate_fields(self.fields(), changed)?;

        // Mode and gateway are checked as a pair when either one changes
        if changed.get("mode").is_none() && changed.get("gateway").is_none() {
            return Ok(());
        }
        let tcp = values.get("mode").and_then(SettingValue::as_text) == Some("tcp");
        let gateway = values
            .get("gateway")
            .and_then(SettingValue::as_text)
            .unwrap_or_default();
        if tcp {
            validate_gateway(gateway)?;
        }
        Ok(())
    }
}

fn validate_gateway(gateway: &str) -> Result<()> {
    const FIELD: &str = "Gateway (host:port)";

    let caps = GATEWAY_ADDR
        .captures(gateway)
        .ok_or_else(|| Error::validation(FIELD, format!("'{}' is not host:port", gateway)))?;
    match caps["port"].parse::<u32>() {
        Ok(port) if (1..=65535).contains(&port) => Ok(()),
        _ => Err(Error::validation(
            FIELD,
            format!("port {} is out of range", &caps["port"]),
        )),
    }
}

// ─────────────────────────────────────────────────────────
// Z-Wave
// ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ZwaveForm;

const ZWAVE_FIELDS: &[FieldSpec] = &[
    FieldSpec::toggle("enabled", "Enabled"),
    FieldSpec::choice("region", "Region", &["EU", "US", "ANZ", "HK", "IN", "JP", "KR"]),
    FieldSpec::toggle("inclusion_mode", "Inclusion Mode"),
    FieldSpec::destructive("factory_reset", "Factory Reset", DestructiveAction::FactoryReset),
];

impl SettingsForm for ZwaveForm {
    fn kind(&self) -> DataKind {
        DataKind::ZwaveStatus
    }

    fn fields(&self) -> &'static [FieldSpec] {
        ZWAVE_FIELDS
    }

    fn values_from(&self, payload: &Payload) -> Result<SettingsValues> {
        let Payload::ZwaveStatus(s) = payload else {
            return Err(wrong_payload(self.kind(), payload));
        };
        Ok(SettingsValues::new()
            .with("enabled", bool_value(s.enabled))
            .with("region", text_value(&s.region))
            .with("inclusion_mode", bool_value(s.inclusion_mode)))
    }
}

static BLUETOOTH: BluetoothForm = BluetoothForm;
static ZIGBEE: ZigbeeForm = ZigbeeForm;
static MATTER: MatterForm = MatterForm;
static LORA: LoraForm = LoraForm;
static MODBUS: ModbusForm = ModbusForm;
static ZWAVE: ZwaveForm = ZwaveForm;

/// The settings form for `kind`, if that kind is editable
pub fn form_for(kind: DataKind) -> Option<&'static dyn SettingsForm> {
    match kind {
        DataKind::BleStatus => Some(&BLUETOOTH),
        DataKind::ZigbeeStatus => Some(&ZIGBEE),
        DataKind::MatterStatus => Some(&MATTER),
        DataKind::LoraStatus => Some(&LORA),
        DataKind::ModbusStatus => Some(&MODBUS),
        DataKind::ZwaveStatus => Some(&ZWAVE),
        DataKind::SystemInfo => None,
    }
}
