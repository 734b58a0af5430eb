//! Configuration types for devdeck

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use devdeck_core::prelude::*;
use devdeck_core::{DataKind, DeviceId};
use serde::{Deserialize, Serialize};

use crate::cache::TtlPolicy;

fn default_true() -> bool {
    true
}

/// Global settings from `config.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub rpc: RpcSettings,

    #[serde(default)]
    pub devices: DeviceSettings,

    #[serde(default)]
    pub behavior: BehaviorSettings,
}

/// Cache settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheSettings {
    /// Seconds before cached data is considered stale
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// Per-kind overrides keyed by kind name (e.g. `ble_status = 10`)
    #[serde(default)]
    pub ttl_secs: BTreeMap<String, u64>,

    /// Mirror the cache to disk and reload it at startup
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Cache file location (defaults to the platform cache directory)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_ttl_secs() -> u64 {
    30
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl_secs(),
            ttl_secs: BTreeMap::new(),
            persist: true,
            file: None,
        }
    }
}

impl CacheSettings {
    /// Resolve the TTL table. Unknown kind names are skipped with a warning.
    pub fn ttl_policy(&self) -> TtlPolicy {
        let mut policy = TtlPolicy::uniform(Duration::from_secs(self.default_ttl_secs));
        for (name, secs) in &self.ttl_secs {
            match name.parse::<DataKind>() {
                Ok(kind) => policy = policy.with_override(kind, Duration::from_secs(*secs)),
                Err(e) => warn!("Ignoring cache.ttl_secs.{}: {}", name, e),
            }
        }
        policy
    }

    /// Cache file path, if persistence is on and a location is known
    pub fn cache_file(&self) -> Option<PathBuf> {
        if !self.persist {
            return None;
        }
        self.file
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join("devdeck").join("cache.json")))
    }
}

/// Device RPC deadlines
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RpcSettings {
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,
}

fn default_read_timeout_secs() -> u64 {
    devdeck_device::READ_TIMEOUT.as_secs()
}

fn default_write_timeout_secs() -> u64 {
    devdeck_device::WRITE_TIMEOUT.as_secs()
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            read_timeout_secs: default_read_timeout_secs(),
            write_timeout_secs: default_write_timeout_secs(),
        }
    }
}

impl RpcSettings {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

/// Devices cycled by the dashboard
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeviceSettings {
    /// Device addresses; the first is selected at startup
    #[serde(default)]
    pub known: Vec<DeviceId>,
}

/// Behavior settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BehaviorSettings {
    /// Re-request the active panel's data on every tick
    #[serde(default = "default_true")]
    pub revalidate_on_tick: bool,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            revalidate_on_tick: true,
        }
    }
}
