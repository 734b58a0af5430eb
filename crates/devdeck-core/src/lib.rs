//! # devdeck-core - Core Domain Types
//!
//! Foundation crate for devdeck. Provides identity types, typed device
//! payloads, editable setting values, error handling and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, toml, tracing).
//!
//! ## Public API
//!
//! ### Identity (`types`)
//! - [`DeviceId`] - Address of a remote device
//! - [`DataKind`] - Category of cacheable data, one per panel
//! - [`CacheKey`] - `(device, kind)` pair identifying one cached fact
//! - [`DestructiveAction`] - Irreversible operations needing double confirmation
//!
//! ### Payloads (`payload`)
//! - [`Payload`] - Tagged union of per-kind status structs
//!
//! ### Settings (`values`)
//! - [`SettingValue`], [`SettingsValues`] - Editable field values
//! - [`SettingsDiff`] - Changed fields sent to a device on save
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context

pub mod error;
pub mod logging;
pub mod payload;
pub mod types;
pub mod values;

/// Prelude for common imports used throughout all devdeck crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use payload::{
    BleStatus, LoraStatus, MatterStatus, ModbusMode, ModbusStatus, Payload, SystemInfo,
    ZigbeeStatus, ZwaveStatus,
};
pub use types::{CacheKey, DataKind, DestructiveAction, DeviceId};
pub use values::{SettingValue, SettingsDiff, SettingsValues};
