//! The device RPC seam
//!
//! The dashboard never talks to the wire directly. Every fetch, save and
//! destructive action goes through an injected [`DeviceRpc`] implementation,
//! which is called from a background task and is expected to respect the
//! deadline it is given. The transport behind it (JSON-RPC over a serial
//! bridge, HTTP, ...) is not this crate's concern.

use std::time::Duration;

use devdeck_core::prelude::*;
use devdeck_core::{DataKind, DestructiveAction, DeviceId, Payload, SettingsDiff};

/// Remote device operations, one implementation per transport.
///
/// `DeviceRpc` is the `Send` variant used by the background task
/// dispatcher; implement that one.
#[trait_variant::make(DeviceRpc: Send)]
pub trait LocalDeviceRpc {
    /// Read the current state for `kind` from `device`.
    ///
    /// The returned payload must be of the requested kind; a mismatch is
    /// rejected by the cache and reported like any other fetch failure.
    async fn fetch(&self, device: &DeviceId, kind: DataKind, deadline: Duration)
        -> Result<Payload>;

    /// Apply the changed fields of a settings form.
    async fn save(
        &self,
        device: &DeviceId,
        kind: DataKind,
        diff: &SettingsDiff,
        deadline: Duration,
    ) -> Result<()>;

    /// Execute an irreversible action on the radio stack behind `kind`.
    async fn run_destructive(
        &self,
        device: &DeviceId,
        kind: DataKind,
        action: DestructiveAction,
        deadline: Duration,
    ) -> Result<()>;
}
