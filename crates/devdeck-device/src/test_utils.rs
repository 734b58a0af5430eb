//! Test utilities for the device seam
//!
//! [`FakeDevice`] is a scripted, in-memory [`DeviceRpc`] that records every
//! call it receives. Clones share state, so a test can keep one handle for
//! assertions while the engine owns another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use devdeck_core::prelude::*;
use devdeck_core::{CacheKey, DataKind, DestructiveAction, DeviceId, Payload, SettingsDiff};

use crate::client::DeviceRpc;

/// A call observed by [`FakeDevice`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    Fetch(CacheKey),
    Save {
        key: CacheKey,
        diff: SettingsDiff,
    },
    Destructive {
        key: CacheKey,
        action: DestructiveAction,
    },
}

#[derive(Debug, Default)]
struct FakeState {
    payloads: HashMap<CacheKey, Payload>,
    fetch_errors: HashMap<CacheKey, String>,
    save_error: Option<String>,
    destructive_error: Option<String>,
    latency: HashMap<DeviceId, Duration>,
    calls: Vec<FakeCall>,
}

/// Scripted in-memory device
#[derive(Debug, Clone, Default)]
pub struct FakeDevice {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Serve `payload` for `(device, payload.kind())`
    pub fn set_payload(&self, device: impl Into<DeviceId>, payload: Payload) {
        let key = CacheKey::new(device, payload.kind());
        let mut state = self.lock();
        state.fetch_errors.remove(&key);
        state.payloads.insert(key, payload);
    }

    /// Make fetches of `key` fail with an RPC error
    pub fn fail_fetch(&self, key: CacheKey, message: impl Into<String>) {
        self.lock().fetch_errors.insert(key, message.into());
    }

    /// Make every save fail (`None` restores success)
    pub fn fail_saves(&self, message: Option<&str>) {
        self.lock().save_error = message.map(str::to_string);
    }

    /// Make every destructive action fail (`None` restores success)
    pub fn fail_destructive(&self, message: Option<&str>) {
        self.lock().destructive_error = message.map(str::to_string);
    }

    /// Delay every call to `device` by `latency`
    pub fn set_latency(&self, device: impl Into<DeviceId>, latency: Duration) {
        self.lock().latency.insert(device.into(), latency);
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<FakeCall> {
        self.lock().calls.clone()
    }

    pub fn fetch_count(&self, key: &CacheKey) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, FakeCall::Fetch(k) if k == key))
            .count()
    }

    pub fn save_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, FakeCall::Save { .. }))
            .count()
    }

    pub fn destructive_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, FakeCall::Destructive { .. }))
            .count()
    }

    /// Record the call and return the latency to simulate for it
    fn record(&self, device: &DeviceId, call: FakeCall) -> Duration {
        let mut state = self.lock();
        state.calls.push(call);
        state.latency.get(device).copied().unwrap_or(Duration::ZERO)
    }

    async fn simulate_latency(latency: Duration) {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

impl DeviceRpc for FakeDevice {
    async fn fetch(
        &self,
        device: &DeviceId,
        kind: DataKind,
        _deadline: Duration,
    ) -> Result<Payload> {
        let key = CacheKey::new(device.clone(), kind);
        let latency = self.record(device, FakeCall::Fetch(key.clone()));
        Self::simulate_latency(latency).await;

        let state = self.lock();
        if let Some(message) = state.fetch_errors.get(&key) {
            return Err(Error::rpc(message.clone()));
        }
        state
            .payloads
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::unreachable(device.as_str()))
    }

    async fn save(
        &self,
        device: &DeviceId,
        kind: DataKind,
        diff: &SettingsDiff,
        _deadline: Duration,
    ) -> Result<()> {
        let key = CacheKey::new(device.clone(), kind);
        let latency = self.record(
            device,
            FakeCall::Save {
                key,
                diff: diff.clone(),
            },
        );
        Self::simulate_latency(latency).await;

        match self.lock().save_error.clone() {
            Some(message) => Err(Error::rpc(message)),
            None => Ok(()),
        }
    }

    async fn run_destructive(
        &self,
        device: &DeviceId,
        kind: DataKind,
        action: DestructiveAction,
        _deadline: Duration,
    ) -> Result<()> {
        let key = CacheKey::new(device.clone(), kind);
        let latency = self.record(device, FakeCall::Destructive { key, action });
        Self::simulate_latency(latency).await;

        match self.lock().destructive_error.clone() {
            Some(message) => Err(Error::rpc(message)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::READ_TIMEOUT;
    use devdeck_core::SystemInfo;

    fn info() -> Payload {
        Payload::SystemInfo(SystemInfo {
            hostname: "gw-1".to_string(),
            firmware_version: "2.4.1".to_string(),
            uptime_secs: 60,
        })
    }

    #[tokio::test]
    async fn test_fetch_serves_scripted_payload() {
        let device = FakeDevice::new();
        device.set_payload("dev1", info());

        let got = device
            .fetch(&"dev1".into(), DataKind::SystemInfo, READ_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(got, info());
        assert_eq!(
            device.fetch_count(&CacheKey::new("dev1", DataKind::SystemInfo)),
            1
        );
    }

    #[tokio::test]
    async fn test_unknown_key_is_unreachable() {
        let device = FakeDevice::new();
        let err = device
            .fetch(&"dev9".into(), DataKind::BleStatus, READ_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unreachable { .. }));
    }

    #[tokio::test]
    async fn test_scripted_fetch_failure() {
        let device = FakeDevice::new();
        device.set_payload("dev1", info());
        device.fail_fetch(CacheKey::new("dev1", DataKind::SystemInfo), "link down");

        let err = device
            .fetch(&"dev1".into(), DataKind::SystemInfo, READ_TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Device RPC error: link down");
    }

    #[tokio::test]
    async fn test_clones_share_call_log() {
        let device = FakeDevice::new();
        let observer = device.clone();
        device.fail_saves(Some("read-only"));

        let result = device
            .save(
                &"dev1".into(),
                DataKind::BleStatus,
                &SettingsDiff::default(),
                READ_TIMEOUT,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(observer.save_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_delays_reply() {
        let device = FakeDevice::new();
        device.set_payload("slow", info());
        device.set_latency("slow", Duration::from_secs(3));

        let start = tokio::time::Instant::now();
        device
            .fetch(&"slow".into(), DataKind::SystemInfo, READ_TIMEOUT)
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
