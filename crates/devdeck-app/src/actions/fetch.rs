//! Fetch command: one bounded device read per task

use std::sync::Arc;
use std::time::Duration;

use devdeck_core::prelude::*;
use devdeck_core::CacheKey;
use devdeck_device::{with_deadline, DeviceRpc};
use tokio::sync::mpsc;

use crate::message::Message;

/// Fetch `key` and report with a single `RefreshComplete`
pub(super) fn spawn_fetch<R>(
    rpc: Arc<R>,
    key: CacheKey,
    generation: u64,
    background: bool,
    timeout: Duration,
    msg_tx: mpsc::Sender<Message>,
) where
    R: DeviceRpc + Sync + 'static,
{
    tokio::spawn(async move {
        let operation = format!("fetch {}", key);
        let result = with_deadline(
            &operation,
            timeout,
            rpc.fetch(&key.device, key.kind, timeout),
        )
        .await;

        let result = match result {
            Ok(payload) => {
                debug!("Fetched {}", key);
                Ok(Arc::new(payload))
            }
            // Transient failures are expected while polling; anything else
            // points at a broken device client
            Err(e) if !e.is_recoverable() => {
                error!("Fetch of {} failed: {}", key, e);
                Err(e.to_string())
            }
            Err(e) if background => {
                debug!("Background refresh of {} failed: {}", key, e);
                Err(e.to_string())
            }
            Err(e) => {
                warn!("Fetch of {} failed: {}", key, e);
                Err(e.to_string())
            }
        };

        if msg_tx
            .send(Message::RefreshComplete {
                key,
                generation,
                result,
            })
            .await
            .is_err()
        {
            debug!("Engine gone, dropping fetch result");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use devdeck_core::{DataKind, Payload, SystemInfo};
    use devdeck_device::test_utils::FakeDevice;

    #[tokio::test]
    async fn test_fetch_sends_exactly_one_message() {
        let device = FakeDevice::new();
        device.set_payload("dev1", Payload::SystemInfo(SystemInfo::default()));
        let (tx, mut rx) = mpsc::channel(8);
        let key = CacheKey::new("dev1", DataKind::SystemInfo);

        spawn_fetch(
            Arc::new(device.clone()),
            key.clone(),
            3,
            false,
            Duration::from_secs(1),
            tx,
        );

        match rx.recv().await {
            Some(Message::RefreshComplete {
                key: got,
                generation,
                result,
            }) => {
                assert_eq!(got, key);
                assert_eq!(generation, 3);
                assert!(result.is_ok());
            }
            other => panic!("unexpected {:?}", other),
        }
        // Sender dropped with the task, nothing else arrives
        assert!(rx.recv().await.is_none());
        assert_eq!(device.fetch_count(&key), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_device_times_out() {
        let device = FakeDevice::new();
        device.set_payload("slow", Payload::SystemInfo(SystemInfo::default()));
        device.set_latency("slow", Duration::from_secs(60));
        let (tx, mut rx) = mpsc::channel(8);

        spawn_fetch(
            Arc::new(device),
            CacheKey::new("slow", DataKind::SystemInfo),
            0,
            true,
            Duration::from_secs(10),
            tx,
        );

        match rx.recv().await {
            Some(Message::RefreshComplete { result: Err(e), .. }) => {
                assert!(e.contains("timed out"), "{}", e);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
