//! Integration tests driving the engine against a scripted device

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use devdeck_app::cache::mirror::write_cache_file;
use devdeck_app::cache::{load_cache_file, CacheStore, ManualClock, PersistedEntry};
use devdeck_app::config::Settings;
use devdeck_app::editor::EditorPhase;
use devdeck_app::{Engine, Message, PanelView};
use devdeck_core::{
    BleStatus, CacheKey, DataKind, DestructiveAction, DeviceId, Payload, SettingValue, SystemInfo,
};
use devdeck_device::test_utils::{FakeCall, FakeDevice};

fn settings(devices: &[&str]) -> Settings {
    let mut settings = Settings::default();
    settings.devices.known = devices.iter().map(|d| DeviceId::new(*d)).collect();
    settings.cache.persist = false;
    settings
}

/// Engine over `device` with a hand-driven cache clock at t=0
fn engine(devices: &[&str], device: &FakeDevice) -> (Engine<FakeDevice>, ManualClock) {
    let settings = settings(devices);
    let clock = ManualClock::at_epoch();
    let cache = CacheStore::new(settings.cache.ttl_policy(), Arc::new(clock.clone()));
    (Engine::with_cache(settings, cache, device.clone()), clock)
}

/// Process replies until the channel stays quiet, returning how many arrived
async fn settle(engine: &mut Engine<FakeDevice>) -> usize {
    let mut count = 0;
    while let Ok(Some(msg)) =
        tokio::time::timeout(Duration::from_millis(100), engine.msg_rx.recv()).await
    {
        engine.process_message(msg);
        count += 1;
    }
    count
}

fn ble(name: &str, enabled: bool) -> Payload {
    Payload::BleStatus(BleStatus {
        enabled,
        advertising: true,
        name: name.to_string(),
        connected_peers: 2,
    })
}

fn info(host: &str) -> Payload {
    Payload::SystemInfo(SystemInfo {
        hostname: host.to_string(),
        firmware_version: "2.4.1".to_string(),
        uptime_secs: 3600,
    })
}

fn shown(engine: &Engine<FakeDevice>) -> Option<Payload> {
    engine
        .state
        .active_panel()
        .view
        .payload()
        .map(|p| p.as_ref().clone())
}

#[tokio::test]
async fn test_start_loads_active_panel() {
    let device = FakeDevice::new();
    device.set_payload("gw-1", info("gw-1"));
    let (mut engine, _) = engine(&["gw-1"], &device);

    engine.start();
    assert!(matches!(
        engine.state.active_panel().view,
        PanelView::Loading
    ));
    assert_eq!(settle(&mut engine).await, 1);

    assert_eq!(shown(&engine), Some(info("gw-1")));
    assert_eq!(
        device.calls(),
        vec![FakeCall::Fetch(CacheKey::new("gw-1", DataKind::SystemInfo))]
    );
}

#[tokio::test]
async fn test_ttl_lifecycle_fetch_counts() {
    let device = FakeDevice::new();
    device.set_payload("gw-1", ble("P1", true));
    let (mut engine, clock) = engine(&["gw-1"], &device);
    let key = CacheKey::new("gw-1", DataKind::BleStatus);

    engine.process_message(Message::SelectPanel(DataKind::BleStatus));
    clock.set_secs(1);
    settle(&mut engine).await;
    assert_eq!(device.fetch_count(&key), 1);

    // Fresh: served from cache
    clock.set_secs(5);
    engine.process_message(Message::RequestData {
        kind: DataKind::BleStatus,
    });
    assert_eq!(settle(&mut engine).await, 0);
    assert_eq!(device.fetch_count(&key), 1);

    // Stale: two requests, one background fetch
    clock.set_secs(35);
    device.set_payload("gw-1", ble("P2", true));
    engine.process_message(Message::RequestData {
        kind: DataKind::BleStatus,
    });
    engine.process_message(Message::Tick);
    assert_eq!(shown(&engine), Some(ble("P1", true)));
    assert_eq!(settle(&mut engine).await, 1);
    assert_eq!(device.fetch_count(&key), 2);

    clock.set_secs(37);
    engine.process_message(Message::Tick);
    assert_eq!(settle(&mut engine).await, 0);
    assert_eq!(shown(&engine), Some(ble("P2", true)));
    assert_eq!(device.fetch_count(&key), 2);
}

#[tokio::test]
async fn test_late_reply_for_previous_device_is_ignored() {
    let device = FakeDevice::new();
    device.set_payload("A", ble("from-a", true));
    device.set_payload("B", ble("from-b", false));
    let (mut engine, clock) = engine(&["A", "B"], &device);
    let key_a = CacheKey::new("A", DataKind::BleStatus);

    engine.process_message(Message::SelectPanel(DataKind::BleStatus));
    settle(&mut engine).await;

    // A stale refresh for A is in flight when the user switches to B
    clock.set_secs(40);
    device.set_payload("A", ble("from-a-2", true));
    engine.process_message(Message::RequestData {
        kind: DataKind::BleStatus,
    });
    engine.process_message(Message::SwitchDevice(DeviceId::new("B")));
    assert_eq!(settle(&mut engine).await, 2);

    let panel = engine.state.active_panel();
    assert_eq!(panel.device, Some(DeviceId::new("B")));
    assert_eq!(shown(&engine), Some(ble("from-b", false)));
    assert_eq!(
        engine.state.cache.get(&key_a).unwrap().payload.as_ref(),
        &ble("from-a-2", true)
    );
}

#[tokio::test]
async fn test_no_op_save_sends_nothing() {
    let device = FakeDevice::new();
    device.set_payload("gw-1", ble("hub", true));
    let (mut engine, _) = engine(&["gw-1"], &device);
    engine.process_message(Message::SelectPanel(DataKind::BleStatus));
    settle(&mut engine).await;

    engine.process_message(Message::OpenEditor);
    engine.process_message(Message::EditorToggle);
    engine.process_message(Message::EditorToggle);
    engine.process_message(Message::EditorConfirm);
    settle(&mut engine).await;

    assert_eq!(device.save_count(), 0);
    assert!(engine.state.active_panel().editor.is_none());
    assert_eq!(engine.state.active_panel().last_saved, Some(false));
}

#[tokio::test]
async fn test_save_sends_diff_and_refreshes() {
    let device = FakeDevice::new();
    device.set_payload("gw-1", ble("hub", true));
    let (mut engine, _) = engine(&["gw-1"], &device);
    let key = CacheKey::new("gw-1", DataKind::BleStatus);
    engine.process_message(Message::SelectPanel(DataKind::BleStatus));
    settle(&mut engine).await;

    engine.process_message(Message::OpenEditor);
    engine.process_message(Message::EditorToggle);
    engine.process_message(Message::EditorConfirm);
    // The device applies the write; the refetch picks it up
    device.set_payload("gw-1", ble("hub", false));
    // SaveResult, then the follow-up refetch
    assert_eq!(settle(&mut engine).await, 2);

    let saves: Vec<_> = device
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            FakeCall::Save { key, diff } => Some((key, diff)),
            _ => None,
        })
        .collect();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].0, key);
    assert_eq!(saves[0].1.len(), 1);
    assert_eq!(saves[0].1.get("enabled"), Some(&SettingValue::Bool(false)));

    assert!(engine.state.active_panel().editor.is_none());
    assert_eq!(engine.state.active_panel().last_saved, Some(true));
    assert_eq!(shown(&engine), Some(ble("hub", false)));
    assert_eq!(device.fetch_count(&key), 2);
}

#[tokio::test]
async fn test_save_failure_keeps_editor() {
    let device = FakeDevice::new();
    device.set_payload("gw-1", ble("hub", true));
    device.fail_saves(Some("busy"));
    let (mut engine, _) = engine(&["gw-1"], &device);
    engine.process_message(Message::SelectPanel(DataKind::BleStatus));
    settle(&mut engine).await;

    engine.process_message(Message::OpenEditor);
    engine.process_message(Message::EditorToggle);
    engine.process_message(Message::EditorConfirm);
    assert_eq!(settle(&mut engine).await, 1);

    let editor = engine.state.active_panel().editor.as_ref().unwrap();
    assert_eq!(editor.phase, EditorPhase::Idle);
    assert_eq!(editor.err.as_deref(), Some("Device RPC error: busy"));
    // Cached data is untouched by a failed write
    assert_eq!(shown(&engine), Some(ble("hub", true)));
}

#[tokio::test]
async fn test_destructive_action_needs_two_confirms() {
    let device = FakeDevice::new();
    device.set_payload("gw-1", ble("hub", true));
    let (mut engine, _) = engine(&["gw-1"], &device);
    engine.process_message(Message::SelectPanel(DataKind::BleStatus));
    settle(&mut engine).await;

    engine.process_message(Message::OpenEditor);
    for _ in 0..3 {
        engine.process_message(Message::EditorNextField);
    }
    engine.process_message(Message::EditorConfirm);
    assert_eq!(settle(&mut engine).await, 0);
    assert_eq!(device.destructive_count(), 0);

    engine.process_message(Message::EditorConfirm);
    // DestructiveActionResult, then the follow-up refetch
    assert_eq!(settle(&mut engine).await, 2);

    assert!(device.calls().contains(&FakeCall::Destructive {
        key: CacheKey::new("gw-1", DataKind::BleStatus),
        action: DestructiveAction::FactoryReset,
    }));
    assert_eq!(device.destructive_count(), 1);
    assert!(engine.state.active_panel().editor.is_none());
}

#[tokio::test]
async fn test_navigating_away_cancels_destructive_confirm() {
    let device = FakeDevice::new();
    device.set_payload("gw-1", ble("hub", true));
    let (mut engine, _) = engine(&["gw-1"], &device);
    engine.process_message(Message::SelectPanel(DataKind::BleStatus));
    settle(&mut engine).await;

    engine.process_message(Message::OpenEditor);
    for _ in 0..3 {
        engine.process_message(Message::EditorNextField);
    }
    engine.process_message(Message::EditorConfirm);
    engine.process_message(Message::EditorNextField);
    engine.process_message(Message::EditorPreviousField);
    settle(&mut engine).await;

    assert_eq!(device.destructive_count(), 0);
    let editor = engine.state.active_panel().editor.as_ref().unwrap();
    assert_eq!(editor.phase, EditorPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_slow_device_times_out() {
    let device = FakeDevice::new();
    device.set_payload("gw-1", ble("hub", true));
    device.set_latency("gw-1", Duration::from_secs(60));
    let mut settings = settings(&["gw-1"]);
    settings.rpc.read_timeout_secs = 1;
    let clock = ManualClock::at_epoch();
    let cache = CacheStore::new(settings.cache.ttl_policy(), Arc::new(clock));
    let mut engine = Engine::with_cache(settings, cache, device.clone());

    engine.process_message(Message::SelectPanel(DataKind::BleStatus));
    let msg = engine.msg_rx.recv().await.unwrap();
    engine.process_message(msg);

    match &engine.state.active_panel().view {
        PanelView::Unavailable { error } => assert!(error.contains("timed out")),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cache_survives_restart() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cache.json");
    let mut settings = settings(&["gw-1"]);
    settings.cache.persist = true;
    settings.cache.file = Some(path.clone());

    let device = FakeDevice::new();
    device.set_payload("gw-1", ble("hub", true));
    let mut first = Engine::with_settings(settings.clone(), device.clone());
    first.process_message(Message::SelectPanel(DataKind::BleStatus));
    settle(&mut first).await;
    first.shutdown().await;

    let entries = load_cache_file(&path);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].payload, ble("hub", true));

    let fresh_device = FakeDevice::new();
    let mut second = Engine::with_settings(settings, fresh_device.clone());
    second.process_message(Message::SelectPanel(DataKind::BleStatus));
    settle(&mut second).await;
    second.shutdown().await;

    assert_eq!(shown(&second), Some(ble("hub", true)));
    assert!(fresh_device.calls().is_empty());
}

#[tokio::test]
async fn test_rejected_cache_entries_are_not_written_back() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cache.json");
    let good = CacheKey::new("gw-1", DataKind::BleStatus);
    let bad = CacheKey::new("gw-2", DataKind::BleStatus);
    write_cache_file(
        &path,
        &[
            PersistedEntry {
                key: good.clone(),
                fetched_at: chrono::Utc::now(),
                payload: ble("hub", true),
            },
            PersistedEntry {
                key: bad.clone(),
                fetched_at: chrono::Utc::now(),
                payload: info("gw-2"),
            },
        ],
    )
    .unwrap();

    let mut settings = settings(&["gw-1"]);
    settings.cache.persist = true;
    settings.cache.file = Some(path.clone());
    let device = FakeDevice::new();
    device.set_payload("gw-1", ble("hub", false));
    let mut engine = Engine::with_settings(settings, device.clone());
    engine.process_message(Message::SelectPanel(DataKind::BleStatus));
    // A live fetch makes the mirror rewrite the file
    engine.process_message(Message::ForceRefresh);
    settle(&mut engine).await;
    engine.shutdown().await;

    let entries = load_cache_file(&path);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, good);
    assert_eq!(entries[0].payload, ble("hub", false));
    assert_eq!(device.fetch_count(&good), 1);
}
