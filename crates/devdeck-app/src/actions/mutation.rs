//! Save and destructive-action commands

use std::sync::Arc;
use std::time::Duration;

use devdeck_core::prelude::*;
use devdeck_core::{CacheKey, DestructiveAction, SettingsDiff};
use devdeck_device::{with_deadline, DeviceRpc};
use tokio::sync::mpsc;

use crate::editor::EditorId;
use crate::message::Message;

/// Write `diff` and report with a single `SaveResult`
pub(super) fn spawn_save<R>(
    rpc: Arc<R>,
    editor: EditorId,
    key: CacheKey,
    diff: SettingsDiff,
    timeout: Duration,
    msg_tx: mpsc::Sender<Message>,
) where
    R: DeviceRpc + Sync + 'static,
{
    tokio::spawn(async move {
        let operation = format!("save {}", key);
        let result = with_deadline(
            &operation,
            timeout,
            rpc.save(&key.device, key.kind, &diff, timeout),
        )
        .await;

        let err = result.err().map(|e| e.to_string());
        if err.is_none() {
            info!("Saved {} field(s) to {}", diff.len(), key);
        }

        let message = Message::SaveResult {
            editor,
            key,
            success: err.is_none(),
            err,
        };
        if msg_tx.send(message).await.is_err() {
            debug!("Engine gone, dropping save result");
        }
    });
}

/// Run `action` and report with a single `DestructiveActionResult`
pub(super) fn spawn_destructive<R>(
    rpc: Arc<R>,
    editor: EditorId,
    key: CacheKey,
    action: DestructiveAction,
    timeout: Duration,
    msg_tx: mpsc::Sender<Message>,
) where
    R: DeviceRpc + Sync + 'static,
{
    tokio::spawn(async move {
        let operation = format!("{} {}", action.label(), key);
        let result = with_deadline(
            &operation,
            timeout,
            rpc.run_destructive(&key.device, key.kind, action, timeout),
        )
        .await;

        let err = result.err().map(|e| e.to_string());
        if err.is_none() {
            info!("{} completed on {}", action.label(), key);
        }

        let message = Message::DestructiveActionResult { editor, key, err };
        if msg_tx.send(message).await.is_err() {
            debug!("Engine gone, dropping destructive result");
        }
    });
}
