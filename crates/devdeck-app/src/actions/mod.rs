//! Action handlers: UpdateAction dispatch and background task spawning
//!
//! Every action becomes one tokio task. The task gets only what it needs
//! (device, key, parameters and the RPC collaborator), never the app state,
//! and sends exactly one message back when it finishes.

use std::sync::Arc;

use devdeck_device::DeviceRpc;
use tokio::sync::mpsc;

use crate::handler::UpdateAction;
use crate::message::Message;

pub(crate) mod fetch;
pub(crate) mod mutation;

/// Execute an action by spawning a background task
pub fn handle_action<R>(action: UpdateAction, msg_tx: mpsc::Sender<Message>, rpc: Arc<R>)
where
    R: DeviceRpc + Sync + 'static,
{
    match action {
        UpdateAction::FetchData {
            key,
            generation,
            background,
            timeout,
        } => {
            fetch::spawn_fetch(rpc, key, generation, background, timeout, msg_tx);
        }

        UpdateAction::SaveSettings {
            editor,
            key,
            diff,
            timeout,
        } => {
            mutation::spawn_save(rpc, editor, key, diff, timeout, msg_tx);
        }

        UpdateAction::RunDestructive {
            editor,
            key,
            action,
            timeout,
        } => {
            mutation::spawn_destructive(rpc, editor, key, action, timeout, msg_tx);
        }
    }
}
