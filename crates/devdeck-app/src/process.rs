//! Message processing: runs update, its follow-ups, and dispatches actions

use std::sync::Arc;

use devdeck_device::DeviceRpc;
use tokio::sync::mpsc;

use crate::actions::handle_action;
use crate::handler;
use crate::message::Message;
use crate::state::AppState;

/// Process a message through the TEA update function.
///
/// Follow-up messages are applied immediately, in order, before returning;
/// actions are spawned and report back through `msg_tx` later.
pub fn process_message<R>(
    state: &mut AppState,
    message: Message,
    msg_tx: &mpsc::Sender<Message>,
    rpc: &Arc<R>,
) where
    R: DeviceRpc + Sync + 'static,
{
    let mut msg = Some(message);
    while let Some(m) = msg {
        let result = handler::update(state, m);

        if let Some(action) = result.action {
            handle_action(action, msg_tx.clone(), rpc.clone());
        }

        // Continue with follow-up message
        msg = result.message;
    }
}
