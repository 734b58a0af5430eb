//! Orchestration engine
//!
//! Owns the TEA state, the message channel, the device collaborator and the
//! cache mirror. A frontend feeds it key and tick messages through
//! [`Engine::msg_sender`] and renders [`Engine::state`] between messages.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use devdeck_core::prelude::*;
use devdeck_device::DeviceRpc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cache::{load_cache_file, spawn_cache_mirror, CacheStore, MirrorHandle, SystemClock};
use crate::config::{self, Settings};
use crate::message::Message;
use crate::process;
use crate::state::AppState;

/// Capacity of the message channel
const MESSAGE_CHANNEL_CAPACITY: usize = 256;

/// How long shutdown waits for the cache file to be written
const MIRROR_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Engine<R> {
    /// TEA application state (the Model)
    pub state: AppState,

    /// Sender half of the message channel. Clone this for input sources.
    pub msg_tx: mpsc::Sender<Message>,

    /// Receiver half of the message channel
    pub msg_rx: mpsc::Receiver<Message>,

    /// Device collaborator shared by every spawned action
    rpc: Arc<R>,

    /// Cache mirror task, when persistence is on
    mirror: Option<(MirrorHandle, JoinHandle<()>)>,
}

impl<R> Engine<R>
where
    R: DeviceRpc + Sync + 'static,
{
    /// Create an engine from the config in `config_dir`.
    ///
    /// Writes a default config file if none exists (non-fatal if that fails).
    /// Must be called within a Tokio runtime when cache persistence is on.
    pub fn new(config_dir: &Path, rpc: R) -> Self {
        if let Err(e) = config::init_config_dir(config_dir) {
            warn!("Failed to initialize config dir: {}", e);
        }
        let settings = config::load_settings(config_dir);
        Self::with_settings(settings, rpc)
    }

    /// Create an engine from already-loaded settings, loading and mirroring
    /// the persisted cache if enabled
    pub fn with_settings(settings: Settings, rpc: R) -> Self {
        let mut cache = CacheStore::new(settings.cache.ttl_policy(), Arc::new(SystemClock));

        let mut mirror = None;
        if let Some(path) = settings.cache.cache_file() {
            let kept = cache.seed(load_cache_file(&path));
            let (handle, task) = spawn_cache_mirror(path, kept);
            cache = cache.with_mirror(handle.clone());
            mirror = Some((handle, task));
        }

        let mut engine = Self::with_cache(settings, cache, rpc);
        engine.mirror = mirror;
        engine
    }

    /// Create an engine around a prepared cache (no mirror task)
    pub fn with_cache(settings: Settings, cache: CacheStore, rpc: R) -> Self {
        let state = AppState::with_cache(settings, cache);
        let (msg_tx, msg_rx) = mpsc::channel::<Message>(MESSAGE_CHANNEL_CAPACITY);

        Self {
            state,
            msg_tx,
            msg_rx,
            rpc: Arc::new(rpc),
            mirror: None,
        }
    }

    /// Load the active panel's data
    pub fn start(&mut self) {
        let kind = self.state.active_panel().kind;
        self.process_message(Message::RequestData { kind });
    }

    /// Process a single message through the TEA update cycle
    pub fn process_message(&mut self, msg: Message) {
        process::process_message(&mut self.state, msg, &self.msg_tx, &self.rpc);
    }

    /// Drain and process all pending messages from the channel.
    ///
    /// Returns the number of messages processed.
    pub fn drain_pending_messages(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.process_message(msg);
            count += 1;
        }
        count
    }

    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    pub fn should_quit(&self) -> bool {
        self.state.should_quit()
    }

    /// Process messages one at a time until quit
    pub async fn run(&mut self) {
        self.start();
        while !self.should_quit() {
            let Some(msg) = self.msg_rx.recv().await else {
                break;
            };
            self.process_message(msg);
        }
        info!("Engine loop finished");
    }

    /// Flush the cache mirror and stop it. Outstanding device calls are not
    /// waited for.
    pub async fn shutdown(&mut self) {
        let Some((handle, task)) = self.mirror.take() else {
            return;
        };

        match tokio::time::timeout(MIRROR_FLUSH_TIMEOUT, handle.flush()).await {
            Ok(Ok(())) => debug!("Cache mirror flushed"),
            Ok(Err(e)) => warn!("Cache mirror flush failed: {}", e),
            Err(_) => warn!("Cache mirror flush timed out"),
        }
        task.abort();
    }
}
