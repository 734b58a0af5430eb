//! Persisted mirror of the cache
//!
//! A durable copy, never the source of truth. The file is read once at
//! startup; afterwards a background task owns it and rewrites it whenever the
//! store forwards a put or invalidate. Anything unreadable is treated as a
//! miss.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use devdeck_core::prelude::*;
use devdeck_core::{CacheKey, Payload};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// On-disk format version
pub const CACHE_FILE_VERSION: u32 = 1;

/// One entry as stored on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedEntry {
    #[serde(flatten)]
    pub key: CacheKey,
    pub fetched_at: DateTime<Utc>,
    pub payload: Payload,
}

/// Entries are kept as raw JSON so one bad entry does not poison the file
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile<E> {
    version: u32,
    entries: E,
}

/// Load persisted entries.
///
/// Never fails: a missing file, an unreadable file or a version mismatch all
/// yield an empty list, and individual entries that do not decode are
/// skipped.
pub fn load_cache_file(path: &Path) -> Vec<PersistedEntry> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No cache file at {:?}", path);
            return Vec::new();
        }
        Err(e) => {
            warn!("Failed to read cache file {:?}: {}", path, e);
            return Vec::new();
        }
    };

    let file: CacheFile<Vec<serde_json::Value>> = match serde_json::from_str(&content) {
        Ok(file) => file,
        Err(e) => {
            warn!(
                "Ignoring cache file {:?}: {}",
                path,
                Error::cache_decode(e.to_string())
            );
            return Vec::new();
        }
    };

    if file.version != CACHE_FILE_VERSION {
        warn!(
            "Ignoring cache file {:?}: version {} (expected {})",
            path, file.version, CACHE_FILE_VERSION
        );
        return Vec::new();
    }

    let total = file.entries.len();
    let entries: Vec<PersistedEntry> = file
        .entries
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<PersistedEntry>(raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping cache entry: {}", e);
                None
            }
        })
        .collect();

    info!(
        "Loaded {} cached entries from {:?} ({} skipped)",
        entries.len(),
        path,
        total - entries.len()
    );
    entries
}

/// Rewrite the cache file under an exclusive lock
pub fn write_cache_file(path: &Path, entries: &[PersistedEntry]) -> Result<()> {
    let content = serde_json::to_string_pretty(&CacheFile {
        version: CACHE_FILE_VERSION,
        entries,
    })?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;

    file.lock_exclusive()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;

    debug!("Wrote {} cache entries to {:?}", entries.len(), path);
    Ok(())
}

/// Operation forwarded from the store to the mirror task
#[derive(Debug)]
pub enum MirrorOp {
    Put {
        key: CacheKey,
        payload: Arc<Payload>,
        fetched_at: DateTime<Utc>,
    },
    Invalidate {
        key: CacheKey,
    },
    /// Reply once every op queued before this one is on disk
    Flush(oneshot::Sender<()>),
}

/// Non-blocking sender side of the mirror
#[derive(Debug, Clone)]
pub struct MirrorHandle {
    tx: mpsc::UnboundedSender<MirrorOp>,
}

impl MirrorHandle {
    pub fn put(&self, key: CacheKey, payload: Arc<Payload>, fetched_at: DateTime<Utc>) {
        self.send(MirrorOp::Put {
            key,
            payload,
            fetched_at,
        });
    }

    pub fn invalidate(&self, key: CacheKey) {
        self.send(MirrorOp::Invalidate { key });
    }

    /// Wait until everything queued so far has been written
    pub async fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(MirrorOp::Flush(done_tx))
            .map_err(|_| Error::channel_send("cache mirror stopped"))?;
        done_rx.await.map_err(|_| Error::ChannelClosed)
    }

    fn send(&self, op: MirrorOp) {
        if self.tx.send(op).is_err() {
            debug!("Cache mirror stopped, dropping op");
        }
    }
}

/// Spawn the task that owns the cache file.
///
/// `initial` should be what [`load_cache_file`] returned, so rewrites keep
/// entries that were never touched this session. The task exits once every
/// [`MirrorHandle`] is dropped.
pub fn spawn_cache_mirror(
    path: PathBuf,
    initial: Vec<PersistedEntry>,
) -> (MirrorHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_mirror(path, initial, rx));
    (MirrorHandle { tx }, task)
}

async fn run_mirror(
    path: PathBuf,
    initial: Vec<PersistedEntry>,
    mut rx: mpsc::UnboundedReceiver<MirrorOp>,
) {
    let mut entries: HashMap<CacheKey, PersistedEntry> = initial
        .into_iter()
        .map(|entry| (entry.key.clone(), entry))
        .collect();

    while let Some(op) = rx.recv().await {
        let mut dirty = false;
        let mut waiters = Vec::new();

        // Coalesce a burst of ops into one write
        let mut next = Some(op);
        while let Some(op) = next {
            match op {
                MirrorOp::Put {
                    key,
                    payload,
                    fetched_at,
                } => {
                    entries.insert(
                        key.clone(),
                        PersistedEntry {
                            key,
                            fetched_at,
                            payload: (*payload).clone(),
                        },
                    );
                    dirty = true;
                }
                MirrorOp::Invalidate { key } => {
                    dirty |= entries.remove(&key).is_some();
                }
                MirrorOp::Flush(done) => waiters.push(done),
            }
            next = rx.try_recv().ok();
        }

        if dirty {
            let mut snapshot: Vec<PersistedEntry> = entries.values().cloned().collect();
            snapshot.sort_by(|a, b| a.key.cmp(&b.key));
            let target = path.clone();
            let written =
                tokio::task::spawn_blocking(move || write_cache_file(&target, &snapshot)).await;
            match written {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Failed to persist cache: {}", e),
                Err(e) => warn!("Cache write task failed: {}", e),
            }
        }

        for done in waiters {
            let _ = done.send(());
        }
    }

    debug!("Cache mirror for {:?} stopped", path);
}
