//! Keyed store of last-known-good device data
//!
//! Pure data structure: no I/O, never blocks. Persistence happens by
//! forwarding ops to an optional [`MirrorHandle`], which only enqueues.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use devdeck_core::prelude::*;
use devdeck_core::{CacheKey, DataKind, Payload};

use super::clock::{Clock, SystemClock};
use super::mirror::{MirrorHandle, PersistedEntry};

/// Default time-to-live for cached data
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Per-kind time-to-live
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    default: Duration,
    overrides: HashMap<DataKind, Duration>,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::uniform(DEFAULT_TTL)
    }
}

impl TtlPolicy {
    pub fn uniform(ttl: Duration) -> Self {
        Self {
            default: ttl,
            overrides: HashMap::new(),
        }
    }

    pub fn with_override(mut self, kind: DataKind, ttl: Duration) -> Self {
        self.overrides.insert(kind, ttl);
        self
    }

    pub fn ttl_for(&self, kind: DataKind) -> Duration {
        self.overrides.get(&kind).copied().unwrap_or(self.default)
    }
}

/// One cached fact. Replaced wholesale on every put.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub payload: Arc<Payload>,
    pub fetched_at: DateTime<Utc>,
    pub ttl: Duration,
    pub refreshing: bool,
}

impl CacheEntry {
    /// Age at `now`; clock skew into the past counts as zero
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.fetched_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.age(now) >= self.ttl
    }
}

/// Result of a successful [`CacheStore::get`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cached {
    pub payload: Arc<Payload>,
    pub stale: bool,
}

/// Shared cache of `(device, kind) -> entry`
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<CacheKey, CacheEntry>,
    /// Outstanding fetch per key, tagged with the generation it was
    /// dispatched under. Covers keys without an entry too.
    claims: HashMap<CacheKey, u64>,
    /// Bumped by every invalidate; replies from an older generation are
    /// never stored
    generations: HashMap<CacheKey, u64>,
    ttl: TtlPolicy,
    clock: Arc<dyn Clock>,
    mirror: Option<MirrorHandle>,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(TtlPolicy::default(), Arc::new(SystemClock))
    }
}

impl CacheStore {
    pub fn new(ttl: TtlPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            claims: HashMap::new(),
            generations: HashMap::new(),
            ttl,
            clock,
            mirror: None,
        }
    }

    /// Write every put/invalidate through to a persisted mirror
    pub fn with_mirror(mut self, mirror: MirrorHandle) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Seed entries loaded from the persisted mirror at startup.
    ///
    /// Entries whose payload does not match their key are dropped, so the
    /// key reads as a miss and gets a live fetch. Returns the entries kept,
    /// which is what the mirror should start from.
    pub fn seed(&mut self, loaded: Vec<PersistedEntry>) -> Vec<PersistedEntry> {
        let mut kept = Vec::with_capacity(loaded.len());
        for entry in loaded {
            if entry.payload.kind() != entry.key.kind {
                debug!("Dropping persisted entry {} with mismatched payload", entry.key);
                continue;
            }
            let ttl = self.ttl.ttl_for(entry.key.kind);
            self.entries.insert(
                entry.key.clone(),
                CacheEntry {
                    key: entry.key.clone(),
                    payload: Arc::new(entry.payload.clone()),
                    fetched_at: entry.fetched_at,
                    ttl,
                    refreshing: false,
                },
            );
            kept.push(entry);
        }
        kept
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Look up `key`. `None` means not found; `stale` is set once the
    /// entry's age reaches its TTL.
    pub fn get(&self, key: &CacheKey) -> Option<Cached> {
        let now = self.clock.now();
        self.entries.get(key).map(|entry| Cached {
            payload: entry.payload.clone(),
            stale: entry.is_stale(now),
        })
    }

    /// Raw entry access for display (age, refreshing flag)
    pub fn entry(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Replace the entry for `key` with a fresh one.
    ///
    /// Fails with [`Error::KindMismatch`] when the payload belongs to a
    /// different kind than the key; the store is left untouched.
    pub fn put(&mut self, key: CacheKey, payload: Arc<Payload>) -> Result<()> {
        if payload.kind() != key.kind {
            return Err(Error::KindMismatch {
                expected: key.kind,
                actual: payload.kind(),
            });
        }

        let fetched_at = self.clock.now();
        let ttl = self.ttl.ttl_for(key.kind);
        self.claims.remove(&key);

        if let Some(mirror) = &self.mirror {
            mirror.put(key.clone(), payload.clone(), fetched_at);
        }

        self.entries.insert(
            key.clone(),
            CacheEntry {
                key,
                payload,
                fetched_at,
                ttl,
                refreshing: false,
            },
        );
        Ok(())
    }

    /// Remove the entry for `key` and start a new generation.
    ///
    /// A fetch already in flight loses its claim: its reply belongs to the
    /// old generation and is dropped by [`RefreshCoordinator::complete`],
    /// and the next request may dispatch a fresh fetch straight away.
    ///
    /// [`RefreshCoordinator::complete`]: super::RefreshCoordinator::complete
    pub fn invalidate(&mut self, key: &CacheKey) {
        *self.generations.entry(key.clone()).or_insert(0) += 1;
        if self.claims.remove(key).is_some() {
            debug!("Orphaned in-flight fetch for {}", key);
        }
        if self.entries.remove(key).is_some() {
            if let Some(mirror) = &self.mirror {
                mirror.invalidate(key.clone());
            }
        }
    }

    /// Current generation of `key`. Fetches carry it so their replies can be
    /// matched against later invalidations.
    pub fn generation(&self, key: &CacheKey) -> u64 {
        self.generations.get(key).copied().unwrap_or(0)
    }

    /// Claim the right to fetch `key` in its current generation.
    ///
    /// Returns `true` if no fetch was in flight (the caller must now
    /// dispatch one and later call [`clear_refreshing`](Self::clear_refreshing)),
    /// `false` if another fetch already owns the key.
    pub fn mark_refreshing(&mut self, key: &CacheKey) -> bool {
        if self.claims.contains_key(key) {
            return false;
        }
        self.claims.insert(key.clone(), self.generation(key));
        if let Some(entry) = self.entries.get_mut(key) {
            entry.refreshing = true;
        }
        true
    }

    /// Release the fetch claim taken in `generation`, whatever the outcome.
    /// A claim from a newer generation is left alone.
    pub fn clear_refreshing(&mut self, key: &CacheKey, generation: u64) {
        if self.claims.get(key) != Some(&generation) {
            return;
        }
        self.claims.remove(key);
        if let Some(entry) = self.entries.get_mut(key) {
            entry.refreshing = false;
        }
    }

    pub fn is_refreshing(&self, key: &CacheKey) -> bool {
        self.claims.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
