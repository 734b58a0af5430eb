//! Stale-while-revalidate decisions for one panel's data kind

use std::sync::Arc;

use devdeck_core::prelude::*;
use devdeck_core::{CacheKey, DataKind, DeviceId, Payload};

use super::store::CacheStore;

/// What a panel should show and whether a fetch must be dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshDecision {
    /// Fresh data, nothing to fetch
    Hit { payload: Arc<Payload> },
    /// Old data served immediately; `fetch` is set when this request claimed
    /// the background refresh
    StaleHit { payload: Arc<Payload>, fetch: bool },
    /// Nothing cached; `fetch` is set when this request claimed the
    /// foreground fetch
    Miss { fetch: bool },
}

impl RefreshDecision {
    pub fn should_fetch(&self) -> bool {
        match self {
            RefreshDecision::Hit { .. } => false,
            RefreshDecision::StaleHit { fetch, .. } | RefreshDecision::Miss { fetch } => *fetch,
        }
    }

    /// A fetch for a stale hit runs in the background; a miss fetch blocks
    /// the panel in a loading state
    pub fn is_background(&self) -> bool {
        matches!(self, RefreshDecision::StaleHit { .. })
    }
}

/// Per-panel front end to the shared [`CacheStore`]
#[derive(Debug, Clone, Copy)]
pub struct RefreshCoordinator {
    kind: DataKind,
}

impl RefreshCoordinator {
    pub fn new(kind: DataKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> DataKind {
        self.kind
    }

    pub fn key_for(&self, device: &DeviceId) -> CacheKey {
        CacheKey::new(device.clone(), self.kind)
    }

    /// Serve from cache and claim a fetch if one is needed and none is in
    /// flight for the key
    pub fn request(&self, store: &mut CacheStore, device: &DeviceId) -> RefreshDecision {
        let key = self.key_for(device);
        let decision = match store.get(&key) {
            None => RefreshDecision::Miss {
                fetch: store.mark_refreshing(&key),
            },
            Some(hit) if !hit.stale => RefreshDecision::Hit {
                payload: hit.payload,
            },
            Some(hit) => RefreshDecision::StaleHit {
                payload: hit.payload,
                fetch: store.mark_refreshing(&key),
            },
        };
        debug!("Cache request {}: {:?}", key, DecisionLog(&decision));
        decision
    }

    /// Serve from cache without ever claiming a fetch
    pub fn peek(&self, store: &CacheStore, device: &DeviceId) -> RefreshDecision {
        match store.get(&self.key_for(device)) {
            None => RefreshDecision::Miss { fetch: false },
            Some(hit) if !hit.stale => RefreshDecision::Hit {
                payload: hit.payload,
            },
            Some(hit) => RefreshDecision::StaleHit {
                payload: hit.payload,
                fetch: false,
            },
        }
    }

    /// Apply a finished fetch to the store.
    ///
    /// The fetch claim is released whatever the outcome. On success the
    /// payload replaces the entry; on failure any stale entry stays in place.
    /// A payload of the wrong kind is reported as a failure.
    ///
    /// Returns `None` when the key was invalidated after the fetch was
    /// dispatched: the reply predates a write and is dropped unapplied.
    pub fn complete(
        &self,
        store: &mut CacheStore,
        key: &CacheKey,
        generation: u64,
        result: std::result::Result<Arc<Payload>, String>,
    ) -> Option<std::result::Result<Arc<Payload>, String>> {
        store.clear_refreshing(key, generation);
        if generation != store.generation(key) {
            debug!(
                "Dropping reply for {}: generation {} superseded by {}",
                key,
                generation,
                store.generation(key)
            );
            return None;
        }

        Some(match result {
            Ok(payload) => match store.put(key.clone(), payload.clone()) {
                Ok(()) => Ok(payload),
                Err(e) => {
                    warn!("Rejected fetch result for {}: {}", key, e);
                    Err(e.to_string())
                }
            },
            Err(e) => {
                debug!("Fetch for {} failed: {}", key, e);
                Err(e)
            }
        })
    }
}

/// Compact debug form that omits the payload body
struct DecisionLog<'a>(&'a RefreshDecision);

impl std::fmt::Debug for DecisionLog<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            RefreshDecision::Hit { .. } => write!(f, "hit"),
            RefreshDecision::StaleHit { fetch, .. } => write!(f, "stale (fetch={})", fetch),
            RefreshDecision::Miss { fetch } => write!(f, "miss (fetch={})", fetch),
        }
    }
}
