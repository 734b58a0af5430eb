//! Stale-while-revalidate cache
//!
//! - [`store`] - keyed entries with TTL and the refresh claim
//! - [`refresh`] - per-panel hit/stale/miss decisions
//! - [`mirror`] - optional persisted copy on disk
//! - [`clock`] - injectable time source

pub mod clock;
pub mod mirror;
pub mod refresh;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use mirror::{load_cache_file, spawn_cache_mirror, MirrorHandle, PersistedEntry};
pub use refresh::{RefreshCoordinator, RefreshDecision};
pub use store::{CacheEntry, CacheStore, Cached, TtlPolicy, DEFAULT_TTL};
