//! Sharded key-value cache layer for the post repository.
//!
//! The cache is never authoritative: every failure path degrades to a store
//! read, and stale entries age out at the TTL. See `repository` for the
//! decorator, `keys` for the key-space contract, and `router` for slot
//! attribution.

mod client;
mod keys;
mod metrics;
mod repository;
mod router;

pub use client::{CacheClient, CacheError, CacheOp, RedisCacheClient, ScoredMember, SlotRange};
pub use keys::{key_hash_slot, post_key, user_posts_key, CACHE_TTL, TOTAL_SLOTS};
pub use metrics::CacheMetrics;
pub use repository::CachedPostRepository;
pub use router::SlotRouter;
