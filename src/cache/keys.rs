//! Cache key layout and cluster slot computation.
//!
//! Two key families share the cache:
//!
//! - `post:{id}`: one serialized post per key. No hash tag, so item keys
//!   scatter across the whole cluster and item reads fan out over every node.
//! - `{user:{id}}:posts`: per-user sorted set of post IDs scored by creation
//!   time. The braces are a hash tag: the cluster hashes only `user:{id}`,
//!   pinning all of one user's list keys to a single slot.

use std::time::Duration;

use crc::{Crc, CRC_16_XMODEM};

/// TTL applied to every cache entry; the owner index is re-extended on each
/// mutation so active users keep a warm list.
pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Slot count fixed by the Redis Cluster specification.
pub const TOTAL_SLOTS: u16 = 16384;

/// CRC16 variant used by Redis Cluster key hashing.
static CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

pub fn post_key(id: i64) -> String {
    format!("post:{id}")
}

pub fn user_posts_key(user_id: i64) -> String {
    format!("{{user:{user_id}}}:posts")
}

/// Compute the cluster slot for a key.
///
/// Applies the standard hash-tag rule: when the key contains a non-empty
/// `{...}` section, only the bytes between the first `{` and the next `}`
/// are hashed.
pub fn key_hash_slot(key: &str) -> u16 {
    CRC16.checksum(hash_tag(key).as_bytes()) % TOTAL_SLOTS
}

fn hash_tag(key: &str) -> &str {
    if let Some(open) = key.find('{') {
        if let Some(close) = key[open + 1..].find('}') {
            if close > 0 {
                return &key[open + 1..open + 1 + close];
            }
        }
    }
    key
}
