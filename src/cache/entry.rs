//! Cache Entry Module
//!
//! Defines one logical cached item as it is stored inside a shard file.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// A stored value and the moment it stops being valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored value
    #[serde(rename = "data")]
    pub value: Value,
    /// Expiration timestamp (Unix seconds)
    #[serde(rename = "expired")]
    pub expires_at: i64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry expiring `ttl_seconds` after `now`.
    pub fn new(value: Value, now: i64, ttl_seconds: u64) -> Self {
        let ttl = i64::try_from(ttl_seconds).unwrap_or(i64::MAX);
        Self {
            value,
            expires_at: now.saturating_add(ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is still valid during the second it expires in; it turns
    /// stale once `now` is past `expires_at`.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at < now
    }
}
