// SPDX-FileCopyrightText: 2025 Batchread Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Time- and block-aware cache for contract read results.
//!
//! Entries are keyed by (address, function, encoded args, block tag) and are
//! valid while both conditions hold:
//!
//! - the entry is younger than its TTL, and
//! - no newer chain height than the entry's watermark is known.
//!
//! Failed fetches are never cached. Entries are removed by explicit
//! invalidation (full, substring, or predicate), or by the expiry sweep.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::Address;
use tracing::debug;

/// Key identifying one cached read result.
///
/// Renders as `address:function:args:block`, which is what substring
/// invalidation patterns match against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    address: Address,
    function: String,
    args: String,
    block: String,
}

impl CacheKey {
    pub(crate) fn new(address: Address, function: String, args: String, block: String) -> Self {
        Self {
            address,
            function,
            args,
            block,
        }
    }

    /// Target contract address of the cached call.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Function name of the cached call.
    pub fn function(&self) -> &str {
        &self.function
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.address, self.function, self.args, self.block
        )
    }
}

/// Entry in the read cache with expiry metadata.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The decoded result of the last successful fetch.
    value: Vec<DynSolValue>,
    /// When the result was captured.
    captured_at: Instant,
    /// How long the result stays fresh.
    ttl: Duration,
    /// Chain height known when the result was captured, if any.
    height: Option<u64>,
}

impl CacheEntry {
    fn is_valid(&self, now: Instant, latest_height: Option<u64>) -> bool {
        if now.duration_since(self.captured_at) >= self.ttl {
            return false;
        }
        match (self.height, latest_height) {
            (Some(entry_height), Some(latest)) => entry_height >= latest,
            // No watermark recorded, or no height known at all.
            _ => true,
        }
    }
}

/// In-memory cache of successful contract reads.
///
/// Owned by the read manager and mutated only under the manager's lock, so it
/// needs no interior synchronization of its own.
#[derive(Debug, Default)]
pub struct ReadCache {
    entries: HashMap<CacheKey, CacheEntry>,
    /// Highest chain height reported so far.
    latest_height: Option<u64>,
}

impl ReadCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key` if a valid entry exists.
    ///
    /// Invalid entries (expired, or stale against the height watermark) are
    /// removed on access and reported as misses.
    pub fn get(&mut self, key: &CacheKey) -> Option<Vec<DynSolValue>> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.is_valid(now, self.latest_height) => Some(entry.value.clone()),
            Some(_) => {
                debug!(key = %key, "cache entry stale, removing");
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Inserts or overwrites the entry for `key`.
    ///
    /// The entry is stamped with the latest known chain height as its
    /// watermark; a later `record_height` with a newer height invalidates it.
    pub fn insert(&mut self, key: CacheKey, value: Vec<DynSolValue>, ttl: Duration) {
        debug!(key = %key, ?ttl, "caching read result");
        self.entries.insert(
            key,
            CacheEntry {
                value,
                captured_at: Instant::now(),
                ttl,
                height: self.latest_height,
            },
        );
    }

    /// Records a newly observed chain height.
    ///
    /// Heights are monotonic; an older report than the current watermark is
    /// ignored. Entries captured at an older height become invalid.
    pub fn record_height(&mut self, height: u64) {
        if self.latest_height.is_none_or(|current| height > current) {
            self.latest_height = Some(height);
        }
    }

    /// Removes every entry. Returns the number removed.
    pub fn invalidate_all(&mut self) -> usize {
        let removed = self.entries.len();
        debug!(removed, "clearing read cache");
        self.entries.clear();
        removed
    }

    /// Removes every entry whose rendered key contains `pattern`.
    ///
    /// No-op for patterns matching nothing.
    pub fn invalidate_matching(&mut self, pattern: &str) -> usize {
        self.invalidate_where(|key| key.to_string().contains(pattern))
    }

    /// Removes every entry whose key matches `predicate`. Returns the number
    /// removed.
    pub fn invalidate_where(&mut self, predicate: impl Fn(&CacheKey) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !predicate(key));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, "invalidated cache entries");
        }
        removed
    }

    /// Removes every presently-invalid entry. Returns the number removed.
    ///
    /// Running the sweep twice with no writes in between is a no-op the
    /// second time.
    pub fn sweep_expired(&mut self) -> usize {
        let now = Instant::now();
        let latest_height = self.latest_height;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.is_valid(now, latest_height));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, "swept expired cache entries");
        }
        removed
    }

    /// Current number of entries, valid or not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
