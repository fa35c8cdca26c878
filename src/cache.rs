// src/cache.rs
//! # Response Cache
//!
//! Time-expiring store for successful search responses, keyed by a stable
//! digest of `(query, source)`. Keeps repeated pipeline runs from re-hitting
//! paid and rate-limited backends.
//!
//! - Lazy expiry: age is checked on read, entries are never swept.
//! - Best effort: any internal fault (a poisoned lock) reads as a miss.
//! - In-memory only; losing the cache on restart is a cold-start penalty.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use crate::content::SearchPage;

pub const DEFAULT_TTL_SECS: u64 = 60 * 60 * 24;

#[derive(Debug, Clone)]
struct CacheSlot {
    stored_at: u64, // unix seconds
    page: SearchPage,
}

#[derive(Debug)]
pub struct ResponseCache {
    ttl_secs: u64,
    entries: RwLock<HashMap<String, CacheSlot>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl_secs: ttl.as_secs(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS))
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Stable key: identical `(query, source)` pairs hash identically
    /// regardless of call order or query whitespace/casing.
    fn cache_key(query: &str, source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(crate::text::normalize_key(query).as_bytes());
        hasher.update([0x1f]);
        hasher.update(source.as_bytes());
        let digest = hasher.finalize();
        let mut out = String::with_capacity(64);
        for b in digest.iter() {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }

    pub fn get(&self, query: &str, source: &str) -> Option<SearchPage> {
        self.get_at(now_unix(), query, source)
    }

    /// Read with an explicit clock, for deterministic TTL tests.
    /// An entry at or past the TTL is treated as absent, never returned.
    pub fn get_at(&self, now: u64, query: &str, source: &str) -> Option<SearchPage> {
        let key = Self::cache_key(query, source);
        let map = self.entries.read().ok()?;
        let slot = map.get(&key)?;
        if now.saturating_sub(slot.stored_at) >= self.ttl_secs {
            return None;
        }
        Some(slot.page.clone())
    }

    pub fn put(&self, query: &str, source: &str, page: SearchPage) {
        self.put_at(now_unix(), query, source, page);
    }

    /// Write with an explicit clock. Always overwrites; a lost race between
    /// two workers writing the same key is harmless (both wrote the same
    /// answer).
    pub fn put_at(&self, now: u64, query: &str, source: &str, page: SearchPage) {
        let key = Self::cache_key(query, source);
        if let Ok(mut map) = self.entries.write() {
            map.insert(
                key,
                CacheSlot {
                    stored_at: now,
                    page,
                },
            );
        }
    }

    #[cfg(test)]
    fn entry_count(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }
}

fn now_unix() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
