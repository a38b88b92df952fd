//! Namespaced in-memory cache with per-entry expiry.
//!
//! Values are stored as serialized JSON bodies. Every read checks expiry, so an
//! entry is never returned once `now > expires_at` even if no sweep has run
//! yet. Sweeps are amortized into [`TtlCache::set`]; there is no background
//! task.
//!
//! The cache fails open: a serialization fault or a poisoned lock is logged
//! and treated as a miss (reads) or a no-op (writes), never surfaced.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;
use tracing::error;

use crate::config::CacheConfig;
use crate::data_source::SourceError;

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Point-in-time entry counts. `total` includes expired entries not yet swept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
}

/// Thread-safe expiring key/value store.
///
/// Constructed once at startup and shared behind an `Arc`. Operations on the
/// same key are serialized by one lock, so the value observed for a key is
/// always the result of a total order of `set`/`del`/`clear` calls.
#[derive(Debug)]
pub struct TtlCache {
    namespace: String,
    default_ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl TtlCache {
    pub fn new(namespace: impl Into<String>, default_ttl: Duration) -> Self {
        Self {
            namespace: namespace.into(),
            default_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.namespace.clone(), config.default_ttl)
    }

    /// Returns the stored body, deleting it instead if it has expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let full_key = self.full_key(key);
        let mut entries = self.lock("get")?;
        let now = Instant::now();

        match entries.get(&full_key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(&full_key);
                None
            }
            Some(entry) => Some(entry.body.clone()),
            None => None,
        }
    }

    /// Stores `body` under `key`, overwriting any previous entry, then sweeps
    /// expired entries.
    pub fn set(&self, key: &str, body: String, ttl: Option<Duration>) {
        let full_key = self.full_key(key);
        let ttl = ttl.unwrap_or(self.default_ttl);
        let Some(mut entries) = self.lock("set") else {
            return;
        };

        let now = Instant::now();
        let Some(expires_at) = now.checked_add(ttl) else {
            log_fault("set", &SourceError::cache_fault(format!("ttl {ttl:?} overflows the clock")));
            return;
        };

        entries.insert(full_key, CacheEntry { body, expires_at });
        entries.retain(|_, entry| !entry.is_expired(now));
    }

    pub fn del(&self, key: &str) {
        let full_key = self.full_key(key);
        if let Some(mut entries) = self.lock("del") {
            entries.remove(&full_key);
        }
    }

    pub fn clear(&self) {
        if let Some(mut entries) = self.lock("clear") {
            entries.clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        let Some(entries) = self.lock("stats") else {
            return CacheStats::default();
        };
        let now = Instant::now();
        let expired = entries.values().filter(|entry| entry.is_expired(now)).count();

        CacheStats {
            total: entries.len(),
            valid: entries.len() - expired,
            expired,
        }
    }

    /// Typed read. A body that no longer deserializes is a logged miss.
    pub fn get_json<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let body = self.get(key)?;
        match serde_json::from_str(&body) {
            Ok(value) => Some(value),
            Err(err) => {
                log_fault(
                    "get",
                    &SourceError::cache_fault(format!("cached value for '{key}' is unreadable: {err}")),
                );
                None
            }
        }
    }

    /// Typed write. A value that fails to serialize is a logged no-op.
    pub fn set_json<T>(&self, key: &str, value: &T, ttl: Option<Duration>)
    where
        T: Serialize + ?Sized,
    {
        match serde_json::to_string(value) {
            Ok(body) => self.set(key, body, ttl),
            Err(err) => log_fault(
                "set",
                &SourceError::cache_fault(format!("value for '{key}' failed to serialize: {err}")),
            ),
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    fn lock(&self, op: &'static str) -> Option<MutexGuard<'_, HashMap<String, CacheEntry>>> {
        match self.entries.lock() {
            Ok(guard) => Some(guard),
            Err(_) => {
                log_fault(op, &SourceError::cache_fault("cache lock poisoned"));
                None
            }
        }
    }
}

fn log_fault(op: &'static str, fault: &SourceError) {
    error!(op, code = fault.code(), "cache fault: {}", fault.message());
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::ser::Error as _;

    use super::*;

    fn cache() -> TtlCache {
        TtlCache::new("dfm_stock_", Duration::from_secs(300))
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = cache();
        cache.set("stock_EMAAR", String::from("{}"), Some(Duration::from_secs(5)));
        assert_eq!(cache.get("stock_EMAAR").as_deref(), Some("{}"));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(cache.get("stock_EMAAR").is_some(), "expiry is strictly after the deadline");

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get("stock_EMAAR").is_none());
        assert_eq!(cache.stats().total, 0, "expired read deletes the entry");
    }

    #[tokio::test(start_paused = true)]
    async fn default_ttl_applies_when_none_given() {
        let cache = cache();
        cache.set("all_stocks", String::from("[]"), None);

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get("all_stocks").is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("all_stocks").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stats_count_unswept_expired_entries() {
        let cache = cache();
        cache.set("a", String::from("1"), Some(Duration::from_secs(1)));
        cache.set("b", String::from("2"), Some(Duration::from_secs(60)));

        tokio::time::advance(Duration::from_secs(2)).await;
        let stats = cache.stats();
        assert_eq!(
            stats,
            CacheStats {
                total: 2,
                valid: 1,
                expired: 1
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn set_sweeps_expired_entries() {
        let cache = cache();
        cache.set("old", String::from("1"), Some(Duration::from_secs(1)));
        tokio::time::advance(Duration::from_secs(2)).await;

        cache.set("new", String::from("2"), None);
        assert_eq!(
            cache.stats(),
            CacheStats {
                total: 1,
                valid: 1,
                expired: 0
            }
        );
    }

    #[test]
    fn namespaces_do_not_collide() {
        let cache = cache();
        cache.set("search_emaar", String::from("[]"), None);
        let entries = cache.entries.lock().expect("lock");
        assert!(entries.contains_key("dfm_stock_search_emaar"));
    }

    #[test]
    fn del_and_clear_remove_entries() {
        let cache = cache();
        cache.set("a", String::from("1"), None);
        cache.set("b", String::from("2"), None);

        cache.del("a");
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());

        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn unreadable_body_is_a_miss() {
        let cache = cache();
        cache.set("stock_DU", String::from("not json"), None);

        let value: Option<Vec<u32>> = cache.get_json("stock_DU");
        assert!(value.is_none());
    }

    #[test]
    fn unserializable_value_is_a_no_op() {
        struct Broken;
        impl Serialize for Broken {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(S::Error::custom("boom"))
            }
        }

        let cache = cache();
        cache.set_json("broken", &Broken, None);
        assert!(cache.get("broken").is_none());
        assert_eq!(cache.stats().total, 0);
    }

    #[test]
    fn poisoned_lock_fails_open() {
        let cache = Arc::new(cache());
        cache.set("a", String::from("1"), None);

        let poisoner = Arc::clone(&cache);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().expect("lock");
            panic!("poison the cache lock");
        })
        .join();

        assert!(cache.get("a").is_none());
        cache.set("b", String::from("2"), None);
        cache.del("a");
        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
