//! Response cache contract and the in-memory reference implementation.
//!
//! The orchestrator treats the cache as an opaque byte-blob store: a miss
//! is `Ok(None)`, never an error, and corrupt values are handled by the
//! caller as misses.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::{Error, Result};

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn health(&self) -> Result<()>;
}

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Reader-writer-locked map. Expired entries read as misses immediately;
/// their memory is reclaimed by [`MemoryCache::spawn_sweeper`] or by the
/// next write to the same key.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        MemoryCache {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Periodic expiry sweep. Holds only a weak handle so the task ends
    /// when the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        const SWEEP_INTERVAL: Duration = Duration::from_secs(300);
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                let Some(cache) = weak.upgrade() else {
                    break;
                };
                cache.purge_expired();
            }
        })
    }

    fn purge_expired(&self) {
        let now = Instant::now();
        let Ok(mut entries) = self.entries.write() else {
            return;
        };
        entries.retain(|_, entry| entry.expires_at > now);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        MemoryCache::new()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| Error::cache_error("cache lock poisoned"))?;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::cache_error("cache lock poisoned"))?;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::cache_error("cache lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        self.entries
            .read()
            .map(|_| ())
            .map_err(|_| Error::cache_error("cache lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete_round_trip() {
        let cache = MemoryCache::new();
        cache
            .set("k", b"value".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"value".to_vec()));

        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_miss_is_none_not_error() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_miss() {
        let cache = MemoryCache::new();
        cache
            .set("k", b"v".to_vec(), Duration::from_millis(0))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_purge_reclaims_expired_entries() {
        let cache = MemoryCache::new();
        cache
            .set("dead", b"v".to_vec(), Duration::from_millis(0))
            .await
            .unwrap();
        cache
            .set("live", b"v".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.len(), 2);
        cache.purge_expired();
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_overwrite_refreshes_value() {
        let cache = MemoryCache::new();
        cache
            .set("k", b"old".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("k", b"new".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"new".to_vec()));
    }
}
