use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::config::{DEFAULT_CACHE_TTL, MAX_CACHE_TTL};

#[derive(Debug, Clone)]
struct CachedResponse {
    body: Arc<[u8]>,
    expires_at: Instant,
}

/// Response bodies of successful `GET` requests, keyed by URL.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    entries: Arc<DashMap<String, CachedResponse>>,
    default_ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl ResponseCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the cached body, evicting it first if it has expired.
    pub fn get(&self, key: &str) -> Option<Arc<[u8]>> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(Arc::clone(&entry.body)),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    /// Caches `body` for `ttl`, capped at [`MAX_CACHE_TTL`].
    pub fn store(&self, key: impl Into<String>, body: impl Into<Arc<[u8]>>, ttl: Duration) {
        let Some(expires_at) = Instant::now().checked_add(ttl.min(MAX_CACHE_TTL)) else {
            return;
        };
        self.entries.insert(
            key.into(),
            CachedResponse {
                body: body.into(),
                expires_at,
            },
        );
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.store("http://api/user", b"{}".to_vec(), Duration::from_secs(10));

        assert_eq!(cache.get("http://api/user").as_deref(), Some(&b"{}"[..]));

        tokio::time::advance(Duration::from_secs(11)).await;

        assert!(cache.get("http://api/user").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_is_capped() {
        let cache = ResponseCache::default();
        cache.store("http://api/user", b"{}".to_vec(), Duration::MAX);

        assert!(cache.get("http://api/user").is_some());

        tokio::time::advance(MAX_CACHE_TTL + Duration::from_secs(1)).await;

        assert!(cache.get("http://api/user").is_none());
    }

    #[test]
    fn test_clear() {
        let cache = ResponseCache::default();
        cache.store("a", b"1".to_vec(), cache.default_ttl());
        cache.store("b", b"2".to_vec(), cache.default_ttl());
        assert_eq!(cache.len(), 2);

        cache.clear();

        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }
}
