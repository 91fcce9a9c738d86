/// Access Token Revocation
///
/// Tokens revoked by logout stay rejected until the moment they would have
/// expired on their own. After that the signature check rejects them anyway,
/// so entries never need to outlive the token.
///
/// Tokens are keyed by their SHA-256 digest; plaintext credentials are never
/// held in the cache.
///
/// Expiry is enforced at lookup time. The background sweeper only reclaims
/// memory.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Process-wide set of revoked access tokens
pub trait RevocationStore: Send + Sync {
    /// Treat `token` as invalid for the next `ttl`. A zero `ttl` is a no-op.
    fn insert(&self, token: &str, ttl: Duration);

    /// True while a revocation for `token` is live.
    fn contains(&self, token: &str) -> bool;
}

/// In-memory revocation cache with per-entry expiry
#[derive(Default)]
pub struct RevocationCache {
    entries: RwLock<HashMap<String, Instant>>,
}

impl RevocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_at(&self, token: &str, ttl: Duration, now: Instant) {
        if ttl.is_zero() {
            return;
        }
        let expires_at = match now.checked_add(ttl) {
            Some(at) => at,
            None => return,
        };

        let key = digest(token);
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // A live entry is never extended; a lapsed one is replaced.
        entries
            .entry(key)
            .and_modify(|existing| {
                if *existing <= now {
                    *existing = expires_at;
                }
            })
            .or_insert(expires_at);
    }

    pub fn contains_at(&self, token: &str, now: Instant) -> bool {
        let key = digest(token);
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        entries.get(&key).map_or(false, |expires_at| now < *expires_at)
    }

    /// Drop every entry whose TTL has elapsed. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let before = entries.len();
        entries.retain(|_, expires_at| now < *expires_at);
        before - entries.len()
    }

    /// Physically held entries, including lapsed ones not yet purged.
    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Periodically compact the cache on the current tokio runtime.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.purge_expired(Instant::now());
                if removed > 0 {
                    tracing::debug!(removed, remaining = cache.len(), "Revocation cache swept");
                }
            }
        })
    }
}

impl RevocationStore for RevocationCache {
    fn insert(&self, token: &str, ttl: Duration) {
        self.insert_at(token, ttl, Instant::now());
    }

    fn contains(&self, token: &str) -> bool {
        self.contains_at(token, Instant::now())
    }
}

fn digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_contains_within_ttl_only() {
        let cache = RevocationCache::new();
        let start = Instant::now();
        let ttl = Duration::from_secs(30);

        cache.insert_at("token-a", ttl, start);

        assert!(cache.contains_at("token-a", start));
        assert!(cache.contains_at("token-a", start + Duration::from_secs(29)));
        assert!(!cache.contains_at("token-a", start + ttl));
        assert!(!cache.contains_at("token-a", start + Duration::from_secs(31)));
        assert!(!cache.contains_at("token-b", start));
    }

    #[test]
    fn test_zero_ttl_is_noop() {
        let cache = RevocationCache::new();
        cache.insert("token", Duration::ZERO);

        assert!(!cache.contains("token"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_live_entry_is_not_extended() {
        let cache = RevocationCache::new();
        let start = Instant::now();

        cache.insert_at("token", Duration::from_secs(10), start);
        cache.insert_at("token", Duration::from_secs(100), start + Duration::from_secs(5));

        assert!(!cache.contains_at("token", start + Duration::from_secs(10)));
    }

    #[test]
    fn test_lapsed_entry_can_be_replaced() {
        let cache = RevocationCache::new();
        let start = Instant::now();

        cache.insert_at("token", Duration::from_secs(10), start);
        let later = start + Duration::from_secs(20);
        cache.insert_at("token", Duration::from_secs(10), later);

        assert!(cache.contains_at("token", later + Duration::from_secs(5)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_purge_removes_only_lapsed_entries() {
        let cache = RevocationCache::new();
        let start = Instant::now();

        cache.insert_at("short", Duration::from_secs(5), start);
        cache.insert_at("long", Duration::from_secs(50), start);
        assert_eq!(cache.len(), 2);

        let removed = cache.purge_expired(start + Duration::from_secs(10));

        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_at("long", start + Duration::from_secs(10)));
    }

    #[test]
    fn test_plaintext_token_is_not_stored() {
        let cache = RevocationCache::new();
        cache.insert("secret-token-value", Duration::from_secs(60));

        let entries = cache.entries.read().unwrap();
        assert!(!entries.contains_key("secret-token-value"));
        assert_eq!(entries.keys().next().map(String::len), Some(64));
    }

    #[test]
    fn test_concurrent_inserts_are_never_lost() {
        let cache = Arc::new(RevocationCache::new());
        let threads = 8;
        let per_thread = 250;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..per_thread {
                        let token = format!("token-{}-{}", t, i);
                        cache.insert(&token, Duration::from_secs(600));
                        assert!(cache.contains(&token));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("worker panicked");
        }

        assert_eq!(cache.len(), threads * per_thread);
        for t in 0..threads {
            for i in 0..per_thread {
                assert!(cache.contains(&format!("token-{}-{}", t, i)));
            }
        }
    }

    #[tokio::test]
    async fn test_sweeper_compacts_lapsed_entries() {
        let cache = Arc::new(RevocationCache::new());
        cache.insert("brief", Duration::from_millis(20));
        cache.insert("lasting", Duration::from_secs(600));

        let sweeper = cache.spawn_sweeper(Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(200)).await;
        sweeper.abort();

        assert_eq!(cache.len(), 1);
        assert!(cache.contains("lasting"));
    }
}
