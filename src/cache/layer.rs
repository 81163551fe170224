// Read-through cache over an in-memory map and an optional filesystem store.
// On a miss the supplied producer performs the fetch; concurrent misses for
// the same key are collapsed into a single producer invocation.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::Result;

use super::{paths, store};

/// Cache of JSON API responses keyed by opaque request key.
///
/// With a storage directory configured, entries persist across processes;
/// without one the cache lives in memory for the process lifetime only.
/// Entries are never evicted or expired.
#[derive(Debug)]
pub struct ApiDataCache {
    dir: Option<PathBuf>,
    memory: RwLock<HashMap<String, Value>>,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ApiDataCache {
    /// Create a cache. `dir` is the storage root for persisted entries,
    /// or `None` for an in-memory-only cache.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            memory: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Storage root for persisted entries, if configured.
    pub fn dir(&self) -> Option<&PathBuf> {
        self.dir.as_ref()
    }

    /// Return the value for `key`, invoking `producer` to fetch it on a miss.
    ///
    /// A successful fetch is stored before being returned, so at most one
    /// fetch happens per key per cache lifetime. A failed fetch stores
    /// nothing; the next call for the key invokes the producer again.
    pub async fn get_or_request<F, Fut>(&self, key: &str, producer: F) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        if let Some(value) = self.lookup(key).await {
            debug!(key, "cache hit");
            return Ok(value);
        }

        // Per-key lock so concurrent misses collapse into one fetch. Locks
        // are retained for the cache lifetime: retries after a failed fetch
        // keep serializing on the same lock, and the map is bounded by the
        // same key space the memory map holds anyway.
        let flight = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.entry(key.to_string()).or_default().clone()
        };
        let _guard = flight.lock().await;

        // Another caller may have completed the fetch while we waited.
        if let Some(value) = self.lookup(key).await {
            debug!(key, "cache hit after in-flight fetch");
            return Ok(value);
        }

        debug!(key, "cache miss, fetching");
        match producer().await {
            Ok(value) => {
                self.store(key, &value).await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }

    /// Look up a key in memory, then on disk. Disk hits are promoted into
    /// the in-memory map. An unreadable persisted entry counts as a miss.
    async fn lookup(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.memory.read().await.get(key) {
            return Some(value.clone());
        }

        let dir = self.dir.as_ref()?;
        let path = paths::entry_path(dir, key);
        match store::read_entry::<Value>(&path) {
            Ok(Some(cached)) => {
                let value = cached.data;
                self.memory
                    .write()
                    .await
                    .insert(key.to_string(), value.clone());
                Some(value)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(key, error = %err, "unreadable cache entry, treating as miss");
                None
            }
        }
    }

    async fn store(&self, key: &str, value: &Value) -> Result<()> {
        if let Some(dir) = &self.dir {
            store::write_entry(&paths::entry_path(dir, key), value)?;
        }
        self.memory
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OctocacheError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_second_get_skips_producer() {
        let cache = ApiDataCache::new(None);
        let calls = AtomicUsize::new(0);

        let produce = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(json!({"name": "bug"})) }
        };

        let first = cache.get_or_request("users/octocat", produce).await.unwrap();
        let second = cache
            .get_or_request("users/octocat", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"name": "other"}))
            })
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();

        let cache = ApiDataCache::new(Some(dir.clone()));
        cache
            .get_or_request("repos/org/repo/issues/42", || async {
                Ok(json!({"labels": [{"name": "bug"}]}))
            })
            .await
            .unwrap();

        // A fresh instance over the same directory serves the entry
        // without invoking its producer.
        let reopened = ApiDataCache::new(Some(dir));
        let value = reopened
            .get_or_request("repos/org/repo/issues/42", || async {
                panic!("producer must not run for a persisted entry")
            })
            .await
            .unwrap();

        assert_eq!(value, json!({"labels": [{"name": "bug"}]}));
    }

    #[tokio::test]
    async fn test_failed_producer_stores_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ApiDataCache::new(Some(temp_dir.path().to_path_buf()));

        let result = cache
            .get_or_request("users/octocat", || async {
                Err(OctocacheError::Other("connection refused".to_string()))
            })
            .await;
        assert!(result.is_err());

        // The next call retries the fetch.
        let value = cache
            .get_or_request("users/octocat", || async { Ok(json!({"name": "ok"})) })
            .await
            .unwrap();
        assert_eq!(value, json!({"name": "ok"}));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = ApiDataCache::new(None);
        let calls = AtomicUsize::new(0);

        for key in ["users/a", "users/b"] {
            cache
                .get_or_request(key, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({"login": key}))
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            cache
                .get_or_request("users/a", || async { unreachable!() })
                .await
                .unwrap(),
            json!({"login": "users/a"})
        );
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let cache = ApiDataCache::new(None);
        let calls = AtomicUsize::new(0);

        let produce = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(json!({"name": "The Octocat"}))
        };

        let (a, b) = tokio::join!(
            cache.get_or_request("users/octocat", produce),
            cache.get_or_request("users/octocat", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"name": "duplicate fetch"}))
            }),
        );

        assert_eq!(a.unwrap(), json!({"name": "The Octocat"}));
        assert_eq!(b.unwrap(), json!({"name": "The Octocat"}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_misses_stay_serialized_after_failed_fetch() {
        let cache = ApiDataCache::new(None);
        let active = AtomicUsize::new(0);
        let overlap = AtomicUsize::new(0);
        let active = &active;
        let overlap = &overlap;

        // Producer that records whether another producer is running while
        // it does, then resolves to `result` after `delay_ms`.
        let produce = |delay_ms: u64, result: crate::error::Result<serde_json::Value>| {
            move || async move {
                if active.fetch_add(1, Ordering::SeqCst) > 0 {
                    overlap.fetch_add(1, Ordering::SeqCst);
                }
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                result
            }
        };

        let (a, b, c) = tokio::join!(
            // First caller's fetch fails.
            cache.get_or_request(
                "users/octocat",
                produce(
                    20,
                    Err(OctocacheError::Other("connection refused".to_string()))
                )
            ),
            // Arrives while the first fetch is in flight; retries after it fails.
            async {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                cache
                    .get_or_request("users/octocat", produce(40, Ok(json!({"name": "retry"}))))
                    .await
            },
            // Arrives after the failure, while the retry is still running.
            async {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                cache
                    .get_or_request("users/octocat", produce(10, Ok(json!({"name": "late"}))))
                    .await
            },
        );

        assert!(a.is_err());
        assert_eq!(b.unwrap(), json!({"name": "retry"}));
        assert_eq!(c.unwrap(), json!({"name": "retry"}));
        assert_eq!(overlap.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_corrupt_entry_treated_as_miss() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();

        let path = crate::cache::paths::entry_path(&dir, "users/octocat");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let cache = ApiDataCache::new(Some(dir));
        let value = cache
            .get_or_request("users/octocat", || async { Ok(json!({"name": "fresh"})) })
            .await
            .unwrap();
        assert_eq!(value, json!({"name": "fresh"}));
    }
}
