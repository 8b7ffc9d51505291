//! Persistent fingerprint → capability cache with staleness eviction.
//!
//! The cache remembers which capability re-opens which file so a user does
//! not have to re-pick the same file every session. Entries age out after 30
//! days without access.

use crate::errors::{MediaGateResult, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::OnceCell;

/// Name of the single store this crate issues.
pub const STORE_NAME: &str = "fileHandleMemory";

/// Name of the secondary index over last-access time.
pub const ATIME_INDEX: &str = "atime";

/// Entries unused for this long are evicted by `cleanup`.
pub const RETENTION_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// One cached capability, keyed by file fingerprint.
///
/// Writes always replace the whole entry; `atime_ms` is refreshed on every
/// successful lookup.
#[derive(Debug, Clone)]
pub struct CacheEntry<C> {
    pub fingerprint: String,
    pub capability: C,
    pub atime_ms: i64,
}

/// Host-provided durable key-value storage for cache entries.
///
/// Primary key is the fingerprint; the backend additionally maintains a
/// numeric index over `atime_ms` so eviction is a range delete, not a scan.
#[async_trait]
pub trait StoreBackend<C>: Send + Sync {
    async fn get(&self, fingerprint: &str) -> Result<Option<CacheEntry<C>>, StoreError>;

    async fn put(&self, entry: CacheEntry<C>) -> Result<(), StoreError>;

    async fn delete(&self, fingerprint: &str) -> Result<(), StoreError>;

    /// Delete every entry with `atime_ms <= threshold` via the atime index.
    /// Returns the number of entries removed.
    async fn delete_accessed_at_or_before(&self, threshold_ms: i64) -> Result<u64, StoreError>;
}

/// Milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// The capability cache over a host-provided backend.
pub struct CapabilityStore<C> {
    backend: Box<dyn StoreBackend<C>>,
}

impl<C: Clone + Send + Sync> CapabilityStore<C> {
    pub fn new(backend: Box<dyn StoreBackend<C>>) -> Self {
        Self { backend }
    }

    /// Look up a cached capability. A hit also refreshes the entry's access
    /// time, so reads keep entries alive. A miss is `None`, not an error.
    pub async fn get(&self, fingerprint: &str) -> MediaGateResult<Option<C>> {
        let entry = self.backend.get(fingerprint).await?;
        if let Some(entry) = &entry {
            // touch: rewrite the whole entry with a fresh access time
            self.backend
                .put(CacheEntry {
                    fingerprint: entry.fingerprint.clone(),
                    capability: entry.capability.clone(),
                    atime_ms: now_millis(),
                })
                .await?;
        }
        Ok(entry.map(|e| e.capability))
    }

    /// Upsert a capability under a fingerprint. Last write wins.
    pub async fn put(&self, fingerprint: &str, capability: C) -> MediaGateResult<()> {
        self.backend
            .put(CacheEntry {
                fingerprint: fingerprint.to_string(),
                capability,
                atime_ms: now_millis(),
            })
            .await?;
        Ok(())
    }

    /// Remove an entry if present; absent keys are a no-op.
    pub async fn delete(&self, fingerprint: &str) -> MediaGateResult<()> {
        self.backend.delete(fingerprint).await?;
        Ok(())
    }

    /// Evict every entry last accessed 30 days ago or earlier. Idempotent,
    /// safe to invoke at any time; runs automatically at store open.
    pub async fn cleanup(&self) -> MediaGateResult<u64> {
        let threshold = now_millis() - RETENTION_MS;
        let evicted = self.backend.delete_accessed_at_or_before(threshold).await?;
        if evicted > 0 {
            log::info!("evicted {} stale capability cache entries", evicted);
        }
        Ok(evicted)
    }
}

/// Lazily-initialized, memoized handle to the capability store.
///
/// Concurrent first-time callers share a single initialization and receive
/// the same live store; a failed attempt is not cached, so the next call
/// retries. `cleanup` runs once as part of initialization and its failure
/// aborts store construction.
pub struct StoreCell<C> {
    cell: OnceCell<Arc<CapabilityStore<C>>>,
}

impl<C: Clone + Send + Sync + 'static> StoreCell<C> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub async fn open<F, Fut>(&self, make_backend: F) -> MediaGateResult<Arc<CapabilityStore<C>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MediaGateResult<Box<dyn StoreBackend<C>>>>,
    {
        self.cell
            .get_or_try_init(move || async move {
                let store = CapabilityStore::new(make_backend().await?);
                store.cleanup().await?;
                log::info!("capability store {} opened", STORE_NAME);
                Ok(Arc::new(store))
            })
            .await
            .cloned()
    }
}

impl<C: Clone + Send + Sync + 'static> Default for StoreCell<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory backend for hosts without durable storage and for tests.
///
/// Clones share the same underlying map.
#[derive(Clone)]
pub struct MemoryBackend<C> {
    entries: Arc<Mutex<HashMap<String, CacheEntry<C>>>>,
}

impl<C> MemoryBackend<C> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, CacheEntry<C>>>, StoreError>
    {
        self.entries
            .lock()
            .map_err(|_| StoreError::new("capability store mutex poisoned"))
    }

    /// Raw access-time lookup, bypassing the read-as-touch semantics.
    pub fn atime_of(&self, fingerprint: &str) -> Option<i64> {
        self.entries
            .lock()
            .ok()
            .and_then(|map| map.get(fingerprint).map(|e| e.atime_ms))
    }
}

impl<C> Default for MemoryBackend<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C: Clone + Send + Sync> StoreBackend<C> for MemoryBackend<C> {
    async fn get(&self, fingerprint: &str) -> Result<Option<CacheEntry<C>>, StoreError> {
        Ok(self.lock()?.get(fingerprint).cloned())
    }

    async fn put(&self, entry: CacheEntry<C>) -> Result<(), StoreError> {
        self.lock()?.insert(entry.fingerprint.clone(), entry);
        Ok(())
    }

    async fn delete(&self, fingerprint: &str) -> Result<(), StoreError> {
        self.lock()?.remove(fingerprint);
        Ok(())
    }

    async fn delete_accessed_at_or_before(&self, threshold_ms: i64) -> Result<u64, StoreError> {
        let mut map = self.lock()?;
        let before = map.len();
        map.retain(|_, entry| entry.atime_ms > threshold_ms);
        Ok((before - map.len()) as u64)
    }
}
