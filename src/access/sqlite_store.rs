//! SQLite-backed capability store.
//!
//! The durable analog of the host key-value store: one table keyed by
//! fingerprint with a numeric index over last-access time, so staleness
//! eviction is a range delete over the index rather than a scan.

use crate::access::store::{CacheEntry, StoreBackend, ATIME_INDEX, STORE_NAME};
use crate::errors::StoreError;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// A capability type the host allows to cross the persistence boundary.
///
/// Only storage backends call these; the rest of the crate treats
/// capabilities as fully opaque. The byte encoding belongs to the host and
/// is never inspected here.
pub trait PersistableCapability: Sized {
    fn to_stored_bytes(&self) -> Vec<u8>;

    /// `None` when the stored bytes no longer describe a valid token.
    fn from_stored_bytes(bytes: &[u8]) -> Option<Self>;
}

/// Capability store backend over a single SQLite database.
///
/// Thread-safe: the inner connection is protected by a `Mutex`.
pub struct SqliteBackend<C> {
    conn: Mutex<Connection>,
    _capability: PhantomData<C>,
}

impl<C> SqliteBackend<C> {
    /// Open (creating if needed) the store at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .map_err(|e| StoreError::new(format!("failed to open database: {}", e)))?;
        let backend = Self::from_connection(conn)?;
        log::info!(
            "capability store opened at {} as {}",
            db_path.display(),
            STORE_NAME
        );
        Ok(backend)
    }

    /// Open a transient in-memory store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::new(format!("failed to open database: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {store} (
                fingerprint TEXT PRIMARY KEY,
                capability BLOB NOT NULL,
                atime INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS {index} ON {store} (atime);",
            store = STORE_NAME,
            index = ATIME_INDEX,
        ))
        .map_err(|e| StoreError::new(format!("failed to initialize store schema: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
            _capability: PhantomData,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::new("capability store mutex poisoned"))
    }
}

#[async_trait]
impl<C: PersistableCapability + Send + Sync> StoreBackend<C> for SqliteBackend<C> {
    async fn get(&self, fingerprint: &str) -> Result<Option<CacheEntry<C>>, StoreError> {
        let conn = self.lock()?;
        let row = conn.query_row(
            &format!(
                "SELECT capability, atime FROM {} WHERE fingerprint = ?1",
                STORE_NAME
            ),
            params![fingerprint],
            |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, i64>(1)?)),
        );

        match row {
            Ok((bytes, atime_ms)) => {
                let capability = C::from_stored_bytes(&bytes).ok_or_else(|| {
                    StoreError::new(format!(
                        "stored capability for {} is not decodable",
                        fingerprint
                    ))
                })?;
                Ok(Some(CacheEntry {
                    fingerprint: fingerprint.to_string(),
                    capability,
                    atime_ms,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::new(format!("failed to query store: {}", e))),
        }
    }

    async fn put(&self, entry: CacheEntry<C>) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (fingerprint, capability, atime) VALUES (?1, ?2, ?3)",
                STORE_NAME
            ),
            params![
                entry.fingerprint,
                entry.capability.to_stored_bytes(),
                entry.atime_ms
            ],
        )
        .map_err(|e| StoreError::new(format!("failed to write store entry: {}", e)))?;
        Ok(())
    }

    async fn delete(&self, fingerprint: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            &format!("DELETE FROM {} WHERE fingerprint = ?1", STORE_NAME),
            params![fingerprint],
        )
        .map_err(|e| StoreError::new(format!("failed to delete store entry: {}", e)))?;
        Ok(())
    }

    async fn delete_accessed_at_or_before(&self, threshold_ms: i64) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let removed = conn
            .execute(
                &format!("DELETE FROM {} WHERE atime <= ?1", STORE_NAME),
                params![threshold_ms],
            )
            .map_err(|e| StoreError::new(format!("failed to evict stale entries: {}", e)))?;
        Ok(removed as u64)
    }
}
