//! Process-wide handle to the local mirror.
//!
//! The database opens lazily on first access. Concurrent first callers share a
//! single open (and migration run): later callers wait on the same cell.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, OnceCell};

use crate::db::{Database, LibSqlObjectStore, ObjectStore, Record, StoreKey};
use crate::Result;

#[derive(Debug, Clone)]
enum Location {
    Path(PathBuf),
    InMemory,
}

/// Thread-safe service for object store operations.
#[derive(Clone)]
pub struct StorageService {
    cell: Arc<OnceCell<Mutex<Database>>>,
    location: Location,
    target_version: i32,
    opens: Arc<AtomicUsize>,
}

impl StorageService {
    /// Storage backed by a file, opened on first use.
    pub fn open_path(db_path: impl Into<PathBuf>, target_version: i32) -> Self {
        Self::with_location(Location::Path(db_path.into()), target_version)
    }

    /// In-memory storage (primarily for tests).
    pub fn in_memory(target_version: i32) -> Self {
        Self::with_location(Location::InMemory, target_version)
    }

    fn with_location(location: Location, target_version: i32) -> Self {
        Self {
            cell: Arc::new(OnceCell::new()),
            location,
            target_version,
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Lock the database, opening and migrating it on first use.
    pub async fn database(&self) -> Result<MutexGuard<'_, Database>> {
        let cell = self
            .cell
            .get_or_try_init(|| async {
                self.opens.fetch_add(1, Ordering::SeqCst);
                let db = match &self.location {
                    Location::Path(path) => {
                        if let Some(parent) = path.parent() {
                            if !parent.as_os_str().is_empty() {
                                std::fs::create_dir_all(parent)?;
                            }
                        }
                        tracing::info!("Opening local mirror at {}", path.display());
                        Database::open(path, self.target_version).await
                    }
                    Location::InMemory => Database::open_in_memory(self.target_version).await,
                }
                .inspect_err(|error| tracing::error!("Failed to open local mirror: {error}"))?;
                Ok::<_, crate::Error>(Mutex::new(db))
            })
            .await?;
        Ok(cell.lock().await)
    }

    /// How many times the underlying database was opened (at most once).
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Upsert a record.
    pub async fn put<R: Record>(&self, record: &R) -> Result<()> {
        let db = self.database().await?;
        let store = LibSqlObjectStore::<R>::new(db.connection());
        logged(R::STORE, "put", store.put(record).await)
    }

    /// Fetch a record by key.
    pub async fn get<R: Record>(&self, key: impl Into<StoreKey>) -> Result<Option<R>> {
        let key = key.into();
        let db = self.database().await?;
        let store = LibSqlObjectStore::<R>::new(db.connection());
        logged(R::STORE, "get", store.get(&key).await)
    }

    /// Fetch every record of a store.
    pub async fn get_all<R: Record>(&self) -> Result<Vec<R>> {
        let db = self.database().await?;
        let store = LibSqlObjectStore::<R>::new(db.connection());
        logged(R::STORE, "get_all", store.get_all().await)
    }

    /// Fetch records by secondary index.
    pub async fn get_all_by_index<R: Record>(&self, index: &str, value: i64) -> Result<Vec<R>> {
        let db = self.database().await?;
        let store = LibSqlObjectStore::<R>::new(db.connection());
        logged(
            R::STORE,
            "get_all_by_index",
            store.get_all_by_index(index, value).await,
        )
    }

    /// Delete a record by key.
    pub async fn delete<R: Record>(&self, key: impl Into<StoreKey>) -> Result<()> {
        let key = key.into();
        let db = self.database().await?;
        let store = LibSqlObjectStore::<R>::new(db.connection());
        logged(R::STORE, "delete", store.delete(&key).await)
    }

    /// Delete records by secondary index.
    pub async fn delete_by_index<R: Record>(&self, index: &str, value: i64) -> Result<u64> {
        let db = self.database().await?;
        let store = LibSqlObjectStore::<R>::new(db.connection());
        logged(
            R::STORE,
            "delete_by_index",
            store.delete_by_index(index, value).await,
        )
    }

    /// Delete every record of a store.
    pub async fn clear<R: Record>(&self) -> Result<()> {
        let db = self.database().await?;
        let store = LibSqlObjectStore::<R>::new(db.connection());
        logged(R::STORE, "clear", store.clear().await)
    }

    /// Number of records in a store.
    pub async fn count<R: Record>(&self) -> Result<u64> {
        let db = self.database().await?;
        let store = LibSqlObjectStore::<R>::new(db.connection());
        logged(R::STORE, "count", store.count().await)
    }
}

fn logged<T>(store: &str, operation: &str, result: Result<T>) -> Result<T> {
    result.inspect_err(|error| {
        tracing::error!(store, operation, "Object store operation failed: {error}");
    })
}
