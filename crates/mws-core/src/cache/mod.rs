//! Named response caches.
//!
//! Cached responses live in their own database, apart from the entity mirror,
//! so dropping a cache never touches mirrored records or queued writes.

use std::path::PathBuf;
use std::sync::Arc;

use http::StatusCode;
use libsql::{params, Builder, Connection, Database as LibSqlDatabase};
use tokio::sync::{Mutex, MutexGuard, OnceCell};

use crate::error::Error;
use crate::request::{ApiResponse, SOURCE_HEADER};
use crate::util::unix_timestamp_millis;
use crate::Result;

/// Cache for the application shell.
pub const STATIC_CACHE: &str = "mws-static-v1";
/// Cache for restaurant photographs.
pub const IMAGE_CACHE: &str = "mws-img-v1";
/// Caches owned by this engine version; other `mws-` caches are stale.
pub const CURRENT_CACHES: [&str; 2] = [STATIC_CACHE, IMAGE_CACHE];

const CACHE_PREFIX: &str = "mws-";

const CREATE_ENTRIES: &str = "
CREATE TABLE IF NOT EXISTS cache_entries (
    cache_name TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    content_type TEXT,
    body BLOB NOT NULL,
    stored_at INTEGER NOT NULL,
    PRIMARY KEY (cache_name, url)
)";

struct CacheDatabase {
    _db: LibSqlDatabase,
    conn: Connection,
}

#[derive(Debug, Clone)]
enum Location {
    Path(PathBuf),
    InMemory,
}

/// Lazily opened store of cached responses, keyed by cache name and URL.
#[derive(Clone)]
pub struct ResponseCache {
    cell: Arc<OnceCell<Mutex<CacheDatabase>>>,
    location: Location,
}

impl ResponseCache {
    pub fn open_path(path: impl Into<PathBuf>) -> Self {
        Self {
            cell: Arc::new(OnceCell::new()),
            location: Location::Path(path.into()),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            cell: Arc::new(OnceCell::new()),
            location: Location::InMemory,
        }
    }

    async fn connection(&self) -> Result<MutexGuard<'_, CacheDatabase>> {
        let cell = self
            .cell
            .get_or_try_init(|| async {
                let target = match &self.location {
                    Location::Path(path) => {
                        if let Some(parent) = path.parent() {
                            if !parent.as_os_str().is_empty() {
                                std::fs::create_dir_all(parent)?;
                            }
                        }
                        path.to_string_lossy().to_string()
                    }
                    Location::InMemory => ":memory:".to_string(),
                };
                let db = Builder::new_local(&target).build().await?;
                let conn = db.connect()?;
                conn.execute(CREATE_ENTRIES, ()).await?;
                Ok::<_, Error>(Mutex::new(CacheDatabase { _db: db, conn }))
            })
            .await?;
        Ok(cell.lock().await)
    }

    /// Cached response for `url` in `cache`, if any.
    pub async fn match_url(&self, cache: &str, url: &str) -> Result<Option<ApiResponse>> {
        let db = self.connection().await?;
        let mut rows = db
            .conn
            .query(
                "SELECT status, content_type, body FROM cache_entries
                 WHERE cache_name = ?1 AND url = ?2",
                params![cache, url],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let status: i64 = row.get(0)?;
        let content_type: Option<String> = row.get(1)?;
        let body: Vec<u8> = row.get(2)?;

        let status = u16::try_from(status)
            .ok()
            .and_then(|status| StatusCode::from_u16(status).ok())
            .ok_or_else(|| Error::Storage(format!("cached status {status} is not valid")))?;
        let mut response = ApiResponse::new(status, body);
        if let Some(content_type) = content_type {
            response
                .headers
                .insert("content-type".to_string(), content_type);
        }
        response
            .headers
            .insert(SOURCE_HEADER.to_string(), "cache".to_string());
        Ok(Some(response))
    }

    /// Store `response` for `url` in `cache`, replacing any previous entry.
    pub async fn put(&self, cache: &str, url: &str, response: &ApiResponse) -> Result<()> {
        let db = self.connection().await?;
        db.conn
            .execute(
                "INSERT OR REPLACE INTO cache_entries
                 (cache_name, url, status, content_type, body, stored_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    cache,
                    url,
                    i64::from(response.status.as_u16()),
                    response.content_type().map(ToString::to_string),
                    response.body.clone(),
                    unix_timestamp_millis()
                ],
            )
            .await?;
        Ok(())
    }

    /// Drop a whole cache. Returns whether it had any entries.
    pub async fn delete_cache(&self, cache: &str) -> Result<bool> {
        let db = self.connection().await?;
        let removed = db
            .conn
            .execute(
                "DELETE FROM cache_entries WHERE cache_name = ?1",
                params![cache],
            )
            .await?;
        Ok(removed > 0)
    }

    /// Names of every non-empty cache, sorted.
    pub async fn cache_names(&self) -> Result<Vec<String>> {
        let db = self.connection().await?;
        let mut rows = db
            .conn
            .query(
                "SELECT DISTINCT cache_name FROM cache_entries ORDER BY cache_name",
                (),
            )
            .await?;
        let mut names = Vec::new();
        while let Some(row) = rows.next().await? {
            names.push(row.get::<String>(0)?);
        }
        Ok(names)
    }

    /// Delete every `mws-` cache not in [`CURRENT_CACHES`].
    pub async fn remove_stale(&self) -> Result<Vec<String>> {
        let mut removed = Vec::new();
        for name in self.cache_names().await? {
            if name.starts_with(CACHE_PREFIX) && !CURRENT_CACHES.contains(&name.as_str()) {
                self.delete_cache(&name).await?;
                tracing::info!(cache = %name, "Deleted stale cache");
                removed.push(name);
            }
        }
        Ok(removed)
    }
}
