//! Database connection management

use crate::error::Result;
use libsql::{Builder, Connection, Database as LibSqlDatabase};
use std::path::Path;

use super::migrations;

/// Database wrapper for a local libSQL mirror
pub struct Database {
    _db: LibSqlDatabase,
    conn: Connection,
    version: i32,
}

impl Database {
    /// Open a local database at the given path, creating it if it doesn't exist
    ///
    /// Migrates the store to `target_version`.
    pub async fn open(path: impl AsRef<Path>, target_version: i32) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let db = Builder::new_local(&path_str).build().await?;
        Self::from_libsql(db, target_version).await
    }

    /// Open an in-memory database (useful for testing)
    pub async fn open_in_memory(target_version: i32) -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::from_libsql(db, target_version).await
    }

    async fn from_libsql(db: LibSqlDatabase, target_version: i32) -> Result<Self> {
        let conn = db.connect()?;
        configure(&conn).await;
        let applied = migrations::run(&conn, target_version).await?;
        tracing::debug!(
            target_version,
            applied,
            "Opened local mirror"
        );

        Ok(Self {
            _db: db,
            conn,
            version: target_version,
        })
    }

    /// Schema version the store was migrated to
    pub const fn version(&self) -> i32 {
        self.version
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Configure `SQLite` for a single-writer local mirror
async fn configure(conn: &Connection) {
    // Pragmas return rows on some builds; failures here are not fatal
    conn.execute("PRAGMA journal_mode = WAL;", ()).await.ok();
    conn.execute("PRAGMA synchronous = NORMAL;", ()).await.ok();
    conn.execute("PRAGMA cache_size = 10000;", ()).await.ok();
}
