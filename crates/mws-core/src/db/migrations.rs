//! Database migrations
//!
//! Every schema version is a pure addition (new store or new index). A store
//! at version N opened with target V runs the steps in (N, V] in order, each in
//! its own transaction, and records the version it reached.

use crate::error::{Error, Result};
use libsql::Connection;

/// Current schema version
pub const CURRENT_VERSION: i32 = 3;

struct Migration {
    version: i32,
    description: &'static str,
    statements: &'static [&'static str],
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "restaurants store",
        statements: &[
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            // Untyped key column keeps integer keys integers (numeric ordering)
            "CREATE TABLE IF NOT EXISTS restaurants (
                key PRIMARY KEY,
                value TEXT NOT NULL
            )",
        ],
    },
    Migration {
        version: 2,
        description: "reviews store with restaurantId and temp indexes",
        statements: &[
            "CREATE TABLE IF NOT EXISTS reviews (
                key PRIMARY KEY,
                value TEXT NOT NULL,
                restaurant_id INTEGER,
                local_id INTEGER
            )",
            "CREATE INDEX IF NOT EXISTS idx_reviews_restaurant_id ON reviews(restaurant_id)",
            "CREATE INDEX IF NOT EXISTS idx_reviews_temp ON reviews(local_id)",
        ],
    },
    Migration {
        version: 3,
        description: "requests store",
        statements: &[
            "CREATE TABLE IF NOT EXISTS requests (
                key PRIMARY KEY,
                value TEXT NOT NULL
            )",
        ],
    },
];

/// Run all pending migrations up to `target`.
///
/// Returns the number of migration steps applied.
pub async fn run(conn: &Connection, target: i32) -> Result<usize> {
    if !(1..=CURRENT_VERSION).contains(&target) {
        return Err(Error::Schema(format!(
            "unknown target version {target} (supported: 1..={CURRENT_VERSION})"
        )));
    }

    let version = get_version(conn)
        .await
        .map_err(|e| Error::Schema(format!("cannot read schema version: {e}")))?;

    if version > target {
        return Err(Error::Schema(format!(
            "store is at version {version}, newer than requested version {target}"
        )));
    }

    let mut applied = 0;
    for migration in MIGRATIONS
        .iter()
        .filter(|m| m.version > version && m.version <= target)
    {
        apply(conn, migration).await.map_err(|e| {
            Error::Schema(format!(
                "migration to version {} failed: {e}",
                migration.version
            ))
        })?;
        applied += 1;
    }

    Ok(applied)
}

/// Get the current schema version
pub async fn get_version(conn: &Connection) -> Result<i32> {
    // Check if schema_version table exists
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

async fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    // libsql doesn't have execute_batch, so we run each statement separately
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in migration.statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn
        .execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            libsql::params![i64::from(migration.version)],
        )
        .await
    {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!(
        "Migrated database to version {} ({})",
        migration.version,
        migration.description
    );
    Ok(())
}
