//! Generic object store implementation
//!
//! One table per record type: an untyped primary `key` column, the record as
//! JSON in `value`, and one integer column per secondary index.

use std::fmt;
use std::marker::PhantomData;

use libsql::params::Params;
use libsql::{Connection, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Primary key of a stored record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKey {
    Int(i64),
    Text(String),
}

impl StoreKey {
    fn to_value(&self) -> Value {
        match self {
            Self::Int(value) => Value::Integer(*value),
            Self::Text(value) => Value::Text(value.clone()),
        }
    }
}

impl From<i64> for StoreKey {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<String> for StoreKey {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for StoreKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}

/// A named secondary index backed by a table column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    pub name: &'static str,
    pub column: &'static str,
}

/// A type that lives in an object store
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Table name, created by a schema migration
    const STORE: &'static str;

    /// Secondary indexes, in column order
    const INDEXES: &'static [IndexDef] = &[];

    /// Primary key of this record
    fn key(&self) -> StoreKey;

    /// Value of the named index for this record (`None` leaves it unindexed)
    fn index_value(&self, _index: &str) -> Option<i64> {
        None
    }
}

/// Trait for object store operations (async)
#[allow(async_fn_in_trait)]
pub trait ObjectStore<R: Record> {
    /// Upsert a record by primary key
    async fn put(&self, record: &R) -> Result<()>;

    /// Get a record by primary key
    async fn get(&self, key: &StoreKey) -> Result<Option<R>>;

    /// Get every record, in key order
    async fn get_all(&self) -> Result<Vec<R>>;

    /// Get every record whose index equals `value`
    async fn get_all_by_index(&self, index: &str, value: i64) -> Result<Vec<R>>;

    /// Delete a record by primary key (absent keys are ignored)
    async fn delete(&self, key: &StoreKey) -> Result<()>;

    /// Delete every record whose index equals `value`, returning how many went
    async fn delete_by_index(&self, index: &str, value: i64) -> Result<u64>;

    /// Delete every record
    async fn clear(&self) -> Result<()>;

    /// Number of stored records
    async fn count(&self) -> Result<u64>;
}

/// libSQL implementation of `ObjectStore`
pub struct LibSqlObjectStore<'a, R> {
    conn: &'a Connection,
    _record: PhantomData<fn() -> R>,
}

impl<'a, R: Record> LibSqlObjectStore<'a, R> {
    /// Create a new store view over the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            _record: PhantomData,
        }
    }

    fn index_column(index: &str) -> Result<&'static str> {
        R::INDEXES
            .iter()
            .find(|def| def.name == index)
            .map(|def| def.column)
            .ok_or_else(|| {
                Error::Storage(format!("unknown index '{index}' on store '{}'", R::STORE))
            })
    }

    async fn query_records(&self, sql: &str, params: Params) -> Result<Vec<R>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            records.push(serde_json::from_str(&value)?);
        }
        Ok(records)
    }
}

impl<R: Record> ObjectStore<R> for LibSqlObjectStore<'_, R> {
    async fn put(&self, record: &R) -> Result<()> {
        let mut columns = vec!["key", "value"];
        let mut values = vec![
            record.key().to_value(),
            Value::Text(serde_json::to_string(record)?),
        ];
        for def in R::INDEXES {
            columns.push(def.column);
            values.push(record.index_value(def.name).map_or(Value::Null, Value::Integer));
        }

        let placeholders = (1..=columns.len())
            .map(|position| format!("?{position}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({placeholders})",
            R::STORE,
            columns.join(", ")
        );

        self.conn.execute(&sql, Params::Positional(values)).await?;
        Ok(())
    }

    async fn get(&self, key: &StoreKey) -> Result<Option<R>> {
        let sql = format!("SELECT value FROM {} WHERE key = ?1", R::STORE);
        let mut records = self
            .query_records(&sql, Params::Positional(vec![key.to_value()]))
            .await?;
        Ok(records.pop())
    }

    async fn get_all(&self) -> Result<Vec<R>> {
        let sql = format!("SELECT value FROM {} ORDER BY key", R::STORE);
        self.query_records(&sql, Params::None).await
    }

    async fn get_all_by_index(&self, index: &str, value: i64) -> Result<Vec<R>> {
        let column = Self::index_column(index)?;
        let sql = format!(
            "SELECT value FROM {} WHERE {column} = ?1 ORDER BY key",
            R::STORE
        );
        self.query_records(&sql, Params::Positional(vec![Value::Integer(value)]))
            .await
    }

    async fn delete(&self, key: &StoreKey) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE key = ?1", R::STORE);
        self.conn
            .execute(&sql, Params::Positional(vec![key.to_value()]))
            .await?;
        Ok(())
    }

    async fn delete_by_index(&self, index: &str, value: i64) -> Result<u64> {
        let column = Self::index_column(index)?;
        let sql = format!("DELETE FROM {} WHERE {column} = ?1", R::STORE);
        let deleted = self
            .conn
            .execute(&sql, Params::Positional(vec![Value::Integer(value)]))
            .await?;
        Ok(deleted)
    }

    async fn clear(&self) -> Result<()> {
        let sql = format!("DELETE FROM {}", R::STORE);
        self.conn.execute(&sql, ()).await?;
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", R::STORE);
        let mut rows = self.conn.query(&sql, ()).await?;
        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
