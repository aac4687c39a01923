//! Database layer for mws

mod connection;
mod migrations;
mod store;

pub use connection::Database;
pub use migrations::{get_version, run as migrate, CURRENT_VERSION};
pub use store::{IndexDef, LibSqlObjectStore, ObjectStore, Record, StoreKey};
