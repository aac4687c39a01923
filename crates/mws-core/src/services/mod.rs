//! Shared services used by the engine components.

mod storage;

pub use storage::StorageService;
