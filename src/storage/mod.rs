//! Key-value persistence
//!
//! The enhancement log mirrors itself into a single key of a string-valued
//! key-value store. Values are JSON documents; the store does not look
//! inside them. Other keys belong to other parts of the platform and are
//! treated as opaque.
//!
//! Backends:
//! - `MemoryStore`: process-local, used by tests and the `memory` backend
//! - `JsonFileStore`: one `<key>.json` file per key in a directory
//! - `SqliteStore`: a single `kv` table in a SQLite database

pub mod json_file;
pub mod memory;
pub mod sqlite;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};

/// Errors raised by storage backends
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// String key-value store with full-value replace semantics
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `None` when the key was never written or was removed
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the value stored under `key`
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a key; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// All keys currently present, sorted
    async fn keys(&self) -> StorageResult<Vec<String>>;

    /// Backend name for diagnostics
    fn name(&self) -> &'static str;
}

/// Keys are restricted to `[A-Za-z0-9_-]+` so every backend can store them
/// without escaping (the file backend uses them as file names).
pub fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Open the backend selected in the configuration
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Json => {
            let dir = config.resolved_path()?;
            Arc::new(JsonFileStore::new(dir).await?)
        }
        StorageBackend::Sqlite => {
            let path = config.resolved_path()?.join("comet.db");
            Arc::new(SqliteStore::new(path).await?)
        }
    };
    info!("Opened {} storage backend", store.name());
    Ok(store)
}
