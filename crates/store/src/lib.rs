//! Shared state store — flat string key → string value mapping.
//!
//! The store has no concurrency semantics of its own: `set` overwrites
//! unconditionally and the last physical writer wins. Anything that needs a
//! read-decide-write critical section must serialize above this layer.

pub mod codec;
pub mod file;
pub mod memory;

use std::sync::Arc;

use anyhow::Result;
use common::config::{StorageBackend, StorageConfig};

pub use crate::file::FileStore;
pub use crate::memory::MemoryStore;

/// Prefix for keys written through the generic blob endpoint.
pub const BLOB_PREFIX: &str = "blob.";

pub trait SharedStateStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Write several keys. Backends override this to apply the batch in one step.
    fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// Store key for a generic blob.
pub fn blob_key(key: &str) -> String {
    format!("{}{}", BLOB_PREFIX, key)
}

/// Open the backend named in config.
pub fn open(config: &StorageConfig) -> Result<Arc<dyn SharedStateStore>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageBackend::File => {
            let path = config
                .path
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("storage.path is required for the file backend"))?;
            Ok(Arc::new(FileStore::open(path)?))
        }
    }
}
