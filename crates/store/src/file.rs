//! File-backed store — the whole map mirrored to one JSON snapshot.
//!
//! Every mutation rewrites the snapshot through temp + fsync + rename, so a
//! reader of the file never sees a partially written map. The in-memory copy
//! is only updated after the file write succeeds.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::SharedStateStore;

pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open a snapshot file. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let data = fs::read(&path)
                .with_context(|| format!("failed to read store: {}", path.display()))?;
            serde_json::from_slice::<BTreeMap<String, String>>(&data)
                .with_context(|| format!("failed to parse store: {}", path.display()))?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            BTreeMap::new()
        };

        info!("File store {} opened ({} keys)", path.display(), entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let data = serde_json::to_vec_pretty(entries).context("failed to encode store")?;
        write_atomic(&self.path, &data)
    }
}

impl SharedStateStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value.to_string())])
    }

    fn set_many(&self, batch: &[(&str, String)]) -> Result<()> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        for (key, value) in batch {
            next.insert((*key).to_string(), value.clone());
        }
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}

/// Write a file via temp + fsync + rename, then fsync the parent directory
/// so the rename itself is durable.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    fs::write(&temp_path, data)
        .with_context(|| format!("failed to write {}", temp_path.display()))?;

    let file = fs::File::open(&temp_path)
        .with_context(|| format!("failed to open {}", temp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("failed to sync {}", temp_path.display()))?;
    drop(file);

    fs::rename(&temp_path, path)
        .with_context(|| format!("failed to rename into {}", path.display()))?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::File::open(dir)
            .and_then(|d| d.sync_all())
            .with_context(|| format!("failed to sync directory {}", dir.display()))?;
    }

    debug!("Atomically wrote: {}", path.display());
    Ok(())
}
