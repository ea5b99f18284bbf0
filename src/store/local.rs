//! LocalStore - in-process map, optionally mirrored to a JSON file.

use super::KeyValueStore;
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

pub struct LocalStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl LocalStore {
    /// Memory only. Nothing survives the process.
    pub fn in_memory() -> Self {
        Self { path: None, entries: Mutex::new(BTreeMap::new()) }
    }

    /// Load `path` if it exists, creating its parent directory otherwise.
    pub async fn open(path: &Path) -> Result<Self> {
        let entries = match tokio::fs::read_to_string(path).await {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| WalletError::read(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| WalletError::write(format!("mkdir {}: {}", parent.display(), e)))?;
                }
                BTreeMap::new()
            }
            Err(e) => return Err(WalletError::read(format!("{}: {}", path.display(), e))),
        };
        debug!(path = %path.display(), keys = entries.len(), "Local store loaded");
        Ok(Self { path: Some(path.to_path_buf()), entries: Mutex::new(entries) })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    // Caller holds the entries lock, so file writes never interleave.
    async fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else { return Ok(()) };
        let json = serde_json::to_vec_pretty(entries).map_err(WalletError::write)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| WalletError::write(format!("{}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| WalletError::write(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl KeyValueStore for LocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    /// A changed value rewrites the whole file, so each write costs O(entries).
    /// Re-setting an identical value, as a repeated discovery does, skips the file.
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        if entries.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&entries).await {
            // Memory never holds a value the file is missing.
            match previous {
                Some(previous) => entries.insert(key.to_string(), previous),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}
