//! Secret key stores.
//!
//! Sessions look records up by id and drop them when they finish; stores
//! hand out clones so no session holds a reference into shared state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::record::SecretKeyRecord;
use crate::types::{KeyId, KeykeeperError, Result};

/// Lookup of secret key records by id.
pub trait KeyStore: Send + Sync {
    /// Fetch a fresh copy of the record for `key_id`.
    ///
    /// Sessions cache under the returned record's own `key_id`.
    fn lookup(&self, key_id: KeyId) -> Option<SecretKeyRecord>;

    /// Display name for a record, used only for prompt text.
    fn main_identifier_of(&self, record: &SecretKeyRecord) -> String {
        record.main_user_id().to_string()
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Key store backed by a concurrent map.
#[derive(Default)]
pub struct InMemoryKeyStore {
    records: DashMap<KeyId, SecretKeyRecord>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a record.
    pub fn insert(&self, record: SecretKeyRecord) {
        self.records.insert(record.key_id, record);
    }

    pub fn remove(&self, key_id: KeyId) -> bool {
        self.records.remove(&key_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl KeyStore for InMemoryKeyStore {
    fn lookup(&self, key_id: KeyId) -> Option<SecretKeyRecord> {
        self.records.get(&key_id).map(|r| r.clone())
    }
}

// =============================================================================
// Keyring file store
// =============================================================================

/// On-disk keyring document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyringFile {
    #[serde(default)]
    pub keys: Vec<SecretKeyRecord>,
}

/// Key store loaded from a JSON keyring file.
pub struct FileKeyStore {
    path: PathBuf,
    records: HashMap<KeyId, SecretKeyRecord>,
}

impl FileKeyStore {
    /// Load a keyring file. Duplicate key ids are rejected.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            KeykeeperError::Keyring(format!("Failed to read {}: {e}", path.display()))
        })?;
        let file: KeyringFile = serde_json::from_str(&content)?;

        let mut records = HashMap::with_capacity(file.keys.len());
        for record in file.keys {
            let key_id = record.key_id;
            if records.insert(key_id, record).is_some() {
                return Err(KeykeeperError::Keyring(format!(
                    "Duplicate key id {key_id} in {}",
                    path.display()
                )));
            }
        }

        info!(path = %path.display(), keys = records.len(), "Loaded keyring");

        Ok(Self { path, records })
    }

    /// Write a keyring file containing `records`.
    pub fn write(path: impl AsRef<Path>, records: &[SecretKeyRecord]) -> Result<()> {
        let file = KeyringFile {
            keys: records.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(path.as_ref(), json)?;
        debug!(path = %path.as_ref().display(), keys = records.len(), "Wrote keyring");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Key ids in ascending order.
    pub fn key_ids(&self) -> Vec<KeyId> {
        let mut ids: Vec<KeyId> = self.records.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl KeyStore for FileKeyStore {
    fn lookup(&self, key_id: KeyId) -> Option<SecretKeyRecord> {
        self.records.get(&key_id).cloned()
    }
}

// =============================================================================
// Tests
// =============================================================================
