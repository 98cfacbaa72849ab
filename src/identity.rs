//! Client identity and unlock state
//!
//! Each client profile owns a random opaque id and a local unlock flag. Both
//! live in a small durable key-value store; nothing here touches the network.
//!
//! The id is not a credential. Anyone who copies it owns the same thoughts,
//! and ownership is plain string equality on the server.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StateError;

/// Key holding the client identifier
pub const CLIENT_ID_KEY: &str = "pot_client_id";

/// Key holding the unlock flag (`"true"` or absent)
pub const UNLOCKED_KEY: &str = "proof_unlocked";

/// Opaque identifier of a client profile
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Fresh random id (UUID v4)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ClientId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ClientId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable local key-value store
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StateError>;
}

/// JSON file backed store, written through on every `set`
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open a state file, starting empty if it does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let path = path.into();
        let entries = if path.exists() {
            let bytes = std::fs::read(&path)?;
            serde_json::from_slice(&bytes)?
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened local state");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(entries)?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StateError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        // Only commit once the file write succeeded
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.save(&next)?;
        *entries = next;
        Ok(())
    }
}

/// In-memory store, lost when dropped
#[derive(Default)]
pub struct MemoryLocalStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StateError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Return the stored client id, generating and persisting one on first use
pub fn load_or_generate(store: &dyn LocalStore) -> Result<ClientId, StateError> {
    if let Some(id) = store.get(CLIENT_ID_KEY).filter(|id| !id.is_empty()) {
        return Ok(ClientId::from(id));
    }

    let id = ClientId::generate();
    store.set(CLIENT_ID_KEY, id.as_str())?;
    info!(client_id = %id, "Generated new client identity");
    Ok(id)
}

/// Whether this profile has redeemed a license
pub fn is_unlocked(store: &dyn LocalStore) -> bool {
    store.get(UNLOCKED_KEY).as_deref() == Some("true")
}

/// Persist the unlock flag; there is no way back
pub fn mark_unlocked(store: &dyn LocalStore) -> Result<(), StateError> {
    store.set(UNLOCKED_KEY, "true")
}
