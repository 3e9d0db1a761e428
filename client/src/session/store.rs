//! Persistence of the current session in a single named storage slot.
//!
//! The store does not validate what it holds; it only (de)serializes the
//! record. Token fields are written by the refresh coordinator, whole sessions
//! are created and removed by login/logout.

use crate::errors::{ClientError, ClientResult};
use crate::session::models::Session;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the stored session, if any.
    async fn get(&self) -> ClientResult<Option<Session>>;

    /// Replaces the stored session.
    async fn set(&self, session: &Session) -> ClientResult<()>;

    /// Removes the stored session. Removing an absent session is not an error.
    async fn clear(&self) -> ClientResult<()>;
}

pub type ArcSessionStore = Arc<dyn SessionStore>;

fn parse_record(raw: &str) -> ClientResult<Session> {
    serde_json::from_str(raw)
        .map_err(|e| ClientError::store(format!("Malformed session record: {}", e)))
}

fn serialize_record(session: &Session) -> ClientResult<String> {
    serde_json::to_string(session)
        .map_err(|e| ClientError::store(format!("Failed to serialize session: {}", e)))
}

/// Session store backed by an in-process slot map.
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    key: String,
    slots: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            slots: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Raw text held in the slot, exactly as persisted.
    pub async fn raw(&self) -> Option<String> {
        self.slots.read().await.get(&self.key).cloned()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new("session")
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self) -> ClientResult<Option<Session>> {
        let slots = self.slots.read().await;
        slots.get(&self.key).map(|raw| parse_record(raw)).transpose()
    }

    async fn set(&self, session: &Session) -> ClientResult<()> {
        let raw = serialize_record(session)?;
        self.slots.write().await.insert(self.key.clone(), raw);
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        self.slots.write().await.remove(&self.key);
        Ok(())
    }
}

/// Session store that keeps the slot as a JSON file inside a directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store writing `<dir>/<key>.json`.
    pub fn new(dir: impl Into<PathBuf>, key: &str) -> Self {
        Self {
            path: dir.into().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self) -> ClientResult<Option<Session>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => parse_record(&raw).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClientError::store(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn set(&self, session: &Session) -> ClientResult<()> {
        let raw = serialize_record(session)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ClientError::store(format!("Failed to create store dir: {}", e)))?;
        }
        // Atomic replace
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|e| ClientError::store(format!("Failed to write session: {}", e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| ClientError::store(format!("Failed to persist session: {}", e)))
    }

    async fn clear(&self) -> ClientResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::store(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
