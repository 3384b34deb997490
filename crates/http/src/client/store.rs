//! Credential persistence
//!
//! A store holds two named slots, `access_token` and `refresh_token`.
//! Successful logins and refreshes write through [`TokenStore::apply`], which
//! must update both slots as one step so no reader ever sees half of a
//! rotated pair.

use super::session::{CredentialUpdate, Credentials};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Credential store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Named credential slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSlot {
    Access,
    Refresh,
}

impl TokenSlot {
    /// Persisted key name
    pub const fn key(self) -> &'static str {
        match self {
            Self::Access => "access_token",
            Self::Refresh => "refresh_token",
        }
    }
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Read one slot
    async fn get(&self, slot: TokenSlot) -> Result<Option<String>, StoreError>;

    /// Apply new credentials atomically
    async fn apply(&self, update: &CredentialUpdate) -> Result<(), StoreError>;

    /// Clear a single slot
    async fn remove(&self, slot: TokenSlot) -> Result<(), StoreError>;

    /// Clear both slots
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Both slots as they are held in memory and on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Slots {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

impl Slots {
    fn get(&self, slot: TokenSlot) -> Option<String> {
        match slot {
            TokenSlot::Access => self.access_token.clone(),
            TokenSlot::Refresh => self.refresh_token.clone(),
        }
    }

    fn apply(&mut self, update: &CredentialUpdate) {
        match update {
            CredentialUpdate::AccessOnly(access_token) => {
                self.access_token = Some(access_token.clone());
            }
            CredentialUpdate::Pair(credentials) => {
                self.access_token = Some(credentials.access_token.clone());
                self.refresh_token = Some(credentials.refresh_token.clone());
            }
        }
    }

    fn remove(&mut self, slot: TokenSlot) {
        match slot {
            TokenSlot::Access => self.access_token = None,
            TokenSlot::Refresh => self.refresh_token = None,
        }
    }

    fn credentials(&self) -> Option<Credentials> {
        match (&self.access_token, &self.refresh_token) {
            (Some(access), Some(refresh)) => Some(Credentials::new(access, refresh)),
            _ => None,
        }
    }
}

/// In-process credential store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slots: RwLock<Slots>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a credential pair
    pub fn with_credentials(credentials: Credentials) -> Self {
        let mut slots = Slots::default();
        slots.apply(&CredentialUpdate::Pair(credentials));
        Self {
            slots: RwLock::new(slots),
        }
    }

    /// The stored pair, if both slots are populated
    pub async fn credentials(&self) -> Option<Credentials> {
        self.slots.read().await.credentials()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, slot: TokenSlot) -> Result<Option<String>, StoreError> {
        Ok(self.slots.read().await.get(slot))
    }

    async fn apply(&self, update: &CredentialUpdate) -> Result<(), StoreError> {
        self.slots.write().await.apply(update);
        Ok(())
    }

    async fn remove(&self, slot: TokenSlot) -> Result<(), StoreError> {
        self.slots.write().await.remove(slot);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.slots.write().await = Slots::default();
        Ok(())
    }
}

/// Credential store persisted as a JSON file, surviving process restarts
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so a concurrent reader sees either the old pair or the new one.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Slots, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Slots::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Slots::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, slots: &Slots) -> Result<(), StoreError> {
        if slots == &Slots::default() {
            return match tokio::fs::remove_file(&self.path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            };
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.path.with_extension("tmp");
        let content = serde_json::to_vec_pretty(slots)?;
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        debug!("Wrote credentials to {}", self.path.display());
        Ok(())
    }

    async fn modify(&self, f: impl FnOnce(&mut Slots) + Send) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut slots = self.read().await?;
        f(&mut slots);
        self.write(&slots).await
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, slot: TokenSlot) -> Result<Option<String>, StoreError> {
        Ok(self.read().await?.get(slot))
    }

    async fn apply(&self, update: &CredentialUpdate) -> Result<(), StoreError> {
        self.modify(|slots| slots.apply(update)).await
    }

    async fn remove(&self, slot: TokenSlot) -> Result<(), StoreError> {
        self.modify(|slots| slots.remove(slot)).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write(&Slots::default()).await
    }
}
