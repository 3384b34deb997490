//! Session ownership: the credential store, the teardown listener and the
//! location users are sent to when a session cannot be renewed

use super::store::{MemoryTokenStore, StoreError, TokenSlot, TokenStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Default path of the authentication entry point
pub const DEFAULT_AUTH_ENTRY: &str = "/auth";

/// Access/refresh token pair
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// New credentials issued by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialUpdate {
    /// Only the access token was reissued; the refresh token stays
    AccessOnly(String),
    /// Both tokens were issued (login, signup, or a rotating refresh)
    Pair(Credentials),
}

impl CredentialUpdate {
    /// Build an update from a refresh response, rotating the pair only when
    /// the backend returned a new refresh token
    pub fn from_refresh(access_token: String, refresh_token: Option<String>) -> Self {
        match refresh_token {
            Some(refresh_token) => Self::Pair(Credentials {
                access_token,
                refresh_token,
            }),
            None => Self::AccessOnly(access_token),
        }
    }

    /// The access token carried by this update
    pub fn access_token(&self) -> &str {
        match self {
            Self::AccessOnly(access_token) => access_token,
            Self::Pair(credentials) => &credentials.access_token,
        }
    }
}

/// Notified when a session is torn down after an unrecoverable refresh failure
pub trait SessionListener: Send + Sync {
    /// The store has already been cleared; `redirect_to` is the
    /// authentication entry point the user should be sent to.
    fn session_ended(&self, redirect_to: &str);
}

/// Listener that only records the teardown in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSessionListener;

impl SessionListener for LogSessionListener {
    fn session_ended(&self, redirect_to: &str) {
        warn!("Session ended; re-authenticate at {redirect_to}");
    }
}

/// Single owner of a user's credentials
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
    listener: Arc<dyn SessionListener>,
    auth_entry: String,
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            listener: Arc::new(LogSessionListener),
            auth_entry: DEFAULT_AUTH_ENTRY.to_string(),
        }
    }

    /// Session backed by an empty in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = listener;
        self
    }

    #[must_use]
    pub fn with_auth_entry(mut self, auth_entry: impl Into<String>) -> Self {
        self.auth_entry = auth_entry.into();
        self
    }

    pub fn auth_entry(&self) -> &str {
        &self.auth_entry
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub async fn access_token(&self) -> Result<Option<String>, StoreError> {
        self.store.get(TokenSlot::Access).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        self.store.get(TokenSlot::Refresh).await
    }

    /// Whether an access token is currently stored
    pub async fn is_authenticated(&self) -> Result<bool, StoreError> {
        Ok(self.access_token().await?.is_some())
    }

    /// Apply new credentials, whichever form the backend issued them in
    pub async fn apply(&self, update: &CredentialUpdate) -> Result<(), StoreError> {
        self.store.apply(update).await
    }

    /// Store a freshly issued pair
    pub async fn store_credentials(&self, credentials: Credentials) -> Result<(), StoreError> {
        self.apply(&CredentialUpdate::Pair(credentials)).await
    }

    /// Remove both tokens without notifying the listener (explicit logout)
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.clear().await
    }

    /// Tear the session down: clear the store, then notify the listener
    pub(crate) async fn end(&self) {
        if let Err(e) = self.store.clear().await {
            warn!("Failed to clear credentials during session teardown: {e}");
        }
        self.listener.session_ended(&self.auth_entry);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("auth_entry", &self.auth_entry)
            .finish_non_exhaustive()
    }
}
