//! Bazaar HTTP client
//!
//! Wraps the marketplace REST API behind [`client::MarketClient`], which
//! attaches the stored bearer token to every call and recovers once from an
//! expired access token by refreshing it and replaying the request.

pub mod client;
pub mod types;

pub use client::config::ClientConfig;
pub use client::error::ClientError;
pub use client::session::{
    CredentialUpdate, Credentials, LogSessionListener, Session, SessionListener,
};
pub use client::store::{FileTokenStore, MemoryTokenStore, StoreError, TokenSlot, TokenStore};
pub use client::{ApiRequest, MarketClient, MarketClientBuilder};
