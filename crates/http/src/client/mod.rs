//! Marketplace API client
//!
//! Every call goes through [`MarketClient::send`]: the stored access token
//! is attached as a bearer credential, and a 401 on the first transmission
//! triggers one refresh of the access token followed by one replay. A failed
//! refresh tears the session down.

pub mod auth;
pub mod config;
pub mod error;
pub mod order;
pub mod product;
pub mod session;
pub mod store;
pub mod wallet;

use self::config::ClientConfig;
use self::error::ClientError;
use self::session::{CredentialUpdate, Session};
use crate::types::{RefreshRequest, RefreshResponse};
use bazaar_core::ApiResponse;
use reqwest::header::{self, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Path of the token refresh endpoint, relative to the base URL
pub const REFRESH_PATH: &str = "/auth/refresh";

/// An outbound API request
///
/// Requests are immutable values; the client tracks retries itself, so the
/// same request can be replayed verbatim after a refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<JsonValue>,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query string parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Attach a JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Add an extra header. `Authorization` is managed by the client and
    /// must not be set here.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Which transmission of a logical request is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    /// First transmission; a 401 may still be recovered
    Initial,
    /// Sent again after a refresh; every outcome is final
    Replay,
}

/// Marketplace API client
#[derive(Clone)]
pub struct MarketClient {
    client: Client,
    base_url: String,
    session: Session,
    /// Serialises refreshes so concurrent 401s share one refresh call
    refresh_gate: Arc<Mutex<()>>,
    /// Number of sessions torn down by a failed refresh
    teardowns: Arc<AtomicU64>,
}

impl MarketClient {
    /// Create a new client with default configuration and an in-memory session
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> MarketClientBuilder {
        MarketClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The session whose credentials this client presents
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Whether an access token is currently stored
    pub async fn is_authenticated(&self) -> Result<bool, ClientError> {
        Ok(self.session.is_authenticated().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, recovering once from an expired access token
    ///
    /// Non-2xx responses are returned as errors. A 401 on the first
    /// transmission refreshes the access token and replays the request
    /// once; the replay's outcome is returned as is. If the refresh fails
    /// the session is ended and the refresh error is returned.
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, ClientError> {
        let mut attempt = Attempt::Initial;

        loop {
            let teardowns = self.teardowns.load(Ordering::Acquire);
            let access_token = self.session.access_token().await?;

            match self.transmit(request, access_token.as_deref()).await {
                Err(err) if err.is_unauthorized() && attempt == Attempt::Initial => {
                    debug!(
                        method = %request.method(),
                        path = request.path(),
                        "Access token rejected, refreshing"
                    );
                    attempt = Attempt::Replay;
                    self.recover(access_token.as_deref(), teardowns).await?;
                }
                Err(err) if err.is_unauthorized() => {
                    warn!(
                        method = %request.method(),
                        path = request.path(),
                        "Request rejected again after token refresh"
                    );
                    return Err(err);
                }
                result => return result,
            }
        }
    }

    /// Send a request and unwrap the response envelope
    pub async fn execute<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        let envelope: ApiResponse<T> = response.json().await?;
        Ok(envelope.into_result()?)
    }

    /// Send a request whose envelope carries no payload of interest
    pub async fn execute_unit(&self, request: &ApiRequest) -> Result<(), ClientError> {
        let response = self.send(request).await?;
        let envelope: ApiResponse<JsonValue> = response.json().await?;
        if envelope.success {
            Ok(())
        } else {
            Err(ClientError::Api(bazaar_core::EnvelopeError {
                messages: envelope.error.unwrap_or_default(),
            }))
        }
    }

    /// Exchange the stored refresh token for a new access token
    ///
    /// On success the new credentials are stored and returned. On failure
    /// the store is left untouched; clearing it is the caller's decision.
    pub async fn refresh(&self) -> Result<CredentialUpdate, ClientError> {
        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    /// Make the rejected request recoverable: either a concurrent request
    /// already replaced `rejected`, or this one refreshes it. A failed
    /// refresh ends the session.
    ///
    /// `teardowns` is the teardown count observed before the rejected
    /// request was sent.
    async fn recover(&self, rejected: Option<&str>, teardowns: u64) -> Result<(), ClientError> {
        let _gate = self.refresh_gate.lock().await;

        match self.session.access_token().await? {
            Some(current) if rejected != Some(current.as_str()) => {
                debug!("Reusing access token refreshed by a concurrent request");
                return Ok(());
            }
            None if self.session.refresh_token().await?.is_none()
                && (rejected.is_some() || self.teardowns.load(Ordering::Acquire) != teardowns) =>
            {
                debug!("Session already ended by a concurrent request");
                return Err(ClientError::SessionEnded);
            }
            _ => {}
        }

        match self.refresh_locked().await {
            Ok(_) => Ok(()),
            Err(err) => {
                warn!("Token refresh failed, ending session: {err}");
                self.teardowns.fetch_add(1, Ordering::AcqRel);
                self.session.end().await;
                Err(err)
            }
        }
    }

    async fn refresh_locked(&self) -> Result<CredentialUpdate, ClientError> {
        let refresh_token = self
            .session
            .refresh_token()
            .await?
            .ok_or(ClientError::MissingRefreshToken)?;

        let response = self
            .client
            .post(self.url(REFRESH_PATH))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(ClientError::RefreshRejected(format!("{status}: {message}")));
        }

        let envelope: ApiResponse<RefreshResponse> = response.json().await?;
        let refreshed = envelope
            .into_result()
            .map_err(|e| ClientError::RefreshRejected(e.to_string()))?;

        let update = CredentialUpdate::from_refresh(refreshed.access_token, refreshed.refresh_token);
        self.session.apply(&update).await?;
        info!(
            rotated = matches!(update, CredentialUpdate::Pair(_)),
            "Access token refreshed"
        );
        Ok(update)
    }

    /// Transmit once with the given bearer token
    async fn transmit(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<Response, ClientError> {
        let mut builder = self
            .client
            .request(request.method().clone(), self.url(request.path()));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.clone(), value.clone());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = access_token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        debug!(
            method = %request.method(),
            path = request.path(),
            authenticated = access_token.is_some(),
            "Sending request"
        );

        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            Err(ClientError::from_status(status, message))
        }
    }
}

/// Builder for MarketClient
#[derive(Default)]
pub struct MarketClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    session: Option<Session>,
}

impl MarketClientBuilder {
    /// Start from a loaded configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::default()
            .base_url(config.base_url.clone())
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
    }

    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the per-transmission timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the session whose credentials the client presents
    #[must_use]
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<MarketClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if let Some(user_agent) = self.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        } else {
            client_builder =
                client_builder.user_agent(concat!("bazaar-client/", env!("CARGO_PKG_VERSION")));
        }

        let client = client_builder.build()?;

        Ok(MarketClient {
            client,
            base_url,
            session: self.session.unwrap_or_else(Session::in_memory),
            refresh_gate: Arc::new(Mutex::new(())),
            teardowns: Arc::new(AtomicU64::new(0)),
        })
    }
}
