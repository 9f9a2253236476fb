//! HTTP client abstraction and the reqwest-backed implementation.
//!
//! Services never talk to the network directly: they hold a [`CloudClient`],
//! which hands out the authenticated service catalog and performs JSON `GET`
//! requests. [`HttpClient`] is the production implementation. Obtaining a token
//! is left to an [`Authenticator`] supplied by the caller.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use crate::catalog::ServiceCatalog;
use crate::error::{Error, Result};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header carrying the session token.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

const USER_AGENT: &str = concat!("opencloud-rust/", env!("CARGO_PKG_VERSION"));

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// User-Agent header value
    pub user_agent: String,

    /// Whether to verify TLS certificates
    pub tls_verify: bool,

    /// Enable request/response logging
    pub enable_logging: bool,

    /// Enable response compression
    pub enable_compression: bool,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
            tls_verify: true,
            enable_logging: true,
            enable_compression: true,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Enable or disable TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Enable or disable logging.
    #[must_use]
    pub const fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Token and service catalog produced by authentication.
#[derive(Debug)]
pub struct Session {
    token: SecretString,
    catalog: ServiceCatalog,
}

impl Session {
    /// Create a session from a token and its catalog.
    #[must_use]
    pub fn new(token: impl Into<String>, catalog: ServiceCatalog) -> Self {
        Self {
            token: SecretString::from(token.into()),
            catalog,
        }
    }

    /// The service catalog granted to this session.
    #[must_use]
    pub const fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

/// Capability the services need from an HTTP client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Return the authenticated service catalog, authenticating first if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if no catalog is held and authentication fails.
    async fn catalog(&self) -> Result<ServiceCatalog>;

    /// Issue a `GET` and decode the JSON body. An empty body decodes to `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures, non-success statuses and
    /// undecodable bodies.
    async fn get_json(&self, url: &Url) -> Result<Value>;
}

/// Produces a [`Session`] on demand.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate against the identity service.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the identity service fails.
    async fn authenticate(&self) -> Result<Session>;
}

/// Builder for [`HttpClient`].
#[derive(Default)]
pub struct HttpClientBuilder {
    config: ClientConfig,
    session: Option<Session>,
    authenticator: Option<Arc<dyn Authenticator>>,
}

impl HttpClientBuilder {
    /// Create a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Start with an already authenticated session.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Authenticate lazily through the given authenticator.
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client cannot be constructed.
    pub fn build(self) -> Result<HttpClient> {
        let http = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent.as_str())
            .gzip(self.config.enable_compression)
            .danger_accept_invalid_certs(!self.config.tls_verify)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(HttpClient {
            http,
            config: self.config,
            session: Arc::new(RwLock::new(self.session.map(Arc::new))),
            authenticator: self.authenticator,
            auth_lock: Arc::new(Mutex::new(())),
        })
    }
}

/// reqwest-backed [`CloudClient`].
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    config: ClientConfig,
    session: Arc<RwLock<Option<Arc<Session>>>>,
    authenticator: Option<Arc<dyn Authenticator>>,
    // Held across first authentication so concurrent callers share one login.
    auth_lock: Arc<Mutex<()>>,
}

impl HttpClient {
    /// Create a client around an existing session.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client cannot be constructed.
    pub fn with_session(session: Session) -> Result<Self> {
        HttpClientBuilder::new().with_session(session).build()
    }

    /// Return a builder.
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Returns true if a session is currently held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.read().map(|s| s.is_some()).unwrap_or(false)
    }

    /// Replace the held session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session lock is poisoned.
    pub fn set_session(&self, session: Session) -> Result<()> {
        let mut slot = self
            .session
            .write()
            .map_err(|_| Error::InternalError("session lock poisoned".to_string()))?;
        *slot = Some(Arc::new(session));
        Ok(())
    }

    fn current_session(&self) -> Result<Option<Arc<Session>>> {
        Ok(self
            .session
            .read()
            .map_err(|_| Error::InternalError("session lock poisoned".to_string()))?
            .clone())
    }

    async fn session(&self) -> Result<Arc<Session>> {
        if let Some(session) = self.current_session()? {
            return Ok(session);
        }

        let _guard = self.auth_lock.lock().await;
        if let Some(session) = self.current_session()? {
            return Ok(session);
        }

        let authenticator = self.authenticator.as_ref().ok_or_else(|| {
            Error::Unauthenticated(
                "no service catalog is available and no authenticator is configured".to_string(),
            )
        })?;

        debug!("no session held, authenticating");
        let session = Arc::new(authenticator.authenticate().await?);
        let mut slot = self
            .session
            .write()
            .map_err(|_| Error::InternalError("session lock poisoned".to_string()))?;
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }
}

#[async_trait]
impl CloudClient for HttpClient {
    async fn catalog(&self) -> Result<ServiceCatalog> {
        Ok(self.session().await?.catalog().clone())
    }

    async fn get_json(&self, url: &Url) -> Result<Value> {
        let session = self.session().await?;

        if self.config.enable_logging {
            debug!(method = "GET", %url, "sending request");
        }

        let response = self
            .http
            .get(url.clone())
            .header(AUTH_TOKEN_HEADER, session.token())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if self.config.enable_logging {
            debug!(%url, status = status.as_u16(), bytes = text.len(), "received response");
        }

        if !status.is_success() {
            return Err(map_status_to_error(status, text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(Error::from)
    }
}

fn map_status_to_error(status: StatusCode, text: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(text),
        StatusCode::BAD_REQUEST => Error::BadRequest(text),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized(text),
        StatusCode::CONFLICT => Error::Conflict(text),
        StatusCode::PAYLOAD_TOO_LARGE
        | StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::ServiceUnavailable(format!("temporarily unavailable: {text}"))
        }
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("server error {status}: {text}"))
        }
        _ => Error::HttpError(format!("unexpected status {status}: {text}")),
    }
}
