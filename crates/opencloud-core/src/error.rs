//! Error types for cloud service operations.
//!
//! This module provides the error type shared by every OpenCloud crate, including
//! catalog lookup failures and HTTP status code mapping.

use crate::types::UrlType;
use thiserror::Error;

/// Main error type for cloud service operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// No catalog entry matches the requested service
    #[error(
        "No endpoints for service type [{service_type}], name [{name}], region [{region}] and urlType [{url_type}]"
    )]
    EndpointNotFound {
        /// Requested service type (e.g. `compute`)
        service_type: String,
        /// Requested service name (e.g. `cloudServersOpenStack`)
        name: String,
        /// Requested region
        region: String,
        /// Requested URL type
        url_type: UrlType,
    },

    /// The selected endpoint has no URL of the requested type
    #[error(
        "The base {url_type} could not be found. Perhaps the service you are using requires a different URL type, or does not support this region."
    )]
    BaseUrlNotFound {
        /// Requested URL type
        url_type: UrlType,
    },

    /// Resource name is not known to the service
    #[error("{resource} resource does not exist, please try one of the following: {available}")]
    UnrecognizedResource {
        /// Requested resource name
        resource: String,
        /// Comma separated list of known resources
        available: String,
    },

    /// No session is available and no authenticator was configured
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// Server rejected the credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Service is unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Failed to decode a response body
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid resource identifier
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// Invalid or unparsable URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Operation timed out
    #[error("Timeout waiting for service: {0}")]
    Timeout(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request with details
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Conflict error
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Specialized result type for cloud service operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EndpointNotFound { .. } => "ENDPOINT_NOT_FOUND",
            Self::BaseUrlNotFound { .. } => "BASE_URL_NOT_FOUND",
            Self::UnrecognizedResource { .. } => "UNRECOGNIZED_RESOURCE",
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::InvalidId(_) => "INVALID_ID",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::InternalError(_)
                | Self::ConfigError(_)
                | Self::EndpointNotFound { .. }
                | Self::BaseUrlNotFound { .. }
        )
    }

    /// Returns true for failures reported by the remote service as a bad HTTP status.
    ///
    /// Metadata lookups such as `/extensions` log these as an absent document
    /// rather than a failure.
    #[must_use]
    pub const fn is_http_status(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::BadRequest(_)
                | Self::Unauthorized(_)
                | Self::Conflict(_)
                | Self::ServiceUnavailable(_)
                | Self::HttpError(_)
        )
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<uuid::Error> for Error {
    fn from(err: uuid::Error) -> Self {
        Self::InvalidId(err.to_string())
    }
}
