//! Endpoint selected for a service.
//!
//! An [`Endpoint`] is the public/private base URL pair a catalog advertises for
//! one service in one region. A service picks exactly one endpoint when it is
//! constructed and derives every request URL from it.

use url::Url;

use crate::catalog::CatalogEndpoint;
use crate::error::{Error, Result};
use crate::types::UrlType;

/// Public/private base URL pair for a service in a region.
///
/// URLs are kept as advertised and parsed when a base URL is requested, so a
/// malformed URL of one type does not affect the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    region: Option<String>,
    public_url: Option<String>,
    private_url: Option<String>,
}

impl Endpoint {
    /// Create an endpoint from already parsed URLs.
    #[must_use]
    pub fn new(region: Option<String>, public_url: Option<Url>, private_url: Option<Url>) -> Self {
        Self {
            region,
            public_url: public_url.map(String::from),
            private_url: private_url.map(String::from),
        }
    }

    /// Build an endpoint from a catalog record.
    #[must_use]
    pub fn from_catalog(record: &CatalogEndpoint) -> Self {
        Self {
            region: record.region.clone(),
            public_url: record.public_url.clone(),
            private_url: record.private_url.clone(),
        }
    }

    /// Region the endpoint serves, `None` for global endpoints.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Public base URL as advertised.
    #[must_use]
    pub fn public_url(&self) -> Option<&str> {
        self.public_url.as_deref()
    }

    /// Private (service network) base URL as advertised.
    #[must_use]
    pub fn private_url(&self) -> Option<&str> {
        self.private_url.as_deref()
    }

    /// Base URL for the given URL type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BaseUrlNotFound`] if the endpoint does not advertise a URL
    /// of that type, or [`Error::InvalidUrl`] if the advertised URL cannot be
    /// parsed.
    pub fn base_url(&self, url_type: UrlType) -> Result<Url> {
        let raw = match url_type {
            UrlType::Public => self.public_url.as_deref(),
            UrlType::Private => self.private_url.as_deref(),
        }
        .ok_or(Error::BaseUrlNotFound { url_type })?;

        Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))
    }
}
