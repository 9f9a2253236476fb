//! Shared cloud vocabulary.
//!
//! URL types, region defaults and the set of services this workspace ships
//! bindings for.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Region used when the caller does not pick one.
pub const DEFAULT_REGION: &str = "DFW";

/// URL type used when the caller does not pick one.
pub const DEFAULT_URL_TYPE: UrlType = UrlType::Public;

/// Which of an endpoint's base URLs a service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UrlType {
    /// Internet-facing URL (`publicURL`)
    #[default]
    #[serde(rename = "publicURL")]
    Public,
    /// Provider-internal network URL (`privateURL`, `internalURL` in the catalog)
    #[serde(rename = "privateURL", alias = "internalURL")]
    Private,
}

impl UrlType {
    /// Returns the catalog spelling of the URL type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "publicURL",
            Self::Private => "privateURL",
        }
    }
}

impl FromStr for UrlType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "publicurl" | "public" => Ok(Self::Public),
            "privateurl" | "private" | "internalurl" | "internal" => Ok(Self::Private),
            _ => Err(Error::ConfigError(format!("Unknown URL type: {s}"))),
        }
    }
}

impl fmt::Display for UrlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Services with bindings in this workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloudService {
    /// Compute (Nova / Cloud Servers)
    Compute,
    /// Block storage (Cinder / Cloud Block Storage)
    Volume,
}

impl CloudService {
    /// Returns the catalog service type.
    #[must_use]
    pub const fn service_type(&self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::Volume => "volume",
        }
    }

    /// Returns the catalog name used by Rackspace for the service.
    #[must_use]
    pub const fn default_name(&self) -> &'static str {
        match self {
            Self::Compute => "cloudServersOpenStack",
            Self::Volume => "cloudBlockStorage",
        }
    }

    /// Returns all available services.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Compute, Self::Volume]
    }
}

impl FromStr for CloudService {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "compute" => Ok(Self::Compute),
            "volume" => Ok(Self::Volume),
            _ => Err(Error::ConfigError(format!("Unknown service: {s}"))),
        }
    }
}

impl fmt::Display for CloudService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_type())
    }
}

/// Parse an API timestamp.
///
/// Accepts RFC 3339 values and the zone-less `2013-02-25T02:40:21.000000` form,
/// which is taken as UTC.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
