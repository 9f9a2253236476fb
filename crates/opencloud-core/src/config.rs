//! Configuration structures for cloud clients.
//!
//! This module provides the serializable client configuration: the default
//! region and URL type, HTTP transport settings, and per-service overrides of
//! catalog name, region and URL type.

use crate::catalog::EndpointQuery;
use crate::client::ClientConfig;
use crate::types::{CloudService, UrlType, DEFAULT_REGION};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Configuration for a cloud client session.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CloudConfig {
    /// Default region for every service
    #[validate(length(min = 1))]
    #[serde(default = "default_region")]
    pub region: String,

    /// Default URL type for every service
    #[serde(default)]
    pub url_type: UrlType,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Compute service selection
    #[validate(nested)]
    #[serde(default = "ServiceSelection::compute")]
    pub compute: ServiceSelection,

    /// Block storage service selection
    #[validate(nested)]
    #[serde(default = "ServiceSelection::volume")]
    pub volume: ServiceSelection,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_tls_verify() -> bool {
    true
}

impl CloudConfig {
    /// Create a configuration for the given default region.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn new(region: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            region: region.into(),
            ..Self::default()
        };

        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Decode and validate a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be decoded or fails validation.
    pub fn from_json_str(raw: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the default URL type.
    #[must_use]
    pub const fn with_url_type(mut self, url_type: UrlType) -> Self {
        self.url_type = url_type;
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Override the compute service selection.
    #[must_use]
    pub fn with_compute(mut self, selection: ServiceSelection) -> Self {
        self.compute = selection;
        self
    }

    /// Override the block storage service selection.
    #[must_use]
    pub fn with_volume(mut self, selection: ServiceSelection) -> Self {
        self.volume = selection;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Selection for a service.
    #[must_use]
    pub const fn selection(&self, service: CloudService) -> &ServiceSelection {
        match service {
            CloudService::Compute => &self.compute,
            CloudService::Volume => &self.volume,
        }
    }

    /// Catalog query for a service, applying per-service overrides.
    #[must_use]
    pub fn endpoint_query(&self, service: CloudService) -> EndpointQuery {
        let selection = self.selection(service);
        EndpointQuery::new(
            service.service_type(),
            selection.name.clone(),
            selection.region.as_deref().unwrap_or(&self.region),
            selection.url_type.unwrap_or(self.url_type),
        )
    }

    /// HTTP transport settings derived from this configuration.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new()
            .with_timeout(self.timeout())
            .with_tls_verify(self.tls_verify)
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            url_type: UrlType::default(),
            request_timeout_secs: default_request_timeout_secs(),
            tls_verify: default_tls_verify(),
            compute: ServiceSelection::compute(),
            volume: ServiceSelection::volume(),
        }
    }
}

/// Catalog name plus optional region and URL type overrides for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ServiceSelection {
    /// Catalog service name
    #[validate(length(min = 1))]
    pub name: String,

    /// Region override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub region: Option<String>,

    /// URL type override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_type: Option<UrlType>,
}

impl ServiceSelection {
    /// Select a service by catalog name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: None,
            url_type: None,
        }
    }

    /// Default compute selection.
    #[must_use]
    pub fn compute() -> Self {
        Self::new(CloudService::Compute.default_name())
    }

    /// Default block storage selection.
    #[must_use]
    pub fn volume() -> Self {
        Self::new(CloudService::Volume.default_name())
    }

    /// Pin the service to a region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Pin the service to a URL type.
    #[must_use]
    pub const fn with_url_type(mut self, url_type: UrlType) -> Self {
        self.url_type = Some(url_type);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloud_config_new() {
        let config = CloudConfig::new("ORD").unwrap();
        assert_eq!(config.region, "ORD");
        assert_eq!(config.url_type, UrlType::Public);
        assert!(config.tls_verify);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.volume.name, "cloudBlockStorage");
    }

    #[test]
    fn test_cloud_config_empty_region_rejected() {
        let result = CloudConfig::new("");
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_cloud_config_builder() {
        let config = CloudConfig::new("LON")
            .unwrap()
            .with_url_type(UrlType::Private)
            .with_timeout(60)
            .with_tls_verify(false);

        assert_eq!(config.url_type, UrlType::Private);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert!(!config.tls_verify);
    }

    #[test]
    fn test_cloud_config_default() {
        let config = CloudConfig::default();
        assert_eq!(config.region, "DFW");
        assert_eq!(config.compute.name, "cloudServersOpenStack");
    }

    #[test]
    fn test_endpoint_query_uses_defaults() {
        let config = CloudConfig::new("IAD").unwrap();
        let query = config.endpoint_query(CloudService::Volume);
        assert_eq!(
            query,
            EndpointQuery::new("volume", "cloudBlockStorage", "IAD", UrlType::Public)
        );
    }

    #[test]
    fn test_endpoint_query_applies_overrides() {
        let config = CloudConfig::new("IAD").unwrap().with_compute(
            ServiceSelection::new("nova")
                .with_region("RegionOne")
                .with_url_type(UrlType::Private),
        );
        let query = config.endpoint_query(CloudService::Compute);
        assert_eq!(query.name, "nova");
        assert_eq!(query.region, "RegionOne");
        assert_eq!(query.url_type, UrlType::Private);
    }

    #[test]
    fn test_from_json_str_fills_defaults() {
        let config = CloudConfig::from_json_str(r#"{"region": "SYD", "url_type": "internalURL"}"#)
            .unwrap();
        assert_eq!(config.region, "SYD");
        assert_eq!(config.url_type, UrlType::Private);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.volume, ServiceSelection::volume());
    }

    #[test]
    fn test_from_json_str_validates() {
        let err = CloudConfig::from_json_str(r#"{"request_timeout_secs": 0}"#).unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));

        let err = CloudConfig::from_json_str(r#"{"volume": {"name": ""}}"#).unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));

        let err = CloudConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_client_config_derivation() {
        let config = CloudConfig::new("DFW")
            .unwrap()
            .with_timeout(12)
            .with_tls_verify(false);
        let client_config = config.client_config();
        assert_eq!(client_config.timeout, Duration::from_secs(12));
        assert!(!client_config.tls_verify);
    }
}
