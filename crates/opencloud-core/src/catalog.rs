//! Service catalog model and endpoint lookup.
//!
//! The catalog is the list of services an authenticated session may use, each
//! with one endpoint record per region. Lookup is a pure function over an
//! immutable catalog: match the entry on type and name, then pick the endpoint
//! serving the requested region.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::types::UrlType;

/// One regional endpoint record as advertised by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEndpoint {
    /// Region served; absent for global services
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Public base URL
    #[serde(rename = "publicURL", default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,

    /// Service network base URL
    #[serde(
        rename = "internalURL",
        alias = "privateURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub private_url: Option<String>,

    /// Tenant the endpoint is scoped to
    #[serde(rename = "tenantId", default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// API version served
    #[serde(rename = "versionId", default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

impl CatalogEndpoint {
    /// Returns true if this record serves `region` or is a global endpoint.
    #[must_use]
    pub fn serves_region(&self, region: &str) -> bool {
        self.region.as_deref().map_or(true, |r| r == region)
    }
}

/// A service listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Provider-specific service name (e.g. `cloudServersOpenStack`)
    pub name: String,

    /// Service type (e.g. `compute`, `volume`)
    #[serde(rename = "type")]
    pub service_type: String,

    /// Regional endpoint records
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

impl CatalogEntry {
    /// Returns true if the entry has the given service type.
    #[must_use]
    pub fn has_type(&self, service_type: &str) -> bool {
        self.service_type == service_type
    }

    /// Returns true if the entry has the given service name.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.name == name
    }

    /// First endpoint record serving `region`.
    #[must_use]
    pub fn endpoint_for_region(&self, region: &str) -> Option<&CatalogEndpoint> {
        self.endpoints.iter().find(|e| e.serves_region(region))
    }

    /// Regions this entry advertises endpoints for.
    #[must_use]
    pub fn regions(&self) -> Vec<&str> {
        self.endpoints
            .iter()
            .filter_map(|e| e.region.as_deref())
            .collect()
    }
}

/// The authenticated list of available services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceCatalog {
    entries: Vec<CatalogEntry>,
}

impl ServiceCatalog {
    /// Create a catalog from its entries.
    #[must_use]
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Decode the catalog out of an identity `access` document.
    ///
    /// Accepts `{"access": {"serviceCatalog": [...]}}`, a bare
    /// `{"serviceCatalog": [...]}` object, or the entry list itself.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if no catalog can be found or decoded.
    pub fn from_access_document(document: &Value) -> Result<Self> {
        let list = document
            .pointer("/access/serviceCatalog")
            .or_else(|| document.get("serviceCatalog"))
            .unwrap_or(document);

        if !list.is_array() {
            return Err(Error::ParseError(
                "identity response does not contain a serviceCatalog list".to_string(),
            ));
        }

        Ok(Self::new(Vec::<CatalogEntry>::deserialize(list)?))
    }

    /// Catalog entries in identity service order.
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Number of services in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog lists no services.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parameters identifying the endpoint a service needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointQuery {
    /// Service type (e.g. `volume`)
    pub service_type: String,
    /// Service name (e.g. `cloudBlockStorage`)
    pub name: String,
    /// Region (e.g. `DFW`)
    pub region: String,
    /// URL type the service will use
    pub url_type: UrlType,
}

impl EndpointQuery {
    /// Create a new query.
    #[must_use]
    pub fn new(
        service_type: impl Into<String>,
        name: impl Into<String>,
        region: impl Into<String>,
        url_type: UrlType,
    ) -> Self {
        Self {
            service_type: service_type.into(),
            name: name.into(),
            region: region.into(),
            url_type,
        }
    }

    fn not_found(&self) -> Error {
        Error::EndpointNotFound {
            service_type: self.service_type.clone(),
            name: self.name.clone(),
            region: self.region.clone(),
            url_type: self.url_type,
        }
    }
}

/// Select the endpoint for a service from the catalog.
///
/// Entries are scanned in catalog order; the first entry matching both type and
/// name that serves the region wins.
///
/// # Errors
///
/// Returns [`Error::EndpointNotFound`] naming the four query parameters when no
/// entry matches.
pub fn find_endpoint(catalog: &ServiceCatalog, query: &EndpointQuery) -> Result<Endpoint> {
    catalog
        .entries()
        .iter()
        .filter(|entry| entry.has_type(&query.service_type) && entry.has_name(&query.name))
        .find_map(|entry| entry.endpoint_for_region(&query.region))
        .ok_or_else(|| query.not_found())
        .map(Endpoint::from_catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> ServiceCatalog {
        ServiceCatalog::from_access_document(&json!({
            "access": {
                "serviceCatalog": [
                    {
                        "name": "cloudBlockStorage",
                        "type": "volume",
                        "endpoints": [
                            {
                                "region": "DFW",
                                "tenantId": "123456",
                                "publicURL": "https://dfw.blockstorage.api.rackspacecloud.com/v1/123456"
                            },
                            {
                                "region": "ORD",
                                "tenantId": "123456",
                                "publicURL": "https://ord.blockstorage.api.rackspacecloud.com/v1/123456",
                                "internalURL": "https://snet-ord.blockstorage.api.rackspacecloud.com/v1/123456"
                            }
                        ]
                    },
                    {
                        "name": "cloudDNS",
                        "type": "rax:dns",
                        "endpoints": [
                            { "publicURL": "https://dns.api.rackspacecloud.com/v1.0/123456" }
                        ]
                    }
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_from_access_document_shapes() {
        assert_eq!(catalog().len(), 2);

        let bare = ServiceCatalog::from_access_document(&json!([
            { "name": "a", "type": "b", "endpoints": [] }
        ]))
        .unwrap();
        assert_eq!(bare.entries()[0].service_type, "b");

        let err = ServiceCatalog::from_access_document(&json!({ "access": {} })).unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[test]
    fn test_find_endpoint_by_region() {
        let query = EndpointQuery::new("volume", "cloudBlockStorage", "ORD", UrlType::Private);
        let endpoint = find_endpoint(&catalog(), &query).unwrap();

        assert_eq!(endpoint.region(), Some("ORD"));
        assert_eq!(
            endpoint.base_url(UrlType::Private).unwrap().host_str(),
            Some("snet-ord.blockstorage.api.rackspacecloud.com")
        );
    }

    #[test]
    fn test_find_endpoint_global_service_matches_any_region() {
        let query = EndpointQuery::new("rax:dns", "cloudDNS", "SYD", UrlType::Public);
        let endpoint = find_endpoint(&catalog(), &query).unwrap();
        assert!(endpoint.region().is_none());
    }

    #[test]
    fn test_find_endpoint_missing_combinations() {
        let cases = [
            ("compute", "cloudBlockStorage", "DFW"),
            ("volume", "cloudServersOpenStack", "DFW"),
            ("volume", "cloudBlockStorage", "LON"),
        ];

        for (service_type, name, region) in cases {
            let query = EndpointQuery::new(service_type, name, region, UrlType::Public);
            let err = find_endpoint(&catalog(), &query).unwrap_err();
            assert_eq!(
                err,
                Error::EndpointNotFound {
                    service_type: service_type.to_string(),
                    name: name.to_string(),
                    region: region.to_string(),
                    url_type: UrlType::Public,
                }
            );
        }
    }

    #[test]
    fn test_find_endpoint_on_empty_catalog() {
        let query = EndpointQuery::new("volume", "cloudBlockStorage", "DFW", UrlType::Public);
        let err = find_endpoint(&ServiceCatalog::default(), &query).unwrap_err();
        assert_eq!(err.error_code(), "ENDPOINT_NOT_FOUND");
    }

    #[test]
    fn test_endpoint_present_without_requested_url_type() {
        let query = EndpointQuery::new("volume", "cloudBlockStorage", "DFW", UrlType::Private);
        let endpoint = find_endpoint(&catalog(), &query).unwrap();
        assert_eq!(
            endpoint.base_url(UrlType::Private).unwrap_err(),
            Error::BaseUrlNotFound {
                url_type: UrlType::Private
            }
        );
    }

    #[test]
    fn test_entry_regions() {
        let catalog = catalog();
        assert_eq!(catalog.entries()[0].regions(), vec!["DFW", "ORD"]);
        assert!(catalog.entries()[1].regions().is_empty());
    }
}
