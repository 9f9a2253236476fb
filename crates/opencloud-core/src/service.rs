//! Service base shared by every concrete REST wrapper.
//!
//! A [`Service`] is the relationship between a session and one catalog entry:
//! construction resolves the regional endpoint and base URL once, after which
//! the service builds request URLs, fetches single resources and paginated
//! collections, and reads the `/extensions` and `/limits` metadata documents.

use std::fmt::{self, Display};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::catalog::{find_endpoint, EndpointQuery};
use crate::client::CloudClient;
use crate::collection::Collection;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::resource::{Link, Resource};
use crate::types::UrlType;

/// An API extension advertised under `/extensions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    /// Human readable name
    #[serde(default)]
    pub name: String,
    /// Short alias used in namespaced attributes (e.g. `OS-DCF`)
    #[serde(default)]
    pub alias: String,
    /// XML namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Last update timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    /// Documentation links
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Rate and absolute limits advertised under `/limits`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    /// Rate limits per URI pattern
    #[serde(default)]
    pub rate: Vec<RateLimit>,
    /// Absolute quotas keyed by name (e.g. `maxTotalVolumes`)
    #[serde(default)]
    pub absolute: Map<String, Value>,
}

impl Limits {
    /// Integer absolute limit by name.
    #[must_use]
    pub fn absolute_limit(&self, key: &str) -> Option<i64> {
        self.absolute.get(key).and_then(Value::as_i64)
    }
}

/// Rate limits applied to one URI pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateLimit {
    /// URI pattern as displayed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Regex matched against request paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Limits per verb
    #[serde(default)]
    pub limit: Vec<RateLimitEntry>,
}

/// A single verb's rate limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateLimitEntry {
    /// HTTP verb
    #[serde(default)]
    pub verb: String,
    /// Allowed requests per unit
    #[serde(default)]
    pub value: u64,
    /// Remaining requests in the current unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
    /// Time unit (`MINUTE`, `HOUR`, ...)
    #[serde(default)]
    pub unit: String,
    /// When the limit resets
    #[serde(
        rename = "next-available",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_available: Option<String>,
}

/// A cloud service bound to one resolved endpoint.
#[derive(Clone)]
pub struct Service {
    client: Arc<dyn CloudClient>,
    service_type: String,
    name: String,
    region: String,
    url_type: UrlType,
    endpoint: Endpoint,
    base_url: Url,
    namespaces: Vec<String>,
    resources: Vec<&'static str>,
}

impl Service {
    /// Resolve a service from the client's catalog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EndpointNotFound`] when no catalog entry matches the
    /// type, name and region, and [`Error::BaseUrlNotFound`] when the matched
    /// endpoint lacks a URL of the requested type or [`Error::InvalidUrl`] when
    /// that URL cannot be parsed. Catalog retrieval errors are passed through.
    pub async fn new(
        client: Arc<dyn CloudClient>,
        service_type: impl Into<String>,
        name: impl Into<String>,
        region: impl Into<String>,
        url_type: UrlType,
    ) -> Result<Self> {
        let query = EndpointQuery::new(service_type, name, region, url_type);
        Self::from_query(client, query).await
    }

    /// Resolve a service described by an [`EndpointQuery`].
    ///
    /// # Errors
    ///
    /// See [`Service::new`].
    pub async fn from_query(client: Arc<dyn CloudClient>, query: EndpointQuery) -> Result<Self> {
        let catalog = client.catalog().await?;

        let resolved = find_endpoint(&catalog, &query).and_then(|endpoint| {
            let base_url = endpoint.base_url(query.url_type)?;
            Ok((endpoint, base_url))
        });
        let (endpoint, base_url) = match resolved {
            Ok(resolved) => resolved,
            Err(err) => {
                if err.should_log() {
                    warn!(
                        service_type = %query.service_type,
                        name = %query.name,
                        region = %query.region,
                        url_type = %query.url_type,
                        error = %err,
                        "service endpoint resolution failed"
                    );
                } else {
                    debug!(
                        service_type = %query.service_type,
                        error = %err,
                        "service endpoint resolution failed"
                    );
                }
                return Err(err);
            }
        };

        debug!(
            service_type = %query.service_type,
            name = %query.name,
            region = %query.region,
            %base_url,
            "resolved service endpoint"
        );

        Ok(Self {
            client,
            service_type: query.service_type,
            name: query.name,
            region: query.region,
            url_type: query.url_type,
            endpoint,
            base_url,
            namespaces: Vec::new(),
            resources: Vec::new(),
        })
    }

    /// Declare the attribute namespaces this service understands.
    #[must_use]
    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    /// Declare the resource names this service exposes.
    #[must_use]
    pub fn with_resources(mut self, resources: &[&'static str]) -> Self {
        self.resources = resources.to_vec();
        self
    }

    /// HTTP client used by this service.
    #[must_use]
    pub fn client(&self) -> &Arc<dyn CloudClient> {
        &self.client
    }

    /// Catalog service type.
    #[must_use]
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// Catalog service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Region the service was resolved in.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// URL type the service talks to.
    #[must_use]
    pub const fn url_type(&self) -> UrlType {
        self.url_type
    }

    /// Endpoint selected from the catalog.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Base URL for the configured URL type.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Supported attribute namespaces.
    #[must_use]
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// Known resource names.
    #[must_use]
    pub fn resources(&self) -> &[&'static str] {
        &self.resources
    }

    /// Canonical name of a known resource, matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnrecognizedResource`] listing the known resources.
    pub fn resolve_resource(&self, name: &str) -> Result<&'static str> {
        self.resources
            .iter()
            .copied()
            .find(|known| known.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnrecognizedResource {
                resource: name.to_string(),
                available: self.resources.join(", "),
            })
    }

    /// Build a URL under the base URL.
    ///
    /// `path` is appended to the base path with exactly one `/` between them.
    /// The query string is replaced by exactly the given pairs; an empty
    /// iterator clears it.
    pub fn get_url<I, K, V>(&self, path: Option<&str>, query: I) -> Url
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut url = self.base_url.clone();

        if let Some(segment) = path.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
            let joined = format!("{}/{segment}", url.path().trim_end_matches('/'));
            url.set_path(&joined);
        }

        let mut pairs = query.into_iter().peekable();
        if pairs.peek().is_none() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
        url
    }

    /// URL for a path under the base URL, without a query string.
    pub fn url_for(&self, path: &str) -> Url {
        self.get_url(Some(path), std::iter::empty::<(&str, &str)>())
    }

    /// API extensions supported by the service.
    ///
    /// Request or decode failures yield an empty list.
    pub async fn extensions(&self) -> Vec<Extension> {
        self.get_meta("extensions")
            .await
            .and_then(|body| decode_meta(body, "extensions"))
            .unwrap_or_default()
    }

    /// Rate and absolute limits for the account.
    ///
    /// Request or decode failures yield empty limits.
    pub async fn limits(&self) -> Limits {
        self.get_meta("limits")
            .await
            .and_then(|body| decode_meta(body, "limits"))
            .unwrap_or_default()
    }

    /// Fetch one page of `T`.
    ///
    /// `url` defaults to the resource's path under the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the listing does not decode.
    pub async fn collection<T: Resource>(&self, url: Option<Url>) -> Result<Collection<T>> {
        let url = url.unwrap_or_else(|| self.url_for(T::RESOURCE_NAME));
        let body = self.client.get_json(&url).await?;
        Collection::from_response(body, &url)
    }

    /// Fetch every page of `T` and flatten them in server order.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails or does not decode.
    pub async fn collection_all<T: Resource>(&self, url: Option<Url>) -> Result<Vec<T>> {
        self.collection::<T>(url).await?.drain(self).await
    }

    /// Fetch a single `T` by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] for an empty, `.` or `..` identifier, or an
    /// error if the request fails, the wrapper key is missing, or the object does
    /// not decode.
    pub async fn resource<T: Resource>(&self, id: impl Display) -> Result<T> {
        let url = self.resource_url(T::RESOURCE_NAME, &id.to_string())?;
        self.fetch::<T>(&url).await
    }

    /// URL of one resource, with `id` kept as a single encoded path segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] for an empty, `.` or `..` identifier.
    pub fn resource_url(&self, resource: &str, id: &str) -> Result<Url> {
        if matches!(id, "" | "." | "..") {
            return Err(Error::InvalidId(format!(
                "`{id}` is not a usable {resource} identifier"
            )));
        }

        let mut url = self.url_for(resource);
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(format!("{} cannot carry a path", self.base_url)))?
            .push(id);
        Ok(url)
    }

    /// Fetch a single `T` from an explicit URL.
    ///
    /// # Errors
    ///
    /// See [`Service::resource`].
    pub async fn fetch<T: Resource>(&self, url: &Url) -> Result<T> {
        let mut body = self.client.get_json(url).await?;
        let object = match T::JSON_NAME {
            Some(key) => body
                .get_mut(key)
                .map(Value::take)
                .ok_or_else(|| Error::ParseError(format!("response is missing the `{key}` key")))?,
            None => body,
        };
        serde_json::from_value(object).map_err(Error::from)
    }

    async fn get_meta(&self, resource: &str) -> Option<Value> {
        let url = self.url_for(resource);
        match self.client.get_json(&url).await {
            Ok(body) => Some(body),
            Err(err) if err.is_http_status() => {
                debug!(%url, error = %err, "metadata not provided, treating as empty");
                None
            }
            Err(err) => {
                warn!(%url, error = %err, "metadata request failed, treating as empty");
                None
            }
        }
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("service_type", &self.service_type)
            .field("name", &self.name)
            .field("region", &self.region)
            .field("url_type", &self.url_type)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

fn decode_meta<T: serde::de::DeserializeOwned>(mut body: Value, key: &str) -> Option<T> {
    let inner = body.get_mut(key).map(Value::take)?;
    match serde_json::from_value(inner) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            warn!(key, error = %err, "metadata document did not decode, treating as empty");
            None
        }
    }
}
