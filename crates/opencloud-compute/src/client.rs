//! Asynchronous compute service.

use crate::models::{Flavor, Image, Server};
use crate::Result;
use opencloud_core::config::CloudConfig;
use opencloud_core::ids::{FlavorId, ImageId, ServerId};
use opencloud_core::query::QueryParams;
use opencloud_core::types::CloudService;
use opencloud_core::{CloudClient, Collection, Resource, Service, UrlType};
use std::sync::Arc;
use tracing::debug;

/// Catalog type of the compute service.
pub const SERVICE_TYPE: &str = "compute";

/// Catalog name used when none is configured.
pub const DEFAULT_NAME: &str = "cloudServersOpenStack";

/// Attribute namespaces understood by [`Server`] and [`Image`].
pub const NAMESPACES: &[&str] = &["OS-DCF", "OS-EXT-STS", "rax-bandwidth"];

const RESOURCES: &[&str] = &["Server", "Flavor", "Image"];

/// Compute (Nova v2) service bound to one region.
#[derive(Debug, Clone)]
pub struct ComputeService {
    service: Service,
}

impl ComputeService {
    /// Resolve the compute endpoint from the client's catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog has no matching endpoint or base URL.
    pub async fn new(
        client: Arc<dyn CloudClient>,
        name: impl Into<String>,
        region: impl Into<String>,
        url_type: UrlType,
    ) -> Result<Self> {
        let service = Service::new(client, SERVICE_TYPE, name, region, url_type).await?;
        Ok(Self::wrap(service))
    }

    /// Resolve the compute endpoint using configured name, region and URL type.
    ///
    /// # Errors
    ///
    /// See [`ComputeService::new`].
    pub async fn from_config(client: Arc<dyn CloudClient>, config: &CloudConfig) -> Result<Self> {
        let query = config.endpoint_query(CloudService::Compute);
        let service = Service::from_query(client, query).await?;
        Ok(Self::wrap(service))
    }

    fn wrap(service: Service) -> Self {
        Self {
            service: service
                .with_resources(RESOURCES)
                .with_namespaces(NAMESPACES.iter().copied()),
        }
    }

    /// Underlying generic service.
    #[must_use]
    pub const fn service(&self) -> &Service {
        &self.service
    }

    /// Fetch a server.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server does not decode.
    pub async fn server(&self, id: ServerId) -> Result<Server> {
        self.service.resource(id).await
    }

    /// List servers. `details` selects the `servers/detail` listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the listing does not decode.
    pub async fn server_list(
        &self,
        details: bool,
        filters: &QueryParams,
    ) -> Result<Collection<Server>> {
        self.list::<Server>(details, filters).await
    }

    /// Fetch a flavor.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the flavor does not decode.
    pub async fn flavor(&self, id: &FlavorId) -> Result<Flavor> {
        self.service.resource(id).await
    }

    /// List flavors. `details` selects the `flavors/detail` listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the listing does not decode.
    pub async fn flavor_list(
        &self,
        details: bool,
        filters: &QueryParams,
    ) -> Result<Collection<Flavor>> {
        self.list::<Flavor>(details, filters).await
    }

    /// Fetch an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the image does not decode.
    pub async fn image(&self, id: ImageId) -> Result<Image> {
        self.service.resource(id).await
    }

    /// List images. `details` selects the `images/detail` listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the listing does not decode.
    pub async fn image_list(&self, details: bool, filters: &QueryParams) -> Result<Collection<Image>> {
        self.list::<Image>(details, filters).await
    }

    async fn list<T: Resource>(&self, details: bool, filters: &QueryParams) -> Result<Collection<T>> {
        let path = if details {
            format!("{}/detail", T::RESOURCE_NAME)
        } else {
            T::RESOURCE_NAME.to_string()
        };
        let url = self
            .service
            .get_url(Some(path.as_str()), filters.pairs().iter().cloned());
        debug!(%url, "listing compute resources");
        self.service.collection(Some(url)).await
    }
}
