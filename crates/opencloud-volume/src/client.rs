//! Asynchronous block storage service.

use crate::models::{Snapshot, Volume, VolumeType};
use crate::Result;
use opencloud_core::config::CloudConfig;
use opencloud_core::ids::{SnapshotId, VolumeId, VolumeTypeId};
use opencloud_core::query::QueryParams;
use opencloud_core::types::CloudService;
use opencloud_core::{CloudClient, Collection, Resource, Service, UrlType};
use std::sync::Arc;
use tracing::debug;

/// Catalog type of the block storage service.
pub const SERVICE_TYPE: &str = "volume";

/// Catalog name used when none is configured.
pub const DEFAULT_NAME: &str = "cloudBlockStorage";

const RESOURCES: &[&str] = &["Volume", "VolumeType", "Snapshot"];

/// Block storage (Cinder v1) service bound to one region.
#[derive(Debug, Clone)]
pub struct VolumeService {
    service: Service,
}

impl VolumeService {
    /// Resolve the block storage endpoint from the client's catalog.
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

    /// Resolve the block storage endpoint using configured name, region and URL type.
    ///
    /// # Errors
    ///
    /// See [`VolumeService::new`].
    pub async fn from_config(client: Arc<dyn CloudClient>, config: &CloudConfig) -> Result<Self> {
        let query = config.endpoint_query(CloudService::Volume);
        let service = Service::from_query(client, query).await?;
        Ok(Self::wrap(service))
    }

    fn wrap(service: Service) -> Self {
        Self {
            service: service.with_resources(RESOURCES),
        }
    }

    /// Underlying generic service.
    #[must_use]
    pub const fn service(&self) -> &Service {
        &self.service
    }

    /// Fetch a volume.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the volume does not decode.
    pub async fn volume(&self, id: VolumeId) -> Result<Volume> {
        self.service.resource(id).await
    }

    /// List volumes. `details` selects the `volumes/detail` listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the listing does not decode.
    pub async fn volume_list(
        &self,
        details: bool,
        filters: &QueryParams,
    ) -> Result<Collection<Volume>> {
        let path = if details {
            "volumes/detail"
        } else {
            Volume::RESOURCE_NAME
        };
        self.list(path, filters).await
    }

    /// Fetch a volume type.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the type does not decode.
    pub async fn volume_type(&self, id: &VolumeTypeId) -> Result<VolumeType> {
        self.service.resource(id).await
    }

    /// List volume types.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the listing does not decode.
    pub async fn volume_type_list(&self, filters: &QueryParams) -> Result<Collection<VolumeType>> {
        self.list(VolumeType::RESOURCE_NAME, filters).await
    }

    /// Fetch a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the snapshot does not decode.
    pub async fn snapshot(&self, id: SnapshotId) -> Result<Snapshot> {
        self.service.resource(id).await
    }

    /// List snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the listing does not decode.
    pub async fn snapshot_list(&self, filters: &QueryParams) -> Result<Collection<Snapshot>> {
        self.list(Snapshot::RESOURCE_NAME, filters).await
    }

    async fn list<T: Resource>(&self, path: &str, filters: &QueryParams) -> Result<Collection<T>> {
        let url = self
            .service
            .get_url(Some(path), filters.pairs().iter().cloned());
        debug!(%url, "listing block storage resources");
        self.service.collection(Some(url)).await
    }
}
