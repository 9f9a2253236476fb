//! Compute models as returned by the Nova v2 API.

use chrono::{DateTime, Utc};
use opencloud_core::ids::{FlavorId, ImageId, ServerId};
use opencloud_core::query::QueryParams;
use opencloud_core::types::parse_timestamp;
use opencloud_core::{Link, Resource};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Reference to another resource by ID and links.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceRef {
    /// Referenced resource ID.
    pub id: String,
    /// Links to the referenced resource.
    #[serde(default)]
    pub links: Vec<Link>,
}

/// An IP address assigned to a server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    /// Address.
    pub addr: String,
    /// IP version (4 or 6).
    pub version: u8,
}

/// Bandwidth counters reported by the `rax-bandwidth` extension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BandwidthUsage {
    /// Network interface (`public`, `private`).
    pub interface: String,
    /// Start of the audit period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_period_start: Option<String>,
    /// End of the audit period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_period_end: Option<String>,
    /// Inbound bytes.
    #[serde(default)]
    pub bandwidth_inbound: u64,
    /// Outbound bytes.
    #[serde(default)]
    pub bandwidth_outbound: u64,
}

/// A compute server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Server {
    /// Server ID.
    pub id: ServerId,
    /// Server name.
    #[serde(default)]
    pub name: String,
    /// Status (`ACTIVE`, `BUILD`, `ERROR`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Build progress percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Owning tenant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Creating user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Host identifier, unique per tenant and host.
    #[serde(rename = "hostId", default, skip_serializing_if = "Option::is_none")]
    pub host_id: Option<String>,
    /// Image the server was built from. Empty for boot-from-volume servers.
    #[serde(default, deserialize_with = "ref_or_empty")]
    pub image: Option<ResourceRef>,
    /// Flavor of the server.
    #[serde(default, deserialize_with = "ref_or_empty")]
    pub flavor: Option<ResourceRef>,
    /// Addresses by network label.
    #[serde(default)]
    pub addresses: HashMap<String, Vec<Address>>,
    /// Public IPv4 access address.
    #[serde(rename = "accessIPv4", default, skip_serializing_if = "Option::is_none")]
    pub access_ipv4: Option<String>,
    /// Public IPv6 access address.
    #[serde(rename = "accessIPv6", default, skip_serializing_if = "Option::is_none")]
    pub access_ipv6: Option<String>,
    /// Key pair name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    /// User metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Creation timestamp as sent by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Update timestamp as sent by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    /// Disk partitioning mode (`AUTO`, `MANUAL`).
    #[serde(rename = "OS-DCF:diskConfig", default, skip_serializing_if = "Option::is_none")]
    pub disk_config: Option<String>,
    /// Hypervisor power state.
    #[serde(
        rename = "OS-EXT-STS:power_state",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub power_state: Option<u8>,
    /// Current task.
    #[serde(
        rename = "OS-EXT-STS:task_state",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub task_state: Option<String>,
    /// VM state.
    #[serde(
        rename = "OS-EXT-STS:vm_state",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub vm_state: Option<String>,
    /// Bandwidth usage per interface.
    #[serde(rename = "rax-bandwidth:bandwidth", default)]
    pub bandwidth: Vec<BandwidthUsage>,
    /// Links to the server.
    #[serde(default)]
    pub links: Vec<Link>,
    /// Attributes from other extensions.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Server {
    /// Parsed creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created.as_deref().and_then(parse_timestamp)
    }

    /// Parsed update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated.as_deref().and_then(parse_timestamp)
    }

    /// Addresses on the network with `label`, in server order.
    #[must_use]
    pub fn addresses_on(&self, label: &str) -> &[Address] {
        self.addresses.get(label).map_or(&[], Vec::as_slice)
    }

    /// Public IPv4 address, preferring `accessIPv4`.
    #[must_use]
    pub fn public_ipv4(&self) -> Option<&str> {
        self.access_ipv4
            .as_deref()
            .filter(|ip| !ip.is_empty())
            .or_else(|| {
                self.addresses_on("public")
                    .iter()
                    .find(|a| a.version == 4)
                    .map(|a| a.addr.as_str())
            })
    }

    /// Returns true once the server has finished building.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some("ACTIVE")
    }
}

impl Resource for Server {
    const RESOURCE_NAME: &'static str = "servers";
    const JSON_NAME: Option<&'static str> = Some("server");
    const JSON_COLLECTION_NAME: Option<&'static str> = Some("servers");
}

/// A hardware flavor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flavor {
    /// Flavor ID.
    pub id: FlavorId,
    /// Name.
    pub name: String,
    /// Memory (MiB).
    #[serde(default)]
    pub ram: u64,
    /// Root disk (GiB).
    #[serde(default)]
    pub disk: u64,
    /// vCPU count.
    #[serde(default)]
    pub vcpus: u32,
    /// Swap (MiB). Sent as an empty string when there is none.
    #[serde(default, deserialize_with = "loose_u64")]
    pub swap: Option<u64>,
    /// Network bandwidth factor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rxtx_factor: Option<f64>,
    /// Ephemeral disk (GiB).
    #[serde(
        rename = "OS-FLV-EXT-DATA:ephemeral",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ephemeral: Option<u64>,
    /// Links to the flavor.
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Resource for Flavor {
    const RESOURCE_NAME: &'static str = "flavors";
    const JSON_NAME: Option<&'static str> = Some("flavor");
    const JSON_COLLECTION_NAME: Option<&'static str> = Some("flavors");
}

/// A bootable image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    /// Image ID.
    pub id: ImageId,
    /// Name.
    #[serde(default)]
    pub name: String,
    /// Status (`ACTIVE`, `SAVING`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Save progress percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Minimum disk (GiB).
    #[serde(rename = "minDisk", default)]
    pub min_disk: u64,
    /// Minimum memory (MiB).
    #[serde(rename = "minRam", default)]
    pub min_ram: u64,
    /// Server a snapshot image was taken from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ResourceRef>,
    /// Image metadata.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    /// Creation timestamp as sent by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Update timestamp as sent by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    /// Disk partitioning mode.
    #[serde(rename = "OS-DCF:diskConfig", default, skip_serializing_if = "Option::is_none")]
    pub disk_config: Option<String>,
    /// Image size (bytes).
    #[serde(
        rename = "OS-EXT-IMG-SIZE:size",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub size: Option<u64>,
    /// Links to the image.
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Image {
    /// Parsed creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created.as_deref().and_then(parse_timestamp)
    }

    /// Metadata value as a string.
    #[must_use]
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Returns true for images captured from a server.
    #[must_use]
    pub fn is_snapshot(&self) -> bool {
        self.server.is_some() || self.metadata_str("image_type") == Some("snapshot")
    }
}

impl Resource for Image {
    const RESOURCE_NAME: &'static str = "images";
    const JSON_NAME: Option<&'static str> = Some("image");
    const JSON_COLLECTION_NAME: Option<&'static str> = Some("images");
}

/// Query parameters for server listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerListParams {
    /// Filter by name (regular expression).
    pub name: Option<String>,
    /// Filter by status.
    pub status: Option<String>,
    /// Filter by image.
    pub image: Option<ImageId>,
    /// Filter by flavor.
    pub flavor: Option<FlavorId>,
    /// Only servers changed since this timestamp.
    pub changes_since: Option<DateTime<Utc>>,
    /// Maximum number of results per page.
    pub limit: Option<u32>,
    /// Return results after this server.
    pub marker: Option<ServerId>,
}

impl ServerListParams {
    /// Convert the parameters into query pairs.
    #[must_use]
    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();

        params.push_opt("name", self.name.as_deref());
        params.push_opt("status", self.status.as_deref());
        params.push_opt("image", self.image.as_ref());
        params.push_opt("flavor", self.flavor.as_ref());
        params.push_opt_with("changes-since", self.changes_since, |dt| dt.to_rfc3339());
        params.push_opt("limit", self.limit);
        params.push_opt("marker", self.marker.as_ref());

        params
    }
}

/// Query parameters for flavor listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlavorListParams {
    /// Minimum root disk (GiB).
    pub min_disk: Option<u64>,
    /// Minimum memory (MiB).
    pub min_ram: Option<u64>,
    /// Maximum number of results per page.
    pub limit: Option<u32>,
    /// Return results after this flavor.
    pub marker: Option<FlavorId>,
}

impl FlavorListParams {
    /// Convert the parameters into query pairs.
    #[must_use]
    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();

        params.push_opt("minDisk", self.min_disk);
        params.push_opt("minRam", self.min_ram);
        params.push_opt("limit", self.limit);
        params.push_opt("marker", self.marker.as_ref());

        params
    }
}

/// Query parameters for image listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageListParams {
    /// Filter by name.
    pub name: Option<String>,
    /// Filter by status.
    pub status: Option<String>,
    /// Only snapshots of this server.
    pub server: Option<ServerId>,
    /// `BASE` or `SNAPSHOT`.
    pub image_type: Option<String>,
    /// Maximum number of results per page.
    pub limit: Option<u32>,
    /// Return results after this image.
    pub marker: Option<ImageId>,
}

impl ImageListParams {
    /// Convert the parameters into query pairs.
    #[must_use]
    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();

        params.push_opt("name", self.name.as_deref());
        params.push_opt("status", self.status.as_deref());
        params.push_opt("server", self.server.as_ref());
        params.push_opt("type", self.image_type.as_deref());
        params.push_opt("limit", self.limit);
        params.push_opt("marker", self.marker.as_ref());

        params
    }
}

fn ref_or_empty<'de, D>(deserializer: D) -> std::result::Result<Option<ResourceRef>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        object @ Value::Object(_) => serde_json::from_value(object)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

fn loose_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server_json() -> Value {
        json!({
            "id": "d4b4ec8f-a1e5-4b77-8b0e-a0c1e2b7b6f9",
            "name": "web-01",
            "status": "ACTIVE",
            "image": "",
            "flavor": { "id": "performance1-1", "links": [] },
            "accessIPv4": "",
            "addresses": {
                "public": [
                    { "addr": "2001:4800:7810:512:be76:4eff:fe05:5a5f", "version": 6 },
                    { "addr": "166.78.10.20", "version": 4 }
                ],
                "private": [{ "addr": "10.180.1.2", "version": 4 }]
            },
            "OS-EXT-STS:power_state": 1,
            "OS-DCF:diskConfig": "AUTO",
            "rax-bandwidth:bandwidth": [],
            "config_drive": ""
        })
    }

    #[test]
    fn boot_from_volume_server_has_no_image() {
        let server: Server = serde_json::from_value(server_json()).unwrap();
        assert!(server.image.is_none());
        assert_eq!(server.flavor.as_ref().map(|f| f.id.as_str()), Some("performance1-1"));
        assert!(server.is_active());
        assert_eq!(server.power_state, Some(1));
        assert_eq!(server.extra.get("config_drive"), Some(&json!("")));
    }

    #[test]
    fn public_ipv4_falls_back_to_addresses() {
        let mut server: Server = serde_json::from_value(server_json()).unwrap();
        assert_eq!(server.public_ipv4(), Some("166.78.10.20"));

        server.access_ipv4 = Some("166.78.10.99".into());
        assert_eq!(server.public_ipv4(), Some("166.78.10.99"));
        assert!(server.addresses_on("servicenet").is_empty());
    }

    #[test]
    fn flavor_swap_accepts_empty_string() {
        let flavor: Flavor = serde_json::from_value(json!({
            "id": "2",
            "name": "512MB Standard Instance",
            "ram": 512,
            "disk": 20,
            "vcpus": 1,
            "swap": ""
        }))
        .unwrap();
        assert_eq!(flavor.swap, None);

        let flavor: Flavor = serde_json::from_value(json!({
            "id": 3,
            "name": "1GB Standard Instance",
            "swap": 1024
        }))
        .unwrap();
        assert_eq!(flavor.id.as_str(), "3");
        assert_eq!(flavor.swap, Some(1024));
    }

    #[test]
    fn server_list_params_to_query() {
        let params = ServerListParams {
            status: Some("ACTIVE".into()),
            flavor: Some(FlavorId::from("performance1-1")),
            changes_since: DateTime::parse_from_rfc3339("2013-09-20T14:00:00Z")
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            limit: Some(10),
            ..ServerListParams::default()
        };

        assert_eq!(
            params.to_query().into_pairs(),
            vec![
                ("status".to_string(), "ACTIVE".to_string()),
                ("flavor".to_string(), "performance1-1".to_string()),
                (
                    "changes-since".to_string(),
                    "2013-09-20T14:00:00+00:00".to_string()
                ),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn flavor_and_image_params_to_query() {
        let flavors = FlavorListParams {
            min_ram: Some(1024),
            ..FlavorListParams::default()
        };
        assert_eq!(
            flavors.to_query().into_pairs(),
            vec![("minRam".to_string(), "1024".to_string())]
        );

        let images = ImageListParams {
            image_type: Some("SNAPSHOT".into()),
            ..ImageListParams::default()
        };
        assert_eq!(
            images.to_query().into_pairs(),
            vec![("type".to_string(), "SNAPSHOT".to_string())]
        );
    }

    #[test]
    fn image_snapshot_detection() {
        let image: Image = serde_json::from_value(json!({
            "id": "3afe97b2-26dc-49c5-a2cc-a2fc8d80c001",
            "name": "web-01 nightly",
            "minDisk": 20,
            "minRam": 512,
            "metadata": { "image_type": "snapshot", "auto_disk_config": "True" }
        }))
        .unwrap();
        assert!(image.is_snapshot());
        assert_eq!(image.metadata_str("auto_disk_config"), Some("True"));
        assert_eq!(image.min_disk, 20);
    }
}
