//! Block storage models as returned by the Cinder v1 API.

use chrono::{DateTime, Utc};
use opencloud_core::ids::{ServerId, SnapshotId, VolumeId, VolumeTypeId};
use opencloud_core::query::QueryParams;
use opencloud_core::types::parse_timestamp;
use opencloud_core::Resource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A block storage volume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Volume {
    /// Volume ID.
    pub id: VolumeId,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Display description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_description: Option<String>,
    /// Size (GiB).
    #[serde(default)]
    pub size: u64,
    /// Status (`available`, `in-use`, `creating`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Volume type name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
    /// Snapshot the volume was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<SnapshotId>,
    /// Availability zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    /// Server attachments.
    #[serde(default)]
    pub attachments: Vec<VolumeAttachment>,
    /// User metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Creation timestamp as sent by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Namespaced extension attributes (e.g. `os-vol-host-attr:host`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Volume {
    /// Parsed creation timestamp.
    #[must_use]
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    /// Returns true if the volume is attached to at least one server.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        !self.attachments.is_empty()
    }
}

impl Resource for Volume {
    const RESOURCE_NAME: &'static str = "volumes";
    const JSON_NAME: Option<&'static str> = Some("volume");
    const JSON_COLLECTION_NAME: Option<&'static str> = Some("volumes");
}

/// Attachment of a volume to a server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VolumeAttachment {
    /// Attachment ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Device path on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Server the volume is attached to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<ServerId>,
    /// Attached volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_id: Option<VolumeId>,
}

/// A volume type (e.g. `SATA`, `SSD`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VolumeType {
    /// Volume type ID. Some deployments send a number.
    pub id: VolumeTypeId,
    /// Name.
    pub name: String,
    /// Backend specific properties.
    #[serde(default)]
    pub extra_specs: HashMap<String, String>,
}

impl Resource for VolumeType {
    const RESOURCE_NAME: &'static str = "types";
    const JSON_NAME: Option<&'static str> = Some("volume_type");
    const JSON_COLLECTION_NAME: Option<&'static str> = Some("volume_types");
}

/// A point-in-time snapshot of a volume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Snapshot ID.
    pub id: SnapshotId,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Display description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_description: Option<String>,
    /// Source volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_id: Option<VolumeId>,
    /// Status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Size (GiB).
    #[serde(default)]
    pub size: u64,
    /// User metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Creation timestamp as sent by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Progress reported by the extended snapshot attributes extension.
    #[serde(
        rename = "os-extended-snapshot-attributes:progress",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub progress: Option<String>,
}

impl Snapshot {
    /// Parsed creation timestamp.
    #[must_use]
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    /// Progress as a percentage, when reported.
    #[must_use]
    pub fn progress_percent(&self) -> Option<u8> {
        self.progress
            .as_deref()
            .and_then(|p| p.trim_end_matches('%').parse().ok())
    }
}

impl Resource for Snapshot {
    const RESOURCE_NAME: &'static str = "snapshots";
    const JSON_NAME: Option<&'static str> = Some("snapshot");
    const JSON_COLLECTION_NAME: Option<&'static str> = Some("snapshots");
}

/// Query parameters for volume listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeListParams {
    /// Filter by display name.
    pub display_name: Option<String>,
    /// Filter by status.
    pub status: Option<String>,
    /// Maximum number of results per page.
    pub limit: Option<u32>,
    /// Return results after this volume.
    pub marker: Option<VolumeId>,
}

impl VolumeListParams {
    /// Convert the parameters into query pairs.
    #[must_use]
    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();

        params.push_opt("display_name", self.display_name.as_deref());
        params.push_opt("status", self.status.as_deref());
        params.push_opt("limit", self.limit);
        params.push_opt("marker", self.marker.as_ref());

        params
    }
}

/// Query parameters for snapshot listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotListParams {
    /// Filter by display name.
    pub display_name: Option<String>,
    /// Filter by status.
    pub status: Option<String>,
    /// Filter by source volume.
    pub volume_id: Option<VolumeId>,
}

impl SnapshotListParams {
    /// Convert the parameters into query pairs.
    #[must_use]
    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();

        params.push_opt("display_name", self.display_name.as_deref());
        params.push_opt("status", self.status.as_deref());
        params.push_opt("volume_id", self.volume_id.as_ref());

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn volume_list_params_to_query() {
        let params = VolumeListParams {
            display_name: Some("db-data".into()),
            status: Some("available".into()),
            limit: Some(50),
            ..VolumeListParams::default()
        };

        let pairs = params.to_query().into_pairs();
        assert_eq!(
            pairs,
            vec![
                ("display_name".to_string(), "db-data".to_string()),
                ("status".to_string(), "available".to_string()),
                ("limit".to_string(), "50".to_string()),
            ]
        );
        assert!(VolumeListParams::default().to_query().is_empty());
    }

    #[test]
    fn snapshot_list_params_to_query() {
        let volume_id = VolumeId::new_v4();
        let params = SnapshotListParams {
            volume_id: Some(volume_id),
            ..SnapshotListParams::default()
        };
        assert_eq!(
            params.to_query().into_pairs(),
            vec![("volume_id".to_string(), volume_id.to_string())]
        );
    }

    #[test]
    fn volume_keeps_extension_attributes() {
        let volume: Volume = serde_json::from_value(json!({
            "id": "521752a6-acf6-4b2d-bc7a-119f9148cd8c",
            "display_name": "vol-001",
            "size": 100,
            "status": "in-use",
            "volume_type": "SATA",
            "attachments": [{
                "device": "/dev/xvdb",
                "server_id": "a9d7a5f0-9c8b-4b0e-8e8a-2f6a9e1f9c11",
                "id": "521752a6-acf6-4b2d-bc7a-119f9148cd8c",
                "volume_id": "521752a6-acf6-4b2d-bc7a-119f9148cd8c"
            }],
            "created_at": "2013-02-25T02:40:21.000000",
            "os-vol-tenant-attr:tenant_id": "123456"
        }))
        .unwrap();

        assert!(volume.is_attached());
        assert_eq!(volume.attachments[0].device.as_deref(), Some("/dev/xvdb"));
        assert_eq!(
            volume.extra.get("os-vol-tenant-attr:tenant_id"),
            Some(&json!("123456"))
        );
        assert!(volume.created().is_some());
    }

    #[test]
    fn volume_type_accepts_numeric_id() {
        let volume_type: VolumeType =
            serde_json::from_value(json!({ "id": 1, "name": "SATA", "extra_specs": {} }))
                .unwrap();
        assert_eq!(volume_type.id.as_str(), "1");
    }

    #[test]
    fn snapshot_progress() {
        let snapshot: Snapshot = serde_json::from_value(json!({
            "id": "2f6a9e1f-9c11-4b0e-8e8a-a9d7a5f09c8b",
            "status": "creating",
            "size": 10,
            "os-extended-snapshot-attributes:progress": "45%"
        }))
        .unwrap();
        assert_eq!(snapshot.progress_percent(), Some(45));
        assert_eq!(snapshot.created(), None);
    }
}
