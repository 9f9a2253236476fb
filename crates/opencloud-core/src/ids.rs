//! Strongly-typed identifier wrappers for cloud resources.
//!
//! Volumes, snapshots, servers and images are addressed by UUID. Flavors and
//! volume types use free-form identifiers that some providers emit as JSON
//! numbers, so those wrap a string and accept either form when decoding.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Macro to generate strongly-typed UUID identifier types.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $doc:expr) => {
        $(#[$meta])*
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new identifier from a [`Uuid`].
            #[must_use]
            pub const fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Creates a new random identifier (v4).
            #[must_use]
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the inner [`Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parses an identifier from a string.
            ///
            /// # Errors
            ///
            /// Returns an error if the string is not a valid UUID.
            pub fn parse_str(input: &str) -> Result<Self> {
                Uuid::parse_str(input)
                    .map(Self)
                    .map_err(|_| Error::InvalidId(input.to_string()))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse_str(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Macro to generate free-form identifier types that tolerate numeric JSON ids.
macro_rules! string_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserialize_loose_id(deserializer).map(Self)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

fn deserialize_loose_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, found {other}"
        ))),
    }
}

uuid_id!(VolumeId, "Block storage volume UUID");
uuid_id!(SnapshotId, "Volume snapshot UUID");
uuid_id!(ServerId, "Compute server UUID");
uuid_id!(ImageId, "Compute image UUID");

string_id!(FlavorId, "Compute flavor identifier");
string_id!(VolumeTypeId, "Volume type identifier");

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_UUID: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn test_volume_id_parse_str_valid() {
        let id = VolumeId::parse_str(VALID_UUID).unwrap();
        assert_eq!(id.to_string(), VALID_UUID);
    }

    #[test]
    fn test_volume_id_parse_str_invalid() {
        let err = VolumeId::parse_str("vol-1").unwrap_err();
        assert_eq!(err, Error::InvalidId("vol-1".to_string()));
    }

    #[test]
    fn test_server_id_from_str() {
        let id: ServerId = VALID_UUID.parse().unwrap();
        assert_eq!(id.as_uuid(), &Uuid::parse_str(VALID_UUID).unwrap());
    }

    #[test]
    fn test_uuid_id_serde_is_transparent() {
        let id = SnapshotId::parse_str(VALID_UUID).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{VALID_UUID}\""));

        let back: SnapshotId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_image_id_new_v4() {
        assert_eq!(ImageId::new_v4().as_uuid().get_version_num(), 4);
    }

    #[test]
    fn test_string_id_accepts_numbers() {
        let id: VolumeTypeId = serde_json::from_str("1").unwrap();
        assert_eq!(id.as_str(), "1");

        let id: FlavorId = serde_json::from_str("\"performance1-1\"").unwrap();
        assert_eq!(id.to_string(), "performance1-1");
    }

    #[test]
    fn test_string_id_rejects_objects() {
        assert!(serde_json::from_str::<FlavorId>("{}").is_err());
        assert!(serde_json::from_str::<FlavorId>("null").is_err());
    }

    #[test]
    fn test_string_id_serializes_as_string() {
        let id = VolumeTypeId::new("2");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"2\"");
    }
}
