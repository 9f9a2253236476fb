//! Resource trait and the generic key/value record.
//!
//! A [`Resource`] describes where a resource type lives under a service's base
//! URL and how the API wraps it in JSON, which is all a service needs to fetch
//! single objects and paginated listings of it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A decodable REST resource.
pub trait Resource: DeserializeOwned + Send {
    /// Path segment under the service base URL (e.g. `volumes`).
    const RESOURCE_NAME: &'static str;

    /// Key wrapping a single object (e.g. `volume`), if any.
    const JSON_NAME: Option<&'static str> = None;

    /// Key wrapping a listing (e.g. `volumes`), if any.
    const JSON_COLLECTION_NAME: Option<&'static str> = None;

    /// Key of a per-item sub-object whose fields are merged into the item.
    const JSON_COLLECTION_ELEMENT: Option<&'static str> = None;
}

/// Generic JSON object decoded without a schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wrap an existing JSON object.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Field by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String field by key.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Field names in decode order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwrap into the underlying JSON object.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl Resource for Record {
    const RESOURCE_NAME: &'static str = "";
}

/// Hypermedia link attached to resources and listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Relation (`self`, `bookmark`, `next`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,

    /// Target URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,

    /// Media type of the target
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl Link {
    /// Returns true if the link has the given relation.
    #[must_use]
    pub fn is_rel(&self, rel: &str) -> bool {
        self.rel.as_deref() == Some(rel)
    }
}
