//! Page-aware resource collections.
//!
//! A listing response is reshaped into a flat list of items according to the
//! resource's JSON wrapper names. When the response carries a `next` link the
//! collection remembers it, and further pages can be appended in server order.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::warn;
use url::Url;

use crate::error::{Error, Result};
use crate::resource::{Link, Resource};
use crate::service::Service;

/// Ordered resources plus an optional continuation URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<T>,
    next_page: Option<Url>,
    first_page: Option<Url>,
}

impl<T> Collection<T> {
    /// Create a collection from decoded items.
    #[must_use]
    pub const fn new(items: Vec<T>, next_page: Option<Url>) -> Self {
        Self {
            items,
            next_page,
            first_page: None,
        }
    }

    /// An empty, fully drained collection.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_page: None,
            first_page: None,
        }
    }

    /// Number of items loaded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no items are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over loaded items.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Loaded items.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// First loaded item.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// Take ownership of the loaded items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// URL of the next page, if the server advertised one.
    #[must_use]
    pub const fn next_page_url(&self) -> Option<&Url> {
        self.next_page.as_ref()
    }

    /// URL the first page was fetched from, when decoded from a response.
    #[must_use]
    pub const fn first_page_url(&self) -> Option<&Url> {
        self.first_page.as_ref()
    }

    /// Returns true if another page is available.
    #[must_use]
    pub const fn has_next_page(&self) -> bool {
        self.next_page.is_some()
    }

    /// Append a page: its items follow the current ones and its continuation
    /// replaces the current one.
    pub fn append_page(&mut self, page: Self) {
        self.items.extend(page.items);
        self.next_page = page.next_page;
    }

    /// Items matching `predicate`, as a collection with no continuation.
    #[must_use]
    pub fn select<F>(&self, mut predicate: F) -> Self
    where
        T: Clone,
        F: FnMut(&T) -> bool,
    {
        Self::new(
            self.items.iter().filter(|item| predicate(item)).cloned().collect(),
            None,
        )
    }

    /// Sort loaded items by key. Stable.
    pub fn sort_by_key<K, F>(&mut self, f: F)
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.items.sort_by_key(f);
    }
}

impl<T: Resource> Collection<T> {
    /// Decode a listing response fetched from `request_url`.
    ///
    /// Relative `next` links are resolved against `request_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if an item does not decode as `T` or a `next` link is
    /// not a valid URL.
    pub fn from_response(body: Value, request_url: &Url) -> Result<Self> {
        if is_empty_body(&body) {
            return Ok(Self {
                first_page: Some(request_url.clone()),
                ..Self::empty()
            });
        }

        let next_page = next_page_link(&body, request_url)?;
        let raw = match (T::JSON_COLLECTION_NAME, body) {
            (_, Value::Array(items)) => items,
            (None, Value::Object(map)) => map
                .into_iter()
                .filter(|(key, _)| key != "links")
                .map(|(_, value)| value)
                .collect(),
            (Some(name), Value::Object(mut map)) => match map.remove(name) {
                Some(Value::Array(list)) => match T::JSON_COLLECTION_ELEMENT {
                    Some(element) => list
                        .into_iter()
                        .map(|item| flatten_element(item, element))
                        .collect(),
                    None => list,
                },
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        let items = raw
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(Error::from))
            .collect::<Result<Vec<T>>>()?;

        Ok(Self {
            items,
            next_page,
            first_page: Some(request_url.clone()),
        })
    }

    /// Fetch the next page through `service` and append it.
    ///
    /// Returns `false` without a request when there is no next page.
    ///
    /// # Errors
    ///
    /// Returns an error if the page request or its decoding fails.
    pub async fn load_next_page(&mut self, service: &Service) -> Result<bool> {
        let Some(url) = self.next_page.clone() else {
            return Ok(false);
        };
        let page = service.collection::<T>(Some(url)).await?;
        self.append_page(page);
        Ok(true)
    }

    /// Fetch every remaining page and return all items in server order.
    ///
    /// A `next` link pointing at a page already fetched, including the first
    /// one, ends the walk.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request or its decoding fails.
    pub async fn drain(mut self, service: &Service) -> Result<Vec<T>> {
        let mut seen: HashSet<Url> = self.first_page.iter().cloned().collect();
        while let Some(url) = self.next_page.clone() {
            if !seen.insert(url.clone()) {
                warn!(%url, "pagination link repeats an earlier page, stopping");
                self.next_page = None;
                break;
            }
            self.load_next_page(service).await?;
        }
        Ok(self.items)
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn next_page_link(body: &Value, request_url: &Url) -> Result<Option<Url>> {
    let Some(links) = body.get("links").and_then(Value::as_array) else {
        return Ok(None);
    };

    let mut next = None;
    for link in links {
        let Ok(link) = serde_json::from_value::<Link>(link.clone()) else {
            continue;
        };
        if !link.is_rel("next") {
            continue;
        }
        match link.href {
            Some(href) => {
                let url = request_url
                    .join(&href)
                    .map_err(|e| Error::InvalidUrl(format!("{href}: {e}")))?;
                next = Some(url);
            }
            None => warn!("Unexpected [links] found with no [href]"),
        }
    }
    Ok(next)
}

fn flatten_element(item: Value, element: &str) -> Value {
    let Value::Object(mut fields) = item else {
        return item;
    };
    match fields.remove(element) {
        Some(Value::Object(sub)) => {
            merge_over(&mut fields, sub);
        }
        Some(other) => {
            fields.insert(element.to_string(), other);
        }
        None => {}
    }
    Value::Object(fields)
}

fn merge_over(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        target.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Widget {
        id: u32,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        colour: Option<String>,
    }

    impl Resource for Widget {
        const RESOURCE_NAME: &'static str = "widgets";
        const JSON_NAME: Option<&'static str> = Some("widget");
        const JSON_COLLECTION_NAME: Option<&'static str> = Some("widgets");
    }

    #[derive(Debug, Deserialize)]
    struct Gadget {
        id: u32,
        name: String,
        size: u32,
    }

    impl Resource for Gadget {
        const RESOURCE_NAME: &'static str = "gadgets";
        const JSON_COLLECTION_NAME: Option<&'static str> = Some("gadgets");
        const JSON_COLLECTION_ELEMENT: Option<&'static str> = Some("gadget");
    }

    #[derive(Debug, Deserialize)]
    struct Bare {
        id: u32,
    }

    impl Resource for Bare {
        const RESOURCE_NAME: &'static str = "bare";
    }

    fn request_url() -> Url {
        Url::parse("https://api.example.com/v1/123/widgets?limit=2").unwrap()
    }

    #[test]
    fn test_empty_bodies_give_empty_collection() {
        for body in [Value::Null, json!({}), json!([]), json!("")] {
            let collection = Collection::<Widget>::from_response(body, &request_url()).unwrap();
            assert!(collection.is_empty());
            assert!(!collection.has_next_page());
        }
    }

    #[test]
    fn test_named_collection_keeps_server_order() {
        let body = json!({ "widgets": [{ "id": 3 }, { "id": 1 }, { "id": 2 }] });
        let collection = Collection::<Widget>::from_response(body, &request_url()).unwrap();
        let ids: Vec<u32> = collection.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_decoded_collection_remembers_first_page() {
        let body = json!({ "widgets": [{ "id": 1 }] });
        let collection = Collection::<Widget>::from_response(body, &request_url()).unwrap();
        assert_eq!(collection.first_page_url(), Some(&request_url()));
        assert_eq!(Collection::<Widget>::empty().first_page_url(), None);
    }

    #[test]
    fn test_missing_collection_name_is_empty() {
        let body = json!({ "gizmos": [{ "id": 1 }] });
        let collection = Collection::<Widget>::from_response(body, &request_url()).unwrap();
        assert!(collection.is_empty());
    }

    #[test]
    fn test_plain_array_body() {
        let body = json!([{ "id": 1 }, { "id": 2 }]);
        let collection = Collection::<Widget>::from_response(body, &request_url()).unwrap();
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_unnamed_object_body_uses_values() {
        let body = json!({ "a": { "id": 1 }, "b": { "id": 2 } });
        let collection = Collection::<Bare>::from_response(body, &request_url()).unwrap();
        let ids: Vec<u32> = collection.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_element_fields_merge_over_item() {
        let body = json!({
            "gadgets": [
                { "id": 1, "size": 5, "gadget": { "name": "one", "size": 10 } },
                { "id": 2, "size": 7, "gadget": { "name": "two" } }
            ]
        });
        let collection = Collection::<Gadget>::from_response(body, &request_url()).unwrap();
        let gadgets = collection.into_items();

        assert_eq!(gadgets[0].id, 1);
        assert_eq!(gadgets[0].name, "one");
        assert_eq!(gadgets[0].size, 10);
        assert_eq!(gadgets[1].name, "two");
        assert_eq!(gadgets[1].size, 7);
    }

    #[test]
    fn test_next_link_is_captured() {
        let body = json!({
            "widgets": [{ "id": 1 }],
            "links": [
                { "rel": "self", "href": "https://api.example.com/v1/123/widgets" },
                { "rel": "next", "href": "https://api.example.com/v1/123/widgets?marker=1" }
            ]
        });
        let collection = Collection::<Widget>::from_response(body, &request_url()).unwrap();
        assert_eq!(
            collection.next_page_url().map(Url::as_str),
            Some("https://api.example.com/v1/123/widgets?marker=1")
        );
    }

    #[test]
    fn test_relative_next_link_resolves_against_request() {
        let body = json!({
            "widgets": [{ "id": 1 }],
            "links": [{ "rel": "next", "href": "widgets?marker=1" }]
        });
        let collection = Collection::<Widget>::from_response(body, &request_url()).unwrap();
        assert_eq!(
            collection.next_page_url().map(Url::as_str),
            Some("https://api.example.com/v1/123/widgets?marker=1")
        );
    }

    #[test]
    fn test_next_link_without_href_is_ignored() {
        let body = json!({
            "widgets": [{ "id": 1 }],
            "links": [{ "rel": "next" }]
        });
        let collection = Collection::<Widget>::from_response(body, &request_url()).unwrap();
        assert!(!collection.has_next_page());
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_undecodable_item_is_an_error() {
        let body = json!({ "widgets": [{ "id": "not a number" }] });
        let err = Collection::<Widget>::from_response(body, &request_url()).unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[test]
    fn test_append_page_extends_and_moves_continuation() {
        let next = Url::parse("https://api.example.com/page3").unwrap();
        let mut first = Collection::new(vec![1, 2], Some(request_url()));
        first.append_page(Collection::new(vec![3], Some(next.clone())));

        assert_eq!(first.items(), &[1, 2, 3]);
        assert_eq!(first.next_page_url(), Some(&next));

        first.append_page(Collection::new(vec![4], None));
        assert!(!first.has_next_page());
        assert_eq!(first.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_select_and_sort() {
        let mut collection = Collection::new(
            vec![
                Widget {
                    id: 2,
                    name: Some("b".into()),
                    colour: Some("red".into()),
                },
                Widget {
                    id: 1,
                    name: Some("a".into()),
                    colour: Some("blue".into()),
                },
            ],
            Some(request_url()),
        );

        let red = collection.select(|w| w.colour.as_deref() == Some("red"));
        assert_eq!(red.len(), 1);
        assert!(!red.has_next_page());

        collection.sort_by_key(|w| w.id);
        assert_eq!(collection.first().map(|w| w.id), Some(1));
        assert_eq!((&collection).into_iter().count(), 2);
    }
}
