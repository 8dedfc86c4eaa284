//! The hypermedia resource graph decoded from a HAL document.
//!
//! # Design
//! `_links` and `_embedded` may hold either one object or an array of objects
//! per relation. Both shapes are normalized at construction into a sequence,
//! so nothing downstream has to care which one the server sent.
//!
//! A resource keeps a handle to the client that produced it. Navigation that
//! has to leave the document (following a link) goes through that client, so
//! relative hrefs resolve against the same root URL and default headers.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::client::HalClient;
use crate::error::HalError;
use crate::link::Link;

const LINKS_KEY: &str = "_links";
const EMBEDDED_KEY: &str = "_embedded";

/// A node in the hypermedia graph: properties, links and embedded resources.
#[derive(Clone)]
pub struct Resource {
    client: HalClient,
    properties: Map<String, Value>,
    links: BTreeMap<String, Vec<Link>>,
    embedded: BTreeMap<String, Vec<Resource>>,
}

impl Resource {
    /// A resource with no properties, links or embedded resources.
    pub fn empty(client: &HalClient) -> Self {
        Self {
            client: client.clone(),
            properties: Map::new(),
            links: BTreeMap::new(),
            embedded: BTreeMap::new(),
        }
    }

    /// Build a resource from a decoded HAL document.
    ///
    /// Non-object values are coerced first: `null` becomes an empty object,
    /// an array becomes an object keyed by element index, and a scalar
    /// becomes `{"0": scalar}`.
    pub fn from_value(client: &HalClient, value: Value) -> Self {
        let mut resource = Resource::empty(client);
        for (key, value) in coerce_to_object(value) {
            match key.as_str() {
                LINKS_KEY => resource.links = decode_links(value),
                EMBEDDED_KEY => resource.embedded = decode_embedded(client, value),
                _ => {
                    resource.properties.insert(key, value);
                }
            }
        }
        resource
    }

    /// The client this resource was fetched with.
    pub fn client(&self) -> &HalClient {
        &self.client
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.links.is_empty() && self.embedded.is_empty()
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn all_links(&self) -> &BTreeMap<String, Vec<Link>> {
        &self.links
    }

    /// First link of `rel`.
    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links(rel).first()
    }

    pub fn links(&self, rel: &str) -> &[Link] {
        self.links.get(rel).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_link(&self, rel: &str) -> bool {
        !self.links(rel).is_empty()
    }

    pub fn all_resources(&self) -> &BTreeMap<String, Vec<Resource>> {
        &self.embedded
    }

    /// First embedded resource of `rel`.
    pub fn resource(&self, rel: &str) -> Option<&Resource> {
        self.resources(rel).first()
    }

    pub fn resources(&self, rel: &str) -> &[Resource] {
        self.embedded
            .get(rel)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn has_resource(&self, rel: &str) -> bool {
        !self.resources(rel).is_empty()
    }

    /// First resource of `rel`, embedded or linked.
    ///
    /// Prefers an embedded resource. Otherwise GETs the first link of `rel`
    /// through the owning client. `Ok(None)` when the relation has neither.
    pub fn first_resource(&self, rel: &str) -> Result<Option<Resource>, HalError> {
        if let Some(resource) = self.resource(rel) {
            return Ok(Some(resource.clone()));
        }
        self.follow(rel, &BTreeMap::new())
    }

    /// GET the first link of `rel`, expanding its template with `variables`.
    pub fn follow(
        &self,
        rel: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<Option<Resource>, HalError> {
        match self.link(rel) {
            Some(link) => self.client.get_resource(&link.expand(variables)).map(Some),
            None => Ok(None),
        }
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.properties == other.properties
            && self.links == other.links
            && self.embedded == other.embedded
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("properties", &self.properties)
            .field("links", &self.links)
            .field("embedded", &self.embedded)
            .finish_non_exhaustive()
    }
}

fn coerce_to_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (i.to_string(), item))
            .collect(),
        scalar => Map::from_iter([("0".to_string(), scalar)]),
    }
}

/// Normalize a relation's value into a sequence: one object or an array.
fn into_sequence(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn decode_links(value: Value) -> BTreeMap<String, Vec<Link>> {
    let mut links = BTreeMap::new();
    for (rel, value) in coerce_to_object(value) {
        let decoded = into_sequence(value)
            .iter()
            .filter_map(|item| match Link::from_value(item) {
                Ok(link) => Some(link),
                Err(err) => {
                    tracing::warn!(rel = %rel, error = %err, "skipping malformed link");
                    None
                }
            })
            .collect();
        links.insert(rel, decoded);
    }
    links
}

fn decode_embedded(client: &HalClient, value: Value) -> BTreeMap<String, Vec<Resource>> {
    coerce_to_object(value)
        .into_iter()
        .map(|(rel, value)| {
            let resources = into_sequence(value)
                .into_iter()
                .map(|item| Resource::from_value(client, item))
                .collect();
            (rel, resources)
        })
        .collect()
}
