//! Request construction, dispatch and response handling for HAL APIs.
//!
//! # Design
//! `HalClient` is a value: a root URL, default headers and a shared handle to
//! the transport. `with_root_url` and `with_header` return a new client and
//! leave the receiver untouched, so two derived clients never interfere.
//!
//! `create_request` only builds the request. `request` builds it, sends it
//! through the transport exactly once, and hands the response to the
//! resource factory. Nothing is retried or cached here.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use url::{form_urlencoded, Url};

use crate::error::{BadResponseError, HalError, TransportError};
use crate::factory::{Interpreted, Rejection, ResourceFactory, VALID_CONTENT_TYPES};
use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::options::{Query, RequestBody, RequestOptions};
use crate::resource::Resource;

/// Default `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("hal-client/", env!("CARGO_PKG_VERSION"));

const DEFAULT_PROTOCOL_VERSION: &str = "1.1";

/// What a request produced: a resource, or the untouched response when
/// `RequestOptions::raw_response` was asked for.
#[derive(Debug)]
pub enum HalResponse {
    Resource(Resource),
    Raw(HttpResponse),
}

impl HalResponse {
    pub fn into_resource(self) -> Option<Resource> {
        match self {
            HalResponse::Resource(resource) => Some(resource),
            HalResponse::Raw(_) => None,
        }
    }

    pub fn into_raw(self) -> Option<HttpResponse> {
        match self {
            HalResponse::Raw(response) => Some(response),
            HalResponse::Resource(_) => None,
        }
    }
}

/// Synchronous client for HAL+JSON APIs.
#[derive(Clone)]
pub struct HalClient {
    transport: Arc<dyn Transport>,
    factory: ResourceFactory,
    root_url: Url,
    headers: Headers,
}

impl HalClient {
    pub fn new(root_url: &str, transport: impl Transport + 'static) -> Result<Self, HalError> {
        let mut headers = Headers::new();
        headers.insert("User-Agent", DEFAULT_USER_AGENT);
        headers.insert("Accept", VALID_CONTENT_TYPES.join(", "));
        Ok(Self {
            transport: Arc::new(transport),
            factory: ResourceFactory::default(),
            root_url: parse_url(root_url)?,
            headers,
        })
    }

    pub fn root_url(&self) -> &Url {
        &self.root_url
    }

    /// A copy of this client rooted at `root_url`.
    pub fn with_root_url(&self, root_url: &str) -> Result<Self, HalError> {
        let mut client = self.clone();
        client.root_url = parse_url(root_url)?;
        Ok(client)
    }

    /// Default values of header `name`.
    pub fn header(&self, name: &str) -> Vec<&str> {
        self.headers.get_all(name)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// A copy of this client sending `name: value` by default.
    pub fn with_header(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut client = self.clone();
        client.headers.insert(name, value);
        client
    }

    pub fn root(&self, options: RequestOptions) -> Result<HalResponse, HalError> {
        self.request(HttpMethod::Get, "", options)
    }

    pub fn get(&self, uri: &str, options: RequestOptions) -> Result<HalResponse, HalError> {
        self.request(HttpMethod::Get, uri, options)
    }

    pub fn post(&self, uri: &str, options: RequestOptions) -> Result<HalResponse, HalError> {
        self.request(HttpMethod::Post, uri, options)
    }

    pub fn put(&self, uri: &str, options: RequestOptions) -> Result<HalResponse, HalError> {
        self.request(HttpMethod::Put, uri, options)
    }

    pub fn patch(&self, uri: &str, options: RequestOptions) -> Result<HalResponse, HalError> {
        self.request(HttpMethod::Patch, uri, options)
    }

    pub fn delete(&self, uri: &str, options: RequestOptions) -> Result<HalResponse, HalError> {
        self.request(HttpMethod::Delete, uri, options)
    }

    /// Build, send and interpret one request.
    ///
    /// A non-2xx status always fails with a bad-response error carrying the
    /// best-effort resource decoded from the error body.
    pub fn request(
        &self,
        method: HttpMethod,
        uri: &str,
        options: RequestOptions,
    ) -> Result<HalResponse, HalError> {
        let (request, response) = self.execute(method, uri, &options)?;
        if options.return_raw_response && response.is_success() {
            return Ok(HalResponse::Raw(response));
        }
        self.resolve_resource(request, response)
            .map(HalResponse::Resource)
    }

    /// Build the request `request` would send, without sending it.
    ///
    /// `uri` is resolved against the root URL as an RFC 3986 reference.
    /// Options apply in order: version, query, headers, body.
    pub fn create_request(
        &self,
        method: HttpMethod,
        uri: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest, HalError> {
        let target = self
            .root_url
            .join(uri)
            .map_err(|source| HalError::InvalidUri {
                uri: uri.to_string(),
                source,
            })?;
        let mut request = HttpRequest {
            method,
            uri: target,
            version: DEFAULT_PROTOCOL_VERSION.to_string(),
            headers: self.headers.clone(),
            body: None,
        };

        if let Some(version) = &options.version {
            request.version = version.clone();
        }
        if let Some(query) = &options.query {
            apply_query(&mut request.uri, query);
        }
        for (name, value) in &options.headers {
            request.headers.insert(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            apply_body(&mut request, body);
        }
        Ok(request)
    }

    /// GET `uri` and require a resource back.
    pub(crate) fn get_resource(&self, uri: &str) -> Result<Resource, HalError> {
        let (request, response) = self.execute(HttpMethod::Get, uri, &RequestOptions::default())?;
        self.resolve_resource(request, response)
    }

    fn execute(
        &self,
        method: HttpMethod,
        uri: &str,
        options: &RequestOptions,
    ) -> Result<(HttpRequest, HttpResponse), HalError> {
        let request = self.create_request(method, uri, options)?;
        tracing::debug!(method = %request.method, uri = %request.uri, "sending request");
        match self.transport.send(&request) {
            Ok(response) => {
                tracing::debug!(status = response.status, uri = %request.uri, "received response");
                Ok((request, response))
            }
            Err(source) => Err(TransportError::new(request, source).into()),
        }
    }

    fn resolve_resource(
        &self,
        request: HttpRequest,
        mut response: HttpResponse,
    ) -> Result<Resource, HalError> {
        if !response.is_success() {
            let resource = match self.factory.create_resource(self, &mut response, true) {
                Ok(Interpreted::Resource(resource)) => resource,
                // Only a 201 asks for a follow-up, and 201 is a success.
                Ok(Interpreted::Created { .. }) => Resource::empty(self),
                Err(rejection) => return Err(self.reject(request, response, rejection)),
            };
            return Err(BadResponseError::unsuccessful(request, response, resource).into());
        }

        match self.factory.create_resource(self, &mut response, false) {
            Ok(Interpreted::Resource(resource)) => Ok(resource),
            Ok(Interpreted::Created { location }) => {
                tracing::debug!(location = %location, "following location of created resource");
                self.get_resource(&location)
            }
            Err(rejection) => Err(self.reject(request, response, rejection)),
        }
    }

    fn reject(&self, request: HttpRequest, response: HttpResponse, rejection: Rejection) -> HalError {
        let err = BadResponseError::new(rejection.message, request, response, Resource::empty(self));
        match rejection.source {
            Some(source) => err.with_source(source).into(),
            None => err.into(),
        }
    }
}

impl fmt::Debug for HalClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HalClient")
            .field("root_url", &self.root_url.as_str())
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

fn parse_url(url: &str) -> Result<Url, HalError> {
    Url::parse(url).map_err(|source| HalError::InvalidUri {
        uri: url.to_string(),
        source,
    })
}

/// Merge `query` over the query already on `uri`. Keys from `query` win;
/// existing keys keep their position and new keys are appended.
fn apply_query(uri: &mut Url, query: &Query) {
    let overrides: Vec<(String, String)> = match query {
        Query::Encoded(encoded) => parse_query(encoded),
        Query::Pairs(pairs) => pairs.clone(),
    };
    let mut merged = parse_query(uri.query().unwrap_or_default());
    for (key, value) in overrides {
        match merged.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => merged.push((key, value)),
        }
    }

    if merged.is_empty() {
        uri.set_query(None);
    } else {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&merged)
            .finish();
        uri.set_query(Some(&encoded));
    }
}

/// Decode a query string; a repeated key keeps its last value.
fn parse_query(query: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        match pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value.into_owned(),
            None => pairs.push((key.into_owned(), value.into_owned())),
        }
    }
    pairs
}

fn apply_body(request: &mut HttpRequest, body: &RequestBody) {
    let bytes = match body {
        RequestBody::Raw(bytes) => bytes.clone(),
        RequestBody::Json(value @ (Value::Object(_) | Value::Array(_))) => {
            if !request.headers.contains("Content-Type") {
                request.headers.insert("Content-Type", "application/json");
            }
            value.to_string().into_bytes()
        }
        RequestBody::Json(Value::Null) => return,
        RequestBody::Json(Value::String(text)) => text.as_bytes().to_vec(),
        RequestBody::Json(scalar) => scalar.to_string().into_bytes(),
    };
    request.body = Some(bytes);
}
