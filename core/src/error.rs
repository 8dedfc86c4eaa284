//! Error types for the HAL client.
//!
//! # Design
//! Two kinds of failure matter to callers. `Transport` means no response
//! arrived at all. `BadResponse` means a response arrived but cannot be used:
//! a non-2xx status, a missing or foreign content type, an unreadable body,
//! or malformed JSON. Every bad response carries the request, the response
//! and a best-effort resource, so callers can still read the status code and
//! whatever error document the server sent. The message tells the cases
//! apart.

use crate::http::{BoxError, HttpRequest, HttpResponse};
use crate::resource::Resource;

/// Errors returned by `HalClient` operations.
#[derive(Debug, thiserror::Error)]
pub enum HalError {
    /// The transport failed to produce a response.
    #[error(transparent)]
    Transport(Box<TransportError>),

    /// A response arrived but is unusable.
    #[error(transparent)]
    BadResponse(Box<BadResponseError>),

    /// The root URL or a request target is not a valid URI reference.
    #[error("invalid URI {uri:?}: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
}

impl HalError {
    /// The bad-response details, if this is one.
    pub fn as_bad_response(&self) -> Option<&BadResponseError> {
        match self {
            HalError::BadResponse(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            HalError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for HalError {
    fn from(err: TransportError) -> Self {
        HalError::Transport(Box::new(err))
    }
}

impl From<BadResponseError> for HalError {
    fn from(err: BadResponseError) -> Self {
        HalError::BadResponse(Box::new(err))
    }
}

/// Sending a request failed before any response was received.
#[derive(Debug, thiserror::Error)]
#[error("error sending {} request to {}: {source}", .request.method, .request.uri)]
pub struct TransportError {
    request: HttpRequest,
    #[source]
    source: BoxError,
}

impl TransportError {
    pub fn new(request: HttpRequest, source: BoxError) -> Self {
        Self { request, source }
    }

    /// The request that was being sent.
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.source.as_ref()
    }
}

/// A response was received but could not be turned into a resource.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct BadResponseError {
    message: String,
    request: HttpRequest,
    response: HttpResponse,
    resource: Resource,
    #[source]
    source: Option<std::io::Error>,
}

impl BadResponseError {
    pub fn new(
        message: impl Into<String>,
        request: HttpRequest,
        response: HttpResponse,
        resource: Resource,
    ) -> Self {
        Self {
            message: message.into(),
            request,
            response,
            resource,
            source: None,
        }
    }

    pub(crate) fn with_source(mut self, source: std::io::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// The error for a response whose status falls outside `200..300`.
    pub fn unsuccessful(request: HttpRequest, response: HttpResponse, resource: Resource) -> Self {
        let message = format!("Bad response with status code {}.", response.status);
        Self::new(message, request, response, resource)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    /// The offending response. Its body has been buffered if it was read.
    pub fn response(&self) -> &HttpResponse {
        &self.response
    }

    /// Whatever could be decoded from the response; empty when nothing could.
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn status(&self) -> u16 {
        self.response.status
    }

    pub fn into_parts(self) -> (HttpRequest, HttpResponse, Resource) {
        (self.request, self.response, self.resource)
    }
}
