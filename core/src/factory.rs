//! Turns an HTTP response into a `Resource`.
//!
//! # Design
//! Interpretation is status first, then content type, then body. The body
//! is handled as bytes; only the JSON parse cares whether it is UTF-8. The factory
//! performs no network I/O itself: when a `201 Created` arrives with an empty
//! body and a `Location`, it reports `Interpreted::Created` and the client
//! issues the follow-up GET. Failures come back as `Rejection` values holding
//! only the message; the client attaches request, response and resource to
//! build the public error, since it owns all three.

use serde_json::Value;

use crate::client::HalClient;
use crate::http::{Headers, HttpResponse};
use crate::resource::Resource;

/// Media types a HAL server may answer with.
pub const VALID_CONTENT_TYPES: [&str; 3] = [
    "application/hal+json",
    "application/json",
    "application/vnd.error+json",
];

/// Outcome of a successful interpretation.
#[derive(Debug)]
pub(crate) enum Interpreted {
    Resource(Resource),
    /// Empty `201 Created` pointing at the new resource.
    Created { location: String },
}

/// Why a response could not be interpreted.
#[derive(Debug)]
pub(crate) struct Rejection {
    pub(crate) message: String,
    pub(crate) source: Option<std::io::Error>,
}

impl Rejection {
    fn new(message: String) -> Self {
        Self {
            message,
            source: None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ResourceFactory {
    valid_content_types: &'static [&'static str],
}

impl Default for ResourceFactory {
    fn default() -> Self {
        Self {
            valid_content_types: &VALID_CONTENT_TYPES,
        }
    }
}

impl ResourceFactory {
    /// Interpret `response`, buffering its body.
    ///
    /// With `ignore_invalid_content_type`, a missing or foreign content type
    /// yields an empty resource instead of a rejection. The client uses this
    /// when building the best-effort resource attached to a non-2xx error.
    pub(crate) fn create_resource(
        &self,
        client: &HalClient,
        response: &mut HttpResponse,
        ignore_invalid_content_type: bool,
    ) -> Result<Interpreted, Rejection> {
        if response.status == 204 {
            return Ok(Interpreted::Resource(Resource::empty(client)));
        }

        let body = match response.body.read_to_end() {
            Ok(body) => body.trim_ascii(),
            Err(err) => {
                return Err(Rejection {
                    message: format!("Error getting response body: {err}."),
                    source: Some(err),
                })
            }
        };

        if body.is_empty() && response.status == 201 {
            if let Some(location) = response.headers.get("Location") {
                return Ok(Interpreted::Created {
                    location: location.to_string(),
                });
            }
        }

        if !self.is_valid_content_type(&response.headers) {
            if ignore_invalid_content_type {
                return Ok(Interpreted::Resource(Resource::empty(client)));
            }
            let types = response.headers.get_all("Content-Type");
            let types = if types.is_empty() {
                "none".to_string()
            } else {
                types.join(", ")
            };
            return Err(Rejection::new(format!(
                "Request did not return a valid content type. Returned content type: {types}."
            )));
        }

        if body.is_empty() {
            return Ok(Interpreted::Resource(Resource::empty(client)));
        }

        let data: Value = serde_json::from_slice(body)
            .map_err(|err| Rejection::new(format!("JSON parse error: {err}.")))?;
        Ok(Interpreted::Resource(Resource::from_value(client, data)))
    }

    fn is_valid_content_type(&self, headers: &Headers) -> bool {
        let Some(header) = headers.line("Content-Type") else {
            return false;
        };
        let media_type = essence(&header);
        self.valid_content_types
            .iter()
            .any(|valid| valid.eq_ignore_ascii_case(media_type))
    }
}

/// Media type of a `Content-Type` value with a `charset` or `boundary`
/// parameter stripped. Any other parameter leaves the value as-is, so it
/// fails to match.
fn essence(header: &str) -> &str {
    let Some((media_type, params)) = header.split_once(';') else {
        return header;
    };
    let params = params.strip_prefix(|c: char| c.is_whitespace()).unwrap_or(params);
    let stripped = ["charset=", "boundary="]
        .iter()
        .any(|name| params.len() > name.len() && params.starts_with(name));
    if stripped {
        media_type
    } else {
        header
    }
}
