//! Synchronous client core for HAL+JSON hypermedia APIs.
//!
//! # Overview
//! Issues HTTP requests through an injected [`Transport`], validates and
//! decodes the responses, and exposes the result as a navigable [`Resource`]
//! graph of properties, links and embedded resources.
//!
//! # Design
//! - `HalClient` is a value holding the root URL and default headers;
//!   configuration changes return new clients.
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`),
//!   so any transport (a real HTTP agent, a recording fake) plugs in through
//!   the one-method `Transport` trait.
//! - Every "got a response, but it is unusable" case is a single
//!   `BadResponseError` carrying the request, response and best-effort
//!   resource.
//!
//! ```no_run
//! use hal_client::{BoxError, HalClient, HttpRequest, HttpResponse, RequestOptions, Transport};
//!
//! struct MyTransport;
//!
//! impl Transport for MyTransport {
//!     fn send(&self, request: &HttpRequest) -> Result<HttpResponse, BoxError> {
//!         unimplemented!("execute {} {}", request.method, request.uri)
//!     }
//! }
//!
//! # fn main() -> Result<(), hal_client::HalError> {
//! let client = HalClient::new("https://api.example.com/", MyTransport)?;
//! let root = client.root(RequestOptions::new())?.into_resource().unwrap();
//! if let Some(orders) = root.first_resource("orders")? {
//!     println!("{:?}", orders.property("count"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
mod factory;
pub mod http;
pub mod link;
pub mod options;
pub mod resource;

pub use client::{HalClient, HalResponse, DEFAULT_USER_AGENT};
pub use error::{BadResponseError, HalError, TransportError};
pub use factory::VALID_CONTENT_TYPES;
pub use http::{BoxError, Headers, HttpMethod, HttpRequest, HttpResponse, ResponseBody, Transport};
pub use link::Link;
pub use options::{IntoQuery, Query, RequestBody, RequestOptions};
pub use resource::Resource;
