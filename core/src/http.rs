//! HTTP exchange types and the transport capability.
//!
//! # Design
//! Requests and responses are plain data. The core builds `HttpRequest`
//! values and interprets `HttpResponse` values; the only I/O it performs is
//! handing a request to an injected `Transport` and reading the response
//! body. Any concrete transport (a real HTTP agent, a recording fake, a
//! replay fixture) satisfies the same one-method trait.
//!
//! The response body is the one field that is not plain data: a transport
//! may hand back a stream, and reading it may fail. Reading buffers the body
//! in place so a response stays inspectable after it has been consumed.

use std::fmt;
use std::io::Read;
use std::sync::Arc;

use url::Url;

/// Boxed error returned by a failing transport.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered header list with case-insensitive name lookup.
///
/// Names keep the casing they were first inserted with. Several values
/// under one name are kept as separate entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every value of `name` with `value`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => {
                self.entries[index].1 = value;
                let mut seen = 0;
                self.entries.retain(|(n, _)| {
                    if !n.eq_ignore_ascii_case(&name) {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Add a value without touching existing values of `name`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|index| self.entries[index].1.as_str())
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All values of `name` joined with `", "`, as they would travel on one line.
    pub fn line(&self, name: &str) -> Option<String> {
        let values = self.get_all(name);
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

/// An HTTP request described as plain data.
///
/// Built by `HalClient::create_request`. A `Transport` executes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub uri: Url,
    pub version: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

/// Body of an `HttpResponse`, either already in memory or still a stream.
pub enum ResponseBody {
    Buffered(Vec<u8>),
    Streaming(Box<dyn Read + Send + Sync>),
}

impl ResponseBody {
    /// Read the whole body, buffering a stream in place.
    ///
    /// Only I/O can fail here. On a read failure the body is left empty.
    pub fn read_to_end(&mut self) -> std::io::Result<&[u8]> {
        if let ResponseBody::Streaming(reader) = &mut *self {
            let mut bytes = Vec::new();
            let read = reader.read_to_end(&mut bytes);
            *self = ResponseBody::Buffered(bytes);
            read?;
        }
        Ok(self.buffered().unwrap_or_default())
    }

    /// Read the whole body as UTF-8 text.
    pub fn read_to_string(&mut self) -> std::io::Result<String> {
        let bytes = self.read_to_end()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Buffered bytes, or `None` while the body is still an unread stream.
    pub fn buffered(&self) -> Option<&[u8]> {
        match self {
            ResponseBody::Buffered(bytes) => Some(bytes),
            ResponseBody::Streaming(_) => None,
        }
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        ResponseBody::Buffered(Vec::new())
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Buffered(bytes) => f
                .debug_tuple("ResponseBody::Buffered")
                .field(&bytes.len())
                .finish(),
            ResponseBody::Streaming(_) => write!(f, "ResponseBody::Streaming(..)"),
        }
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(bytes: Vec<u8>) -> Self {
        ResponseBody::Buffered(bytes)
    }
}

impl From<String> for ResponseBody {
    fn from(text: String) -> Self {
        ResponseBody::Buffered(text.into_bytes())
    }
}

impl From<&str> for ResponseBody {
    fn from(text: &str) -> Self {
        ResponseBody::Buffered(text.as_bytes().to_vec())
    }
}

/// An HTTP response as returned by a `Transport`.
#[derive(Debug, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: ResponseBody,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<ResponseBody>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The capability of sending one request and receiving one response.
///
/// Connection handling, timeouts, retries and authentication all belong to
/// the implementation. An `Err` is surfaced to callers as a transport error.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, BoxError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, BoxError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, BoxError> {
        (**self).send(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"))
        }
    }

    #[test]
    fn header_lookup_ignores_case() {
        let mut headers = Headers::new();
        headers.append("Content-Type", "application/json");
        assert_eq!(headers.get("content-type"), Some("application/json"));
        assert!(headers.contains("CONTENT-TYPE"));
        assert!(!headers.contains("Accept"));
    }

    #[test]
    fn insert_replaces_every_value() {
        let mut headers: Headers = [("Accept", "a"), ("X-Other", "x"), ("accept", "b")]
            .into_iter()
            .collect();
        headers.insert("ACCEPT", "c");
        assert_eq!(headers.get_all("accept"), vec!["c"]);
        assert_eq!(headers.iter().count(), 2);
        // Position and original casing of the first entry survive.
        assert_eq!(headers.iter().next(), Some(("Accept", "c")));
    }

    #[test]
    fn line_joins_values() {
        let headers: Headers = [("Vary", "Accept"), ("vary", "Origin")].into_iter().collect();
        assert_eq!(headers.line("Vary").as_deref(), Some("Accept, Origin"));
        assert_eq!(headers.line("Missing"), None);
    }

    #[test]
    fn remove_drops_all_values() {
        let mut headers: Headers = [("A", "1"), ("a", "2"), ("B", "3")].into_iter().collect();
        headers.remove("A");
        assert_eq!(headers.get_all("a"), Vec::<&str>::new());
        assert_eq!(headers.get("b"), Some("3"));
    }

    #[test]
    fn streaming_body_is_buffered_after_read() {
        let mut body = ResponseBody::Streaming(Box::new(std::io::Cursor::new(b"  hi ".to_vec())));
        assert!(body.buffered().is_none());
        assert_eq!(body.read_to_string().unwrap(), "  hi ");
        assert_eq!(body.buffered(), Some(&b"  hi "[..]));
        assert_eq!(body.read_to_string().unwrap(), "  hi ");
    }

    #[test]
    fn failing_stream_reports_error() {
        let mut body = ResponseBody::Streaming(Box::new(FailingReader));
        let err = body.read_to_string().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::ConnectionReset);
        assert_eq!(body.buffered(), Some(&b""[..]));
    }

    #[test]
    fn bytes_read_back_without_decoding() {
        let mut body = ResponseBody::Streaming(Box::new(std::io::Cursor::new(b"caf\xe9".to_vec())));
        assert_eq!(body.read_to_end().unwrap(), b"caf\xe9");
        let err = body.read_to_string().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        assert_eq!(body.buffered(), Some(&b"caf\xe9"[..]));
    }

    #[test]
    fn method_renders_token() {
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(HttpMethod::Get.as_str(), "GET");
    }

    #[test]
    fn success_range() {
        assert!(HttpResponse::new(200).is_success());
        assert!(HttpResponse::new(299).is_success());
        assert!(!HttpResponse::new(300).is_success());
        assert!(!HttpResponse::new(199).is_success());
    }
}
