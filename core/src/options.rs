//! Per-call overrides applied on top of a client's base request.

use serde_json::Value;

/// Query override: an encoded string or explicit key/value pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Encoded(String),
    Pairs(Vec<(String, String)>),
}

impl From<&str> for Query {
    fn from(query: &str) -> Self {
        Query::Encoded(query.to_string())
    }
}

impl From<String> for Query {
    fn from(query: String) -> Self {
        Query::Encoded(query)
    }
}

impl<K, V> FromIterator<(K, V)> for Query
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Query::Pairs(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Request body: opaque bytes sent as-is, or a structured value sent as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Raw(Vec<u8>),
    Json(Value),
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Raw(bytes)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Raw(text.as_bytes().to_vec())
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Raw(text.into_bytes())
    }
}

/// Options for a single `HalClient::request` call.
///
/// ```
/// use hal_client::RequestOptions;
/// use serde_json::json;
///
/// let options = RequestOptions::new()
///     .query([("page", "2")])
///     .header("X-Trace", "abc")
///     .body(json!({"status": "shipped"}));
/// assert!(!options.return_raw_response);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub version: Option<String>,
    pub query: Option<Query>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub return_raw_response: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the protocol version, e.g. `"2"`.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Merge a query over the one carried by the target URI.
    pub fn query(mut self, query: impl IntoQuery) -> Self {
        self.query = Some(query.into_query());
        self
    }

    /// Set a header, replacing the client default of the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Return a successful response unparsed instead of building a resource.
    pub fn raw_response(mut self) -> Self {
        self.return_raw_response = true;
        self
    }
}

/// Anything usable as a query override.
pub trait IntoQuery {
    fn into_query(self) -> Query;
}

impl IntoQuery for Query {
    fn into_query(self) -> Query {
        self
    }
}

impl IntoQuery for &str {
    fn into_query(self) -> Query {
        Query::from(self)
    }
}

impl IntoQuery for String {
    fn into_query(self) -> Query {
        Query::from(self)
    }
}

impl<K, V, const N: usize> IntoQuery for [(K, V); N]
where
    K: Into<String>,
    V: Into<String>,
{
    fn into_query(self) -> Query {
        self.into_iter().collect()
    }
}

impl<K, V> IntoQuery for Vec<(K, V)>
where
    K: Into<String>,
    V: Into<String>,
{
    fn into_query(self) -> Query {
        self.into_iter().collect()
    }
}

impl<K, V> IntoQuery for std::collections::BTreeMap<K, V>
where
    K: Into<String>,
    V: Into<String>,
{
    fn into_query(self) -> Query {
        self.into_iter().collect()
    }
}
