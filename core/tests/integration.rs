//! Full hypermedia walk against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the client over real
//! HTTP through a ureq-backed `Transport`. Validates request building,
//! response interpretation and link navigation end-to-end.

use std::collections::BTreeMap;

use hal_client::{BoxError, HalClient, HttpRequest, HttpResponse, RequestOptions, Transport};
use serde_json::json;

/// Executes requests with ureq.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the client
/// handle status interpretation.
struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, BoxError> {
        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.uri.as_str());
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }

        let mut response = match &request.body {
            Some(body) => self.agent.run(builder.body(body.as_slice())?)?,
            None => self.agent.run(builder.body(())?)?,
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_vec()?;

        Ok(HttpResponse {
            status,
            headers,
            body: body.into(),
        })
    }
}

fn start_server() -> std::net::SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

#[test]
fn hypermedia_walk() {
    // Step 1: start mock server on a random port.
    let addr = start_server();
    let client = HalClient::new(&format!("http://{addr}/"), UreqTransport::new()).unwrap();

    // Step 2: fetch the root and read its links.
    let root = client
        .root(RequestOptions::new())
        .unwrap()
        .into_resource()
        .unwrap();
    assert_eq!(root.property("name"), Some(&json!("order service")));
    assert!(root.has_link("orders"));
    assert!(root.link("order").unwrap().templated());

    // Step 3: follow "orders" — nothing embedded yet.
    let orders = root.first_resource("orders").unwrap().unwrap();
    assert_eq!(orders.property("count"), Some(&json!(0)));
    assert!(!orders.has_resource("orders"));

    // Step 4: create — 201 with Location and empty body is followed.
    let created = client
        .post(
            "/orders",
            RequestOptions::new().body(json!({"item": "Coffee", "quantity": 2})),
        )
        .unwrap()
        .into_resource()
        .unwrap();
    assert_eq!(created.property("item"), Some(&json!("Coffee")));
    assert_eq!(created.property("status"), Some(&json!("pending")));
    let self_href = created.link("self").unwrap().href().to_string();
    let id = created.property("id").unwrap().as_str().unwrap().to_string();

    // Step 5: update through the self link.
    let updated = client
        .put(&self_href, RequestOptions::new().body(json!({"status": "paid"})))
        .unwrap()
        .into_resource()
        .unwrap();
    assert_eq!(updated.property("status"), Some(&json!("paid")));
    assert_eq!(updated.property("quantity"), Some(&json!(2)));

    // Step 6: follow the templated "order" link from the root.
    let variables = BTreeMap::from([("id".to_string(), id.clone())]);
    let fetched = root.follow("order", &variables).unwrap().unwrap();
    assert_eq!(fetched, updated);

    // Step 7: list — one embedded order.
    let orders = client
        .get("orders", RequestOptions::new())
        .unwrap()
        .into_resource()
        .unwrap();
    assert_eq!(orders.resources("orders").len(), 1);
    let embedded = orders.first_resource("orders").unwrap().unwrap();
    assert_eq!(embedded.property("id"), Some(&json!(id)));

    // Step 8: delete — 204 yields an empty resource.
    let deleted = client
        .delete(&self_href, RequestOptions::new())
        .unwrap()
        .into_resource()
        .unwrap();
    assert!(deleted.is_empty());

    // Step 9: get after delete — 404 with a vnd.error document.
    let err = client.get(&self_href, RequestOptions::new()).unwrap_err();
    let bad = err.as_bad_response().unwrap();
    assert_eq!(bad.status(), 404);
    assert_eq!(bad.resource().property("message"), Some(&json!("order not found")));
}

#[test]
fn failing_endpoints() {
    let addr = start_server();
    let client = HalClient::new(&format!("http://{addr}/"), UreqTransport::new()).unwrap();

    // 502 still exposes the decoded error document.
    let err = client.get("broken", RequestOptions::new()).unwrap_err();
    let bad = err.as_bad_response().unwrap();
    assert_eq!(bad.status(), 502);
    assert_eq!(bad.message(), "Bad response with status code 502.");
    assert_eq!(bad.resource().property("message"), Some(&json!("upstream unavailable")));
    assert_eq!(bad.resource().link("help").unwrap().href(), "/docs/errors");

    // text/plain is not hypermedia.
    let err = client.get("plain", RequestOptions::new()).unwrap_err();
    assert!(err.to_string().contains("text/plain"), "{err}");

    // ...unless the raw response is asked for.
    let mut raw = client
        .get("plain", RequestOptions::new().raw_response())
        .unwrap()
        .into_raw()
        .unwrap();
    assert_eq!(raw.body.read_to_string().unwrap(), "not hypermedia");
}

#[test]
fn unreachable_server_is_a_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let client = HalClient::new(&format!("http://{addr}/"), UreqTransport::new()).unwrap();

    let err = client.root(RequestOptions::new()).unwrap_err();
    let transport = err.as_transport().unwrap();
    assert_eq!(transport.request().uri.as_str(), format!("http://{addr}/"));
}
