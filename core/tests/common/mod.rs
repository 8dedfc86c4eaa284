//! Test transports shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use hal_client::{BoxError, HalClient, HttpRequest, HttpResponse, Transport};

pub const ROOT_URL: &str = "http://localhost:3000/api/";

/// Records every request and answers from a scripted queue.
///
/// Once the queue is empty it answers `200` with an empty
/// `application/hal+json` body.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<HttpResponse>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_responses(responses: impl IntoIterator<Item = HttpResponse>) -> Arc<Self> {
        let transport = Self::default();
        transport.responses.lock().unwrap().extend(responses);
        Arc::new(transport)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

impl Transport for RecordingTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, BoxError> {
        self.requests.lock().unwrap().push(request.clone());
        let scripted = self.responses.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or_else(|| {
            HttpResponse::new(200).with_header("Content-Type", "application/hal+json")
        }))
    }
}

/// Fails every send with a connection error.
pub struct FailingTransport;

impl Transport for FailingTransport {
    fn send(&self, _request: &HttpRequest) -> Result<HttpResponse, BoxError> {
        Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        )))
    }
}

pub fn recording_client(transport: &Arc<RecordingTransport>) -> HalClient {
    HalClient::new(ROOT_URL, transport.clone()).unwrap()
}

pub fn hal(status: u16, body: &str) -> HttpResponse {
    HttpResponse::new(status)
        .with_header("Content-Type", "application/hal+json")
        .with_body(body)
}
