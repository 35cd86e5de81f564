#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use school_portal::api::{Body, Download, Endpoint, Query, Transport};
use school_portal::RequestError;

#[derive(Debug, Clone)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub query: Query,
    pub body: Option<Body>,
}

/// In-memory backend: canned responses per method and path, every call recorded.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(&'static str, String), Result<Value, RequestError>>>,
    downloads: Mutex<HashMap<String, Vec<u8>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn route(&self, method: &'static str, endpoint: &Endpoint, resp: Result<Value, RequestError>) {
        self.routes
            .lock()
            .unwrap()
            .insert((method, endpoint.path()), resp);
    }

    pub fn on_get(&self, endpoint: Endpoint, resp: Value) {
        self.route("GET", &endpoint, Ok(resp));
    }

    pub fn fail_get(&self, endpoint: Endpoint, err: RequestError) {
        self.route("GET", &endpoint, Err(err));
    }

    pub fn on_post(&self, endpoint: Endpoint, resp: Value) {
        self.route("POST", &endpoint, Ok(resp));
    }

    pub fn fail_post(&self, endpoint: Endpoint, err: RequestError) {
        self.route("POST", &endpoint, Err(err));
    }

    pub fn on_put(&self, endpoint: Endpoint, resp: Value) {
        self.route("PUT", &endpoint, Ok(resp));
    }

    pub fn on_download(&self, endpoint: Endpoint, bytes: &[u8]) {
        self.downloads
            .lock()
            .unwrap()
            .insert(endpoint.path(), bytes.to_vec());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str, endpoint: &Endpoint) -> Vec<Call> {
        let path = endpoint.path();
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == "POST" || c.method == "PUT")
            .collect()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn respond(
        &self,
        method: &'static str,
        endpoint: &Endpoint,
        query: Query,
        body: Option<Body>,
    ) -> Result<Value, RequestError> {
        let path = endpoint.path();
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.clone(),
            query,
            body,
        });
        self.routes
            .lock()
            .unwrap()
            .get(&(method, path))
            .cloned()
            .unwrap_or_else(|| Err(RequestError::status(404, "Not Found")))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, endpoint: &Endpoint, query: &Query) -> Result<Value, RequestError> {
        self.respond("GET", endpoint, query.clone(), None)
    }

    async fn post(&self, endpoint: &Endpoint, body: Body) -> Result<Value, RequestError> {
        self.respond("POST", endpoint, Query::new(), Some(body))
    }

    async fn put(&self, endpoint: &Endpoint, body: Body) -> Result<Value, RequestError> {
        self.respond("PUT", endpoint, Query::new(), Some(body))
    }

    async fn download(&self, endpoint: &Endpoint) -> Result<Download, RequestError> {
        let path = endpoint.path();
        self.calls.lock().unwrap().push(Call {
            method: "DOWNLOAD",
            path: path.clone(),
            query: Query::new(),
            body: None,
        });
        self.downloads
            .lock()
            .unwrap()
            .get(&path)
            .map(|bytes| Download {
                bytes: bytes.clone(),
                suggested_name: None,
                content_type: Some("application/pdf".into()),
            })
            .ok_or_else(|| RequestError::status(404, "Not Found"))
    }
}
