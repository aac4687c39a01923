//! Scriptable in-process network for tests and demos.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use http::{Method, StatusCode};
use url::Url;

use super::Network;
use crate::error::Error;
use crate::request::{ApiRequest, ApiResponse};
use crate::Result;

/// A mock network.
///
/// Responses are stubbed per `"{METHOD} {path}[?query]"`; unmatched requests
/// get a 404. Requests that were delivered (online, not forced to fail) are
/// recorded in order.
#[derive(Debug)]
pub struct MockNetwork {
    online: AtomicBool,
    attempts: AtomicUsize,
    stubs: Mutex<HashMap<String, ApiResponse>>,
    failing: Mutex<HashSet<String>>,
    delivered: Mutex<Vec<ApiRequest>>,
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNetwork {
    /// Creates a new, online mock network.
    pub fn new() -> Self {
        Self {
            online: AtomicBool::new(true),
            attempts: AtomicUsize::new(0),
            stubs: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            delivered: Mutex::new(Vec::new()),
        }
    }

    /// Sets whether requests reach the "server".
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Stub a response for `method` + `path` (path may include a query).
    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: impl Into<Vec<u8>>) {
        let mut response = ApiResponse::new(status, body);
        response
            .headers
            .insert("content-type".to_string(), "application/json".to_string());
        lock(&self.stubs).insert(stub_key(&method, path), response);
    }

    /// Stub a JSON response.
    pub fn respond_json(&self, method: Method, path: &str, value: &serde_json::Value) {
        self.respond(method, path, StatusCode::OK, value.to_string());
    }

    /// Make `method` + `path` fail as if the network were down.
    pub fn fail(&self, method: Method, path: &str) {
        lock(&self.failing).insert(stub_key(&method, path));
    }

    /// Undo [`MockNetwork::fail`].
    pub fn heal(&self, method: Method, path: &str) {
        lock(&self.failing).remove(&stub_key(&method, path));
    }

    /// Requests that reached the server, in arrival order.
    pub fn delivered(&self) -> Vec<ApiRequest> {
        lock(&self.delivered).clone()
    }

    /// Number of send attempts, delivered or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let key = stub_key(&request.method, &path_and_query(&request.url));

        if !self.is_online() || lock(&self.failing).contains(&key) {
            return Err(Error::NetworkUnavailable(format!("mock network refused {key}")));
        }

        lock(&self.delivered).push(request);
        Ok(lock(&self.stubs)
            .get(&key)
            .cloned()
            .unwrap_or_else(|| ApiResponse::new(StatusCode::NOT_FOUND, b"{}".to_vec())))
    }
}

fn stub_key(method: &Method, path: &str) -> String {
    format!("{method} {path}")
}

fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
