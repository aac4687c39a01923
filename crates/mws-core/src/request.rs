//! Live request and response types passed between the caller, the engine and
//! the network.

use std::collections::BTreeMap;

use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Header set on responses the engine synthesized from the local mirror
pub const SOURCE_HEADER: &str = "x-mws-source";

/// Fetch-style request metadata carried alongside a queued mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    pub mode: String,
    pub credentials: String,
    pub cache: String,
    pub redirect: String,
    pub referrer: String,
}

impl Default for RequestMeta {
    fn default() -> Self {
        Self {
            mode: "cors".to_string(),
            credentials: "same-origin".to_string(),
            cache: "default".to_string(),
            redirect: "follow".to_string(),
            referrer: "about:client".to_string(),
        }
    }
}

/// A request issued through the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    /// Lower-cased header names
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub meta: RequestMeta,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: BTreeMap::new(),
            body: None,
            meta: RequestMeta::default(),
        }
    }

    /// Parse `url` and build a request for it
    pub fn parse(method: Method, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::InvalidInput(format!("bad URL '{url}': {e}")))?;
        Ok(Self::new(method, url))
    }

    pub fn get(url: &str) -> Result<Self> {
        Self::parse(Method::GET, url)
    }

    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attach a JSON body and matching content type
    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .with_header("content-type", "application/json")
            .with_body(body))
    }

    /// Whether requests with this method carry a body
    pub fn method_has_body(method: &Method) -> bool {
        !matches!(*method, Method::GET | Method::HEAD)
    }

    /// First value of a query parameter
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// A response returned to the caller, either from the network or synthesized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Synthesized 200 response carrying `value` as JSON
    pub fn offline_json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let mut response = Self::new(StatusCode::OK, serde_json::to_vec(value)?);
        response
            .headers
            .insert("content-type".to_string(), "application/json".to_string());
        response
            .headers
            .insert(SOURCE_HEADER.to_string(), "mirror".to_string());
        Ok(response)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Whether the engine produced this response from local state
    pub fn is_synthesized(&self) -> bool {
        self.headers.contains_key(SOURCE_HEADER)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
