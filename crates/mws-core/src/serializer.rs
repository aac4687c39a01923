//! Conversion between live requests and durable queue records.
//!
//! `serialize` takes the request by value: the body moves into the record.
//! Callers that still need to forward the original clone it first.

use http::Method;
use url::Url;

use crate::error::{Error, Result};
use crate::models::QueuedRequest;
use crate::request::ApiRequest;

/// Capture a request as a replayable record.
///
/// The body is kept only for methods that carry one. `local_id` is left at
/// zero; the write queue assigns it.
pub fn serialize(request: ApiRequest) -> QueuedRequest {
    let body = if ApiRequest::method_has_body(&request.method) {
        request.body
    } else {
        None
    };

    QueuedRequest {
        local_id: 0,
        url: request.url.to_string(),
        method: request.method.as_str().to_string(),
        headers: request.headers,
        body,
        meta: request.meta,
    }
}

/// Rebuild a request suitable for re-submission from a stored record.
pub fn deserialize(record: &QueuedRequest) -> Result<ApiRequest> {
    let method = Method::from_bytes(record.method.as_bytes()).map_err(|_| {
        Error::Storage(format!(
            "queued request {} has invalid method '{}'",
            record.local_id, record.method
        ))
    })?;
    let url = Url::parse(&record.url).map_err(|e| {
        Error::Storage(format!(
            "queued request {} has invalid URL '{}': {e}",
            record.local_id, record.url
        ))
    })?;

    Ok(ApiRequest {
        method,
        url,
        headers: record.headers.clone(),
        body: record.body.clone(),
        meta: record.meta.clone(),
    })
}
