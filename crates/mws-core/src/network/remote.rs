//! reqwest-backed network implementation

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use super::Network;
use crate::error::Error;
use crate::request::{ApiRequest, ApiResponse};
use crate::Result;

/// Network implementation over a shared reqwest client.
#[derive(Clone)]
pub struct HttpNetwork {
    client: reqwest::Client,
}

impl HttpNetwork {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidInput(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            // bodies must arrive decoded for the mirror
            if name.eq_ignore_ascii_case("accept-encoding") {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::debug!("{} {} unreachable: {e}", request.method, request.url);
            Error::NetworkUnavailable(e.to_string())
        })?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect::<BTreeMap<_, _>>();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::NetworkUnavailable(format!("response body interrupted: {e}")))?;

        Ok(ApiResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn spawn_one_shot_server(status_line: &str, body: &str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let address = listener.local_addr().expect("local address");
        let body = body.to_string();
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut request_buffer = [0_u8; 1024];
                let _ = socket.read(&mut request_buffer).await;
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        format!("http://{address}")
    }

    #[tokio::test]
    async fn send_returns_status_headers_and_body() {
        let base = spawn_one_shot_server("200 OK", r#"[{"id":1}]"#).await;
        let network = HttpNetwork::new(Duration::from_secs(5)).unwrap();

        let response = network
            .send(ApiRequest::get(&format!("{base}/restaurants")).unwrap())
            .await
            .expect("request should succeed");

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.text(), r#"[{"id":1}]"#);
    }

    /// Answers with a gzip body whenever the client advertises gzip support.
    async fn spawn_negotiating_server(body: &str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let address = listener.local_addr().expect("local address");
        let body = body.to_string();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut request_buffer = [0_u8; 4096];
                let read = socket.read(&mut request_buffer).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&request_buffer[..read]).to_ascii_lowercase();
                let response = if request.contains("accept-encoding: gzip") {
                    let compressed = [0x1f_u8, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00];
                    let mut response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-encoding: gzip\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                        compressed.len()
                    )
                    .into_bytes();
                    response.extend_from_slice(&compressed);
                    response
                } else {
                    format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    )
                    .into_bytes()
                };
                let _ = socket.write_all(&response).await;
            }
        });

        format!("http://{address}")
    }

    #[tokio::test]
    async fn caller_encoding_preferences_are_not_forwarded() {
        let base = spawn_negotiating_server(r#"[{"id":1,"name":"A"}]"#).await;
        let network = HttpNetwork::new(Duration::from_secs(5)).unwrap();

        let request = ApiRequest::get(&format!("{base}/restaurants"))
            .unwrap()
            .with_header("Accept-Encoding", "gzip, deflate");
        let response = network.send(request).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        let restaurants: serde_json::Value = response.json().unwrap();
        assert_eq!(restaurants, serde_json::json!([{"id": 1, "name": "A"}]));
    }

    #[tokio::test]
    async fn server_errors_are_responses_not_failures() {
        let base = spawn_one_shot_server("500 Internal Server Error", "{}").await;
        let network = HttpNetwork::new(Duration::from_secs(5)).unwrap();

        let response = network
            .send(ApiRequest::get(&format!("{base}/restaurants")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn refused_connection_is_network_unavailable() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let network = HttpNetwork::new(Duration::from_secs(5)).unwrap();
        let err = network
            .send(ApiRequest::get(&format!("http://{address}/restaurants")).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NetworkUnavailable(_)));
    }
}
