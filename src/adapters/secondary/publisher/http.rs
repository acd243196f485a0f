/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! HTTP data publisher for sending reports to the inventory server

use crate::domain::{PublishError, PublishTarget};
use crate::ports::DataPublisher;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

/// `User-Agent` sent with every report
pub const AGENT_USER_AGENT: &str = concat!("donpedro/", env!("CARGO_PKG_VERSION"));

/// HTTP data publisher that POSTs report payloads
pub struct HttpDataPublisher {
    client: Client,
}

impl HttpDataPublisher {
    /// Create a new HTTP data publisher
    ///
    /// # Arguments
    /// * `timeout` - HTTP request timeout
    /// * `skip_tls_verify` - Whether to skip TLS certificate verification
    pub fn new(timeout: Duration, skip_tls_verify: bool) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(skip_tls_verify)
            .build()
            .map_err(|e| PublishError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Create with default settings
    pub fn with_defaults() -> Result<Self, PublishError> {
        Self::new(Duration::from_secs(30), false)
    }
}

#[async_trait]
impl DataPublisher for HttpDataPublisher {
    async fn publish(&self, payload: &str, target: &PublishTarget) -> Result<(), PublishError> {
        if target.base_url.trim().is_empty() {
            return Err(PublishError::InvalidTarget(
                "No base URL provided".to_string(),
            ));
        }

        let response = self
            .client
            .post(target.endpoint())
            .query(&target.query())
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, AGENT_USER_AGENT)
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| PublishError::Transport(format!("Failed to send request: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(PublishError::Rejected {
            status: status.as_u16(),
            body: body.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer one request with `status_line` and `body`; yields the raw request
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (base_url, handle)
    }

    fn target(base_url: String) -> PublishTarget {
        PublishTarget {
            base_url,
            path: "/api/v0.9/windowsdevice".to_string(),
            username: "agent".to_string(),
            api_key: "0123abcd".to_string(),
        }
    }

    #[tokio::test]
    async fn test_http_publisher_creation() {
        let publisher = HttpDataPublisher::with_defaults();
        assert!(publisher.is_ok());
    }

    #[test]
    fn test_user_agent_names_agent_and_version() {
        assert!(AGENT_USER_AGENT.starts_with("donpedro/"));
        assert!(AGENT_USER_AGENT.len() > "donpedro/".len());
    }

    #[tokio::test]
    async fn test_empty_base_url_error() {
        let publisher = HttpDataPublisher::with_defaults().unwrap();
        let target = PublishTarget::default();

        let result = publisher.publish("{}", &target).await;
        assert!(matches!(result.unwrap_err(), PublishError::InvalidTarget(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let publisher = HttpDataPublisher::new(Duration::from_secs(2), false).unwrap();
        let target = PublishTarget {
            base_url: "http://127.0.0.1:9".to_string(),
            path: "api".to_string(),
            ..Default::default()
        };

        let result = publisher.publish("{}", &target).await;
        assert!(matches!(result.unwrap_err(), PublishError::Transport(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_rejected_with_body() {
        let (base_url, server) =
            serve_once("HTTP/1.1 500 Internal Server Error", "database locked").await;
        let publisher = HttpDataPublisher::new(Duration::from_secs(5), false).unwrap();

        let err = publisher
            .publish(r#"{"data":{}}"#, &target(base_url))
            .await
            .unwrap_err();

        match &err {
            PublishError::Rejected { status, body } => {
                assert_eq!(*status, 500);
                assert_eq!(body, "database locked");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.server_body(), Some("database locked"));

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap_or_default();
        assert_eq!(
            request_line,
            "POST /api/v0.9/windowsdevice/?username=agent&api_key=0123abcd HTTP/1.1"
        );
        assert!(request.ends_with(r#"{"data":{}}"#));
    }

    #[tokio::test]
    async fn test_created_response_is_success() {
        let (base_url, server) = serve_once("HTTP/1.1 201 Created", "").await;
        let publisher = HttpDataPublisher::new(Duration::from_secs(5), false).unwrap();

        publisher.publish("{}", &target(base_url)).await.unwrap();

        let request = server.await.unwrap().to_lowercase();
        assert!(request.contains("content-type: application/json"));
        assert!(request.contains("user-agent: donpedro/"));
    }
}
