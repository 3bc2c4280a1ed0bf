//! Remote delivery of a single event.

use crate::{OutboundEvent, SendResponse, TransportError};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Header carrying the event id alongside the JSON body.
const EVENT_ID_HEADER: &str = "X-Event-Id";

/// Delivers one event to the remote collector.
///
/// Implementations must bound their own latency: a send that cannot complete
/// should resolve to an error or a failed response, never hang. They should
/// not retry internally; retries are the replay path's job.
#[async_trait]
pub trait RemoteSender: Send + Sync {
    /// Attempt delivery of `event` once.
    async fn send(&self, event: &OutboundEvent) -> Result<SendResponse, TransportError>;
}

/// Thread-safe handle to a remote sender.
pub type SenderHandle = Arc<dyn RemoteSender>;

/// HTTP sender configuration.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Collector endpoint that accepts one JSON event per POST.
    pub collector_url: String,
    /// Optional Authorization header value.
    pub auth_header: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            collector_url: "http://localhost:8080/api/events".to_string(),
            auth_header: None,
            timeout_secs: 30,
        }
    }
}

/// [`RemoteSender`] that POSTs the event payload as JSON.
pub struct HttpSender {
    config: SenderConfig,
    client: Client,
}

impl HttpSender {
    /// Create a new HTTP sender.
    pub fn new(config: SenderConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl RemoteSender for HttpSender {
    async fn send(&self, event: &OutboundEvent) -> Result<SendResponse, TransportError> {
        debug!(
            url = %self.config.collector_url,
            event_id = %event.event_id,
            replay = event.is_replay,
            "Sending event"
        );

        let mut request = self
            .client
            .post(&self.config.collector_url)
            .header(EVENT_ID_HEADER, &event.event_id)
            .json(&event.payload);

        if let Some(auth) = &self.config.auth_header {
            request = request.header(AUTHORIZATION, auth);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(SendResponse::delivered(Some(status.as_u16())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn header_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n")
    }

    /// Accept one connection, read the full request, answer with `status`.
    async fn serve_once(status: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];

            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);

                if let Some(end) = header_end(&buf) {
                    let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                    let body_len = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + body_len {
                        break;
                    }
                }
            }

            let body = "ok";
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&buf).to_string()
        });

        (format!("http://{}/api/events", addr), handle)
    }

    fn sender_for(url: String, auth_header: Option<&str>) -> HttpSender {
        HttpSender::new(SenderConfig {
            collector_url: url,
            auth_header: auth_header.map(str::to_string),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_sender_config_default() {
        let config = SenderConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert!(config.auth_header.is_none());
        assert_eq!(
            config.collector_url,
            "http://localhost:8080/api/events"
        );
    }

    #[tokio::test]
    async fn test_success_status_is_delivered() {
        let (url, server) = serve_once("202 Accepted").await;
        let sender = sender_for(url, Some("Bearer secret"));

        let event = OutboundEvent::fresh("E1", json!({"msg": "a"}));
        let response = sender.send(&event).await.unwrap();

        assert!(response.is_delivered());
        assert_eq!(response.status_code, Some(202));

        let request = server.await.unwrap();
        let lower = request.to_lowercase();
        assert!(request.starts_with("POST /api/events"));
        assert!(lower.contains("x-event-id: e1"));
        assert!(lower.contains("authorization: bearer secret"));
        assert!(request.contains(r#"{"msg":"a"}"#));
    }

    #[tokio::test]
    async fn test_error_status_is_transport_error() {
        let (url, server) = serve_once("503 Service Unavailable").await;
        let sender = sender_for(url, None);

        let event = OutboundEvent::fresh("E1", json!({}));
        let err = sender.send(&event).await.unwrap_err();

        assert!(matches!(err, TransportError::Status { status: 503, ref body } if body == "ok"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sender = sender_for(format!("http://{}/api/events", addr), None);
        let err = sender
            .send(&OutboundEvent::fresh("E1", json!({})))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Http(_)));
    }

    #[tokio::test]
    async fn test_unresponsive_collector_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let sender = HttpSender::new(SenderConfig {
            collector_url: format!("http://{}/api/events", addr),
            auth_header: None,
            timeout_secs: 1,
        })
        .unwrap();

        let err = sender
            .send(&OutboundEvent::fresh("E1", json!({})))
            .await
            .unwrap_err();

        match err {
            TransportError::Http(e) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got {other:?}"),
        }
        server.abort();
    }
}
