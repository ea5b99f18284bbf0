//! HttpOracle - `POST {host}/is_addresses_active`, one request per batch.

use super::ActivityOracle;
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

pub const ACTIVE_PATH: &str = "/is_addresses_active";

/// One element of the oracle's response array.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressActivity {
    #[serde(default)]
    pub address: Option<String>,
    pub active: bool,
}

pub struct HttpOracle {
    http: Client,
    endpoint: String,
}

impl std::fmt::Debug for HttpOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpOracle").field("endpoint", &self.endpoint).finish_non_exhaustive()
    }
}

impl HttpOracle {
    pub fn new(host: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WalletError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self { http, endpoint: format!("{}{}", host.trim_end_matches('/'), ACTIVE_PATH) })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// `addresses[0]=..&addresses[1]=..`
fn form_fields(addresses: &[String]) -> Vec<(String, &str)> {
    addresses
        .iter()
        .enumerate()
        .map(|(i, address)| (format!("addresses[{}]", i), address.as_str()))
        .collect()
}

#[async_trait]
impl ActivityOracle for HttpOracle {
    async fn is_active(&self, addresses: &[String]) -> Result<Vec<bool>> {
        debug!(endpoint = %self.endpoint, count = addresses.len(), "Querying address activity");

        let response = self
            .http
            .post(&self.endpoint)
            .form(&form_fields(addresses))
            .send()
            .await
            .map_err(|e| {
                error!("Activity request failed: {}", e);
                WalletError::oracle(format!("transport: {}", e))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WalletError::oracle(format!("reading body: {}", e)))?;

        if status != StatusCode::OK {
            error!("Activity oracle returned {}: {}", status, body);
            return Err(WalletError::oracle(format!("status {}: {}", status, body)));
        }
        if body.trim().is_empty() {
            return Err(WalletError::oracle("empty response from activity oracle"));
        }

        let activity: Vec<AddressActivity> = serde_json::from_str(&body)
            .map_err(|e| WalletError::oracle(format!("malformed response: {}", e)))?;
        if activity.len() != addresses.len() {
            return Err(WalletError::oracle(format!(
                "asked about {} addresses, got {} answers",
                addresses.len(),
                activity.len()
            )));
        }
        Ok(activity.into_iter().map(|a| a.active).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Answers exactly one HTTP request, returns the raw request it saw.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let host = format!("http://{}", listener.local_addr().expect("addr"));
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.expect("write");
            let _ = socket.shutdown().await;
            request
        });
        (host, handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.expect("read");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn addrs(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("addr{}", i)).collect()
    }

    fn oracle(host: &str) -> HttpOracle {
        HttpOracle::new(host, Duration::from_secs(5)).expect("client")
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(oracle("https://testnet.engine.colu.co/").endpoint(), "https://testnet.engine.colu.co/is_addresses_active");
    }

    #[tokio::test]
    async fn test_batched_request_and_positional_answers() {
        let (host, server) = serve_once(
            "200 OK",
            r#"[{"address":"addr0","active":false},{"address":"addr1","active":true},{"active":false}]"#,
        )
        .await;

        let answers = oracle(&host).is_active(&addrs(3)).await.expect("answers");
        assert_eq!(answers, vec![false, true, false]);

        let request = server.await.expect("server");
        assert!(request.starts_with("POST /is_addresses_active HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/x-www-form-urlencoded"));
        assert!(request.ends_with("addresses%5B0%5D=addr0&addresses%5B1%5D=addr1&addresses%5B2%5D=addr2"));
    }

    #[tokio::test]
    async fn test_non_200_is_oracle_error() {
        let (host, _server) = serve_once("500 Internal Server Error", "boom").await;
        let err = oracle(&host).is_active(&addrs(1)).await.unwrap_err();
        assert!(matches!(err, WalletError::Oracle(ref m) if m.contains("boom")));
    }

    #[tokio::test]
    async fn test_empty_body_is_oracle_error() {
        let (host, _server) = serve_once("200 OK", "").await;
        assert!(matches!(oracle(&host).is_active(&addrs(1)).await, Err(WalletError::Oracle(_))));
    }

    #[tokio::test]
    async fn test_malformed_body_is_oracle_error() {
        let (host, _server) = serve_once("200 OK", r#"{"active":true}"#).await;
        assert!(matches!(oracle(&host).is_active(&addrs(1)).await, Err(WalletError::Oracle(_))));
    }

    #[tokio::test]
    async fn test_length_mismatch_is_oracle_error() {
        let (host, _server) = serve_once("200 OK", r#"[{"active":true}]"#).await;
        assert!(matches!(oracle(&host).is_active(&addrs(2)).await, Err(WalletError::Oracle(_))));
    }

    #[tokio::test]
    async fn test_transport_failure_is_oracle_error() {
        let err = oracle("http://127.0.0.1:1").is_active(&addrs(1)).await.unwrap_err();
        assert!(matches!(err, WalletError::Oracle(ref m) if m.starts_with("transport")));
    }
}
