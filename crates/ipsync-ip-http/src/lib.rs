// # HTTP IP Source
//
// This crate provides the HTTP IP-echo source for ipsync.
//
// ## Purpose
//
// Asks an external "what is my IP" service which public address the
// request came from. The service answers with the address as plain text.
//
// ## Connection Reuse
//
// Every fetch builds a new client with idle pooling disabled and sends
// `Connection: close`. Each observation therefore leaves over a fresh
// outbound connection, which is what lets hosts behind rotating NAT or
// several egress links see more than one address.

use ipsync_core::config::DEFAULT_IP_ECHO_URL;
use ipsync_core::traits::IpSource;
use ipsync_core::{Error, Result};

use reqwest::header::CONNECTION;

/// HTTP-based IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch IP from
    url: String,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: IP-echo endpoint returning the caller's address as plain text
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// The endpoint this source queries
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Build a client that never keeps a connection around
    fn fresh_client() -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| Error::network(format!("Failed to build HTTP client: {}", e)))
    }
}

impl Default for HttpIpSource {
    fn default() -> Self {
        Self::new(DEFAULT_IP_ECHO_URL)
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn fetch(&self) -> Result<String> {
        let response = Self::fresh_client()?
            .get(&self.url)
            .header(CONNECTION, "close")
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::http(format!(
                "{} returned {}",
                self.url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;

        let ip = body.trim().to_string();
        tracing::debug!("{} reports {}", self.url, ip);
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_trimmed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.7\n"))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpIpSource::new(format!("{}/ip", server.uri()));

        assert_eq!(source.fetch().await.unwrap(), "203.0.113.7");
    }

    #[tokio::test]
    async fn each_fetch_is_a_separate_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.7"))
            .expect(3)
            .mount(&server)
            .await;

        let source = HttpIpSource::new(server.uri());
        for _ in 0..3 {
            source.fetch().await.unwrap();
        }
    }

    #[tokio::test]
    async fn error_status_is_a_failed_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        let source = HttpIpSource::new(server.uri());

        assert!(matches!(source.fetch().await, Err(Error::Http(_))));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_network_error() {
        let source = HttpIpSource::new("http://127.0.0.1:1/ip");

        assert!(matches!(source.fetch().await, Err(Error::Network(_))));
    }

    #[test]
    fn default_uses_public_echo_service() {
        let source = HttpIpSource::default();
        assert_eq!(source.url(), "https://ip.3322.net");
        assert_eq!(source.source_name(), "http");
    }
}
