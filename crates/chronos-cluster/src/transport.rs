//! HTTP transport capability.
//!
//! The cluster never issues requests on its own behalf except for the
//! liveness probe. Both the probe and the request-issuing layer go
//! through the [`Transport`] trait so the exchange can be swapped out.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use http::Method;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = concat!("chronos-client/", env!("CARGO_PKG_VERSION"));

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A single outgoing HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to complete an HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("tls setup failed: {0}")]
    Tls(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to read response body: {0}")]
    Body(String),
}

impl TransportError {
    /// Whether the endpoint could not be reached at all.
    ///
    /// Only these failures should demote a cluster member.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, TransportError::Connect(_) | TransportError::Timeout(_))
    }
}

/// "Send one HTTP request, get back a status and body."
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>>;
}

/// Production transport backed by a pooled hyper client.
///
/// Speaks plain HTTP and HTTPS (rustls with the Mozilla root store) and
/// applies one timeout to the whole exchange, body included.
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    timeout: Duration,
}

impl HyperTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let tls = rustls::ClientConfig::builder_with_provider(
            rustls::crypto::ring::default_provider().into(),
        )
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::Tls(format!("tls protocol version error: {e}")))?
        .with_root_certificates(root_store)
        .with_no_client_auth();

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls)
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn exchange(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = http::Request::builder()
            .method(request.method)
            .uri(request.url.as_str())
            .header("user-agent", USER_AGENT);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let body = Full::new(Bytes::from(request.body.unwrap_or_default()));
        let req = builder
            .body(body)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let resp = self
            .client
            .request(req)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = resp.status().as_u16();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?
            .to_bytes();

        Ok(HttpResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        Box::pin(async move {
            let url = request.url.clone();
            match tokio::time::timeout(self.timeout, self.exchange(request)).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(%url, timeout = ?self.timeout, "http request timed out");
                    Err(TransportError::Timeout(self.timeout))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_collects_headers_and_body() {
        let req = HttpRequest::new(Method::POST, "http://a:1/scheduler/iso8601")
            .with_header("content-type", "application/json")
            .with_body("{}");
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.body.as_deref(), Some("{}"));
    }

    #[test]
    fn response_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }

    #[test]
    fn only_connect_and_timeout_are_unreachable() {
        assert!(TransportError::Connect("refused".into()).is_unreachable());
        assert!(TransportError::Timeout(Duration::from_secs(1)).is_unreachable());
        assert!(!TransportError::Body("eof".into()).is_unreachable());
        assert!(!TransportError::InvalidRequest("uri".into()).is_unreachable());
    }

    #[tokio::test]
    async fn closed_port_is_a_connect_failure() {
        let transport = HyperTransport::new(Duration::from_millis(500)).unwrap();
        let err = transport
            .send(HttpRequest::get("http://127.0.0.1:1/ping"))
            .await
            .unwrap_err();
        assert!(err.is_unreachable(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn malformed_url_is_an_invalid_request() {
        let transport = HyperTransport::new(Duration::from_millis(500)).unwrap();
        let err = transport
            .send(HttpRequest::get("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }
}
