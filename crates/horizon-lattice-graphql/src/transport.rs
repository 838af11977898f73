//! HTTP transport used to exchange GraphQL requests.
//!
//! The client only needs one capability from the network: POST a body with
//! some headers and hand back the status and the full response body. That is
//! the [`Transport`] trait. [`HttpTransport`] implements it on top of
//! `reqwest`; connection pooling, TLS, proxies and timeouts live there.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Error, Result};
use crate::multipart::MultipartForm;

/// Body of an outgoing request.
#[derive(Clone, Debug, PartialEq)]
pub enum TransportBody {
    /// Raw bytes; the content type is already in the headers.
    Bytes(Bytes),
    /// A multipart form; the transport generates the boundary and content type.
    Multipart(MultipartForm),
}

/// A POST request ready to be sent.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    /// Target URL.
    pub url: String,
    /// Request headers.
    pub headers: http::HeaderMap,
    /// Request body.
    pub body: TransportBody,
    /// Ask the transport not to keep the connection for reuse.
    pub close_connection: bool,
}

/// A fully buffered response.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
}

/// Sends GraphQL POST requests.
///
/// Implementations must be safe to share between concurrent calls. A non-2xx
/// status is a normal response, not an error; errors are reserved for
/// failures to complete the exchange. Dropping the returned future should
/// abort the request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one POST request and buffer the response.
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse> {
        (**self).post(request).await
    }
}

/// Configuration for the HTTP transport.
#[derive(Clone, Debug)]
pub struct HttpTransportConfig {
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Default user agent.
    pub user_agent: Option<String>,
    /// Proxy URL.
    pub proxy: Option<String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: Some(Duration::from_secs(10)),
            user_agent: Some(format!(
                "HorizonLatticeGraphQL/{} (Rust)",
                env!("CARGO_PKG_VERSION")
            )),
            proxy: None,
        }
    }
}

/// Builder for creating an HTTP transport with custom configuration.
pub struct HttpTransportBuilder {
    config: HttpTransportConfig,
    default_headers: http::HeaderMap,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransportBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: HttpTransportConfig::default(),
            default_headers: http::HeaderMap::new(),
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Set a proxy URL.
    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.config.proxy = Some(proxy_url.into());
        self
    }

    /// Add a default header that will be sent with every request.
    pub fn default_header(
        mut self,
        name: impl TryInto<http::HeaderName>,
        value: impl TryInto<http::HeaderValue>,
    ) -> Result<Self> {
        let name = name
            .try_into()
            .map_err(|_| Error::InvalidHeader("Invalid header name".to_string()))?;
        let value = value
            .try_into()
            .map_err(|_| Error::InvalidHeader("Invalid header value".to_string()))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Build the HTTP transport.
    pub fn build(self) -> Result<HttpTransport> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = self.config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        if let Some(ref ua) = self.config.user_agent {
            builder = builder.user_agent(ua);
        }

        if let Some(ref proxy_url) = self.config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| Error::config(format!("invalid proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }

        builder = builder.default_headers(self.default_headers);

        let client = builder.build()?;

        Ok(HttpTransport {
            inner: Arc::new(HttpTransportInner {
                client,
                config: self.config,
            }),
        })
    }
}

struct HttpTransportInner {
    client: reqwest::Client,
    config: HttpTransportConfig,
}

/// A `reqwest`-backed transport.
///
/// Cheaply cloneable; clones share the same connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    inner: Arc<HttpTransportInner>,
}

impl HttpTransport {
    /// Create a transport with default configuration.
    pub fn new() -> Result<Self> {
        HttpTransportBuilder::new().build()
    }

    /// Create a builder for configuring a new transport.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Get the transport's configuration.
    pub fn config(&self) -> &HttpTransportConfig {
        &self.inner.config
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse> {
        let req_builder = self.inner.client.post(&request.url);

        // The body goes on first so a multipart content type precedes any
        // header value appended by the caller.
        let mut req_builder = match request.body {
            TransportBody::Bytes(bytes) => req_builder.body(bytes),
            TransportBody::Multipart(form) => req_builder.multipart(form.into_reqwest()?),
        };

        for (name, value) in request.headers.iter() {
            req_builder = req_builder.header(name, value);
        }
        if request.close_connection {
            req_builder = req_builder.header(http::header::CONNECTION, "close");
        }

        let response = req_builder.send().await?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::BodyRead(e.to_string()))?;

        tracing::trace!(target: "horizon_lattice_graphql::transport", url = %request.url, status, bytes = body.len(), "exchange complete");

        Ok(TransportResponse { status, body })
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("config", &self.inner.config)
            .finish()
    }
}
