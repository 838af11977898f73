//! GraphQL client implementation.

use std::sync::Arc;

use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::encoding::{
    EncodedBody, JSON_CONTENT_TYPE, encode_json, encode_multipart_form, encode_upload_spec,
};
use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::{check_response, decode_response};
use crate::transport::{HttpTransport, Transport, TransportRequest, TransportResponse};

/// Behavioral flags of a [`GraphQLClient`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Send every request as `multipart/form-data` with `query`, `variables`
    /// and one part per file. Takes precedence over
    /// `use_multipart_request_spec` when both are set.
    pub use_multipart_form: bool,
    /// Send requests carrying files per the GraphQL multipart request
    /// specification. Requests without files are sent as JSON.
    pub use_multipart_request_spec: bool,
    /// Ask the transport to close the connection after each request.
    pub close_request_body: bool,
}

/// Builder for creating a GraphQL client.
pub struct GraphQLClientBuilder {
    endpoint: String,
    transport: Option<Arc<dyn Transport>>,
    config: ClientConfig,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl GraphQLClientBuilder {
    /// Create a new builder with the specified GraphQL endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport: None,
            config: ClientConfig::default(),
            diagnostics: Arc::new(TracingSink),
        }
    }

    /// Use a custom transport instead of the default [`HttpTransport`].
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Encode every request as `multipart/form-data`, enabling file uploads.
    pub fn multipart_form(mut self) -> Self {
        self.config.use_multipart_form = true;
        self
    }

    /// Encode file uploads per the GraphQL multipart request specification.
    ///
    /// Variables cannot be combined with files in this mode; such a run fails
    /// with a configuration error.
    pub fn multipart_request_spec(mut self) -> Self {
        self.config.use_multipart_request_spec = true;
        self
    }

    /// Close the connection after each request instead of keeping it for reuse.
    pub fn close_request_body(mut self) -> Self {
        self.config.close_request_body = true;
        self
    }

    /// Replace all behavioral flags at once.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the sink that receives outgoing/incoming diagnostics.
    pub fn diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Arc::new(sink);
        self
    }

    /// Build the GraphQL client.
    pub fn build(self) -> Result<GraphQLClient> {
        url::Url::parse(&self.endpoint)?;

        if self.config.use_multipart_form && self.config.use_multipart_request_spec {
            tracing::warn!(target: "horizon_lattice_graphql::client", "Both multipart modes enabled; multipart form takes precedence");
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new()?),
        };

        Ok(GraphQLClient {
            inner: Arc::new(GraphQLClientInner {
                endpoint: self.endpoint,
                transport,
                config: self.config,
                diagnostics: self.diagnostics,
            }),
        })
    }
}

struct GraphQLClientInner {
    endpoint: String,
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    diagnostics: Arc<dyn DiagnosticSink>,
}

/// A client for a GraphQL API.
///
/// Cheap to clone and safe to share between tasks; every run owns its own
/// buffers.
///
/// # Example
///
/// ```ignore
/// use horizon_lattice_graphql::{GraphQLClient, Request};
/// use tokio_util::sync::CancellationToken;
///
/// let client = GraphQLClient::new("https://api.example.com/graphql")?;
///
/// let mut request = Request::new("query ($key: String!) { items(id: $key) { name } }")
///     .variable("key", "value");
///
/// let items: Option<Items> = client.run(&CancellationToken::new(), &mut request).await?;
/// ```
#[derive(Clone)]
pub struct GraphQLClient {
    inner: Arc<GraphQLClientInner>,
}

impl GraphQLClient {
    /// Create a client with the default transport and configuration.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        GraphQLClientBuilder::new(endpoint).build()
    }

    /// Create a new builder for configuring a GraphQL client.
    pub fn builder(endpoint: impl Into<String>) -> GraphQLClientBuilder {
        GraphQLClientBuilder::new(endpoint)
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Get the behavioral flags.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Run the request and decode the response's `data` into `T`.
    ///
    /// Returns `Ok(None)` when the server sent no data or `null`. GraphQL
    /// errors fail the call even on HTTP 200; whatever data came with them is
    /// available through [`Error::partial_data`].
    pub async fn run<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        request: &mut Request,
    ) -> Result<Option<T>> {
        let response = self.exchange(cancel, request).await?;
        decode_response(response.status, &response.body)
    }

    /// Run the request without decoding `data`; GraphQL errors still fail the call.
    pub async fn run_discarding_data(
        &self,
        cancel: &CancellationToken,
        request: &mut Request,
    ) -> Result<()> {
        let response = self.exchange(cancel, request).await?;
        check_response(response.status, &response.body)
    }

    async fn exchange(
        &self,
        cancel: &CancellationToken,
        request: &mut Request,
    ) -> Result<TransportResponse> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let config = &self.inner.config;
        if request.has_files() && !(config.use_multipart_form || config.use_multipart_request_spec)
        {
            return Err(Error::config(
                "cannot send files without a multipart encoding mode",
            ));
        }

        let encoded = self.encode(request).await?;
        self.execute(cancel, request.headers(), encoded).await
    }

    /// Pick exactly one encoder: multipart form, then upload spec (only with
    /// files), then JSON.
    async fn encode(&self, request: &mut Request) -> Result<EncodedBody> {
        let config = &self.inner.config;
        let sink = self.inner.diagnostics.as_ref();

        if config.use_multipart_form {
            encode_multipart_form(request, sink).await
        } else if config.use_multipart_request_spec && request.has_files() {
            encode_upload_spec(request, sink).await
        } else {
            encode_json(request, sink)
        }
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        caller_headers: &HeaderMap,
        encoded: EncodedBody,
    ) -> Result<TransportResponse> {
        let sink = self.inner.diagnostics.as_ref();

        let mut headers = HeaderMap::new();
        if let Some(content_type) = encoded.content_type {
            headers.insert(CONTENT_TYPE, content_type);
        }
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));
        // Appended after the protocol headers, never replacing them.
        for (name, value) in caller_headers {
            headers.append(name.clone(), value.clone());
        }
        sink.record(&Diagnostic::Headers(&headers));

        let request = TransportRequest {
            url: self.inner.endpoint.clone(),
            headers,
            body: encoded.body,
            close_connection: self.inner.config.close_request_body,
        };

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            response = self.inner.transport.post(request) => response,
        }?;

        sink.record(&Diagnostic::Response {
            status: response.status,
            body: &response.body,
        });
        Ok(response)
    }
}

impl std::fmt::Debug for GraphQLClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLClient")
            .field("endpoint", &self.inner.endpoint)
            .field("config", &self.inner.config)
            .finish()
    }
}
