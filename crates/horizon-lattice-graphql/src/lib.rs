//! Low-level GraphQL client for Horizon Lattice.
//!
//! This crate submits GraphQL query and mutation documents over HTTP and
//! decodes the `{data, errors}` envelope of the response:
//!
//! - **Plain JSON** requests by default
//! - **Multipart form** requests, with file uploads, via
//!   [`GraphQLClientBuilder::multipart_form`]
//! - **GraphQL multipart request specification** uploads via
//!   [`GraphQLClientBuilder::multipart_request_spec`]
//!
//! The query document is opaque: no parsing, validation or templating.
//!
//! # Example
//!
//! ```ignore
//! use horizon_lattice_graphql::{GraphQLClient, Request};
//! use tokio_util::sync::CancellationToken;
//!
//! // Create a client (safe to share across tasks)
//! let client = GraphQLClient::new("https://api.example.com/graphql")?;
//!
//! // Build a request
//! let mut request = Request::new(r#"
//!     query ($key: String!) {
//!         items(id: $key) {
//!             field1
//!             field2
//!         }
//!     }
//! "#)
//! .variable("key", "value");
//!
//! // Run it and decode `data`
//! let data: Option<ResponseData> = client.run(&CancellationToken::new(), &mut request).await?;
//! ```
//!
//! # File uploads
//!
//! ```ignore
//! use horizon_lattice_graphql::{File, GraphQLClient, Request};
//!
//! let client = GraphQLClient::builder("https://api.example.com/graphql")
//!     .multipart_request_spec()
//!     .build()?;
//!
//! let file = tokio::fs::File::open("avatar.png").await?;
//! let mut request = Request::new("mutation ($file: Upload!) { upload(file: $file) { id } }")
//!     .file(File::new("avatar", "avatar.png", file));
//!
//! client.run_discarding_data(&cancel, &mut request).await?;
//! ```
//!
//! # Errors
//!
//! GraphQL errors returned by the server fail the call even when the HTTP
//! status is 200. They are reported as one [`Error::GraphQL`] whose message
//! joins every server message; inspect [`Error::graphql_errors`] for
//! locations, paths and extensions.

pub mod diagnostics;
mod client;
mod encoding;
mod error;
pub mod multipart;
mod request;
mod response;
pub mod transport;

pub use client::{ClientConfig, GraphQLClient, GraphQLClientBuilder};
pub use diagnostics::{Diagnostic, DiagnosticSink, NoopSink, TracingSink};
pub use error::{Error, Result};
pub use request::{File, Request};
pub use response::{GraphQLError, GraphQLErrors, GraphQLLocation, PathSegment};
pub use transport::{
    HttpTransport, HttpTransportBuilder, HttpTransportConfig, Transport, TransportBody,
    TransportRequest, TransportResponse,
};

pub use tokio_util::sync::CancellationToken;
