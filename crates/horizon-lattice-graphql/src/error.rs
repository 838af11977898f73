//! Error types for the GraphQL client.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::response::GraphQLErrors;

/// Errors that can occur while running a GraphQL operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The cancellation token fired before or during the exchange.
    #[error("graphql: operation cancelled")]
    Cancelled,

    /// The client configuration cannot encode this request.
    #[error("graphql: {0}")]
    Config(String),

    /// The transport failed to complete the exchange.
    #[error("graphql: transport error: {0}")]
    Transport(String),

    /// The response body could not be read.
    #[error("graphql: reading body: {0}")]
    BodyRead(String),

    /// The request body could not be serialized.
    #[error("graphql: encode body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response body is not a valid GraphQL envelope.
    #[error("graphql: decoding response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The server answered with a non-200 status and a body that did not decode.
    #[error("graphql: server returned a non-200 status code: {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// Reading a file attachment failed.
    #[error("graphql: preparing file: {0}")]
    Io(#[from] std::io::Error),

    /// The endpoint is not a valid absolute URL.
    #[error("graphql: invalid endpoint: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header name or value could not be used.
    #[error("graphql: invalid header: {0}")]
    InvalidHeader(String),

    /// The server returned one or more GraphQL errors.
    #[error("{errors}")]
    GraphQL {
        /// Errors in the order the server reported them.
        errors: GraphQLErrors,
        /// Whatever `data` the server sent alongside the errors.
        data: Option<Value>,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this error is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this error was raised before any network call because of configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// The HTTP status code, for non-200 decode failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            _ => None,
        }
    }

    /// The server-reported GraphQL errors, if that is what failed the call.
    pub fn graphql_errors(&self) -> Option<&GraphQLErrors> {
        match self {
            Self::GraphQL { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// Decode the partial `data` returned alongside GraphQL errors.
    ///
    /// Returns `Ok(None)` for other error kinds or when the server sent no data.
    pub fn partial_data<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match self {
            Self::GraphQL {
                data: Some(data), ..
            } if !data.is_null() => serde_json::from_value(data.clone())
                .map(Some)
                .map_err(Error::Decode),
            _ => Ok(None),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

/// A specialized Result type for GraphQL operations.
pub type Result<T> = std::result::Result<T, Error>;
