//! GraphQL response types.

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Error, Result};

/// A GraphQL error returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    /// The error message. Empty when the server omitted it.
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,

    /// Locations in the document where the error occurred.
    #[serde(default, deserialize_with = "null_as_default")]
    pub locations: Vec<GraphQLLocation>,

    /// Path to the field that caused the error.
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: Vec<PathSegment>,

    /// Additional error metadata.
    #[serde(default, deserialize_with = "null_as_default")]
    pub extensions: Map<String, Value>,
}

impl GraphQLError {
    /// Create an error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions: Map::new(),
        }
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graphql: {}", self.message)
    }
}

impl std::error::Error for GraphQLError {}

/// A location in a GraphQL document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQLLocation {
    /// Line number (1-indexed), 0 if missing.
    #[serde(default)]
    pub line: u32,
    /// Column number (1-indexed), 0 if missing.
    #[serde(default)]
    pub column: u32,
}

/// A segment in an error path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A field name.
    Field(String),
    /// A list index.
    Index(u64),
    /// Anything else a server put in the path, kept as sent.
    Other(Value),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{name}"),
            Self::Index(idx) => write!(f, "{idx}"),
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

/// The list of GraphQL errors a server returned for one operation.
///
/// Rendered as a single failure: member messages joined with ` | `, in the
/// order the server sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphQLErrors(Vec<GraphQLError>);

impl GraphQLErrors {
    /// The individual errors.
    pub fn errors(&self) -> &[GraphQLError] {
        &self.0
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the server reported no errors.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first error, if any.
    pub fn first(&self) -> Option<&GraphQLError> {
        self.0.first()
    }

    /// Iterate over the errors in server order.
    pub fn iter(&self) -> std::slice::Iter<'_, GraphQLError> {
        self.0.iter()
    }

    /// Consume into the underlying vector.
    pub fn into_vec(self) -> Vec<GraphQLError> {
        self.0
    }
}

impl From<Vec<GraphQLError>> for GraphQLErrors {
    fn from(errors: Vec<GraphQLError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for GraphQLErrors {
    type Item = GraphQLError;
    type IntoIter = std::vec::IntoIter<GraphQLError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a GraphQLErrors {
    type Item = &'a GraphQLError;
    type IntoIter = std::slice::Iter<'a, GraphQLError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for GraphQLErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "no error");
        }
        write!(f, "graphql: ")?;
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for GraphQLErrors {}

/// The `{data, errors}` envelope of every GraphQL response.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphResponse {
    #[serde(default)]
    pub(crate) data: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) errors: GraphQLErrors,
}

impl GraphResponse {
    /// Parse a buffered body received with `status`.
    pub(crate) fn parse(status: u16, body: &[u8]) -> Result<Self> {
        decode_or_status(status, serde_json::from_slice(body))
    }

    /// Fail with the GraphQL errors if there are any, otherwise yield `data`.
    pub(crate) fn into_data(self) -> Result<Option<Value>> {
        if self.errors.is_empty() {
            Ok(self.data)
        } else {
            Err(Error::GraphQL {
                errors: self.errors,
                data: self.data,
            })
        }
    }
}

/// Decode a response body into the caller's data type.
///
/// `data` that is absent or `null` yields `Ok(None)`.
pub(crate) fn decode_response<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<Option<T>> {
    match GraphResponse::parse(status, body)?.into_data()? {
        None | Some(Value::Null) => Ok(None),
        Some(data) => decode_or_status(status, serde_json::from_value(data)).map(Some),
    }
}

/// Decode a response body, only surfacing errors.
pub(crate) fn check_response(status: u16, body: &[u8]) -> Result<()> {
    GraphResponse::parse(status, body)?.into_data().map(|_| ())
}

/// A decode failure on a non-200 response is reported as a status error so the
/// HTTP failure is not hidden behind a JSON error.
fn decode_or_status<T>(status: u16, decoded: serde_json::Result<T>) -> Result<T> {
    decoded.map_err(|err| {
        if status != 200 {
            Error::Status { status }
        } else {
            Error::Decode(err)
        }
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
