//! GraphQL request types.

use std::fmt;
use std::io::Cursor;

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::{AsyncRead, AsyncReadExt};

/// A GraphQL request.
///
/// Holds the query document, its variables, any file attachments and extra
/// headers. The document is sent verbatim; nothing here parses it.
///
/// # Example
///
/// ```ignore
/// let mut request = Request::new(r#"
///     query ($key: String!) {
///         items(id: $key) { field1 field2 }
///     }
/// "#)
/// .variable("key", "value")
/// .header("Authorization", "Bearer token");
///
/// let items: Option<Items> = client.run(&cancel, &mut request).await?;
/// ```
#[derive(Debug, Default)]
pub struct Request {
    query: String,
    variables: Map<String, Value>,
    files: Vec<File>,
    headers: http::HeaderMap,
}

impl Request {
    /// Create a new request for the given query document.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set a variable value.
    ///
    /// Values that fail to serialize are dropped with a warning.
    pub fn variable(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        self.set_variable(name, value);
        self
    }

    /// Set a variable on an existing request, replacing any previous value.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Serialize) {
        let name = name.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.variables.insert(name, value);
            }
            Err(e) => {
                tracing::warn!(target: "horizon_lattice_graphql::request", "Failed to serialize variable '{}': {}", name, e);
            }
        }
    }

    /// Remove all variables.
    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }

    /// Attach a file to upload.
    ///
    /// Files are only accepted by a client built with
    /// [`multipart_form`](crate::GraphQLClientBuilder::multipart_form) or
    /// [`multipart_request_spec`](crate::GraphQLClientBuilder::multipart_request_spec).
    pub fn file(mut self, file: File) -> Self {
        self.files.push(file);
        self
    }

    /// Attach a file to an existing request.
    pub fn add_file(&mut self, file: File) {
        self.files.push(file);
    }

    /// Remove all file attachments.
    pub fn clear_files(&mut self) {
        self.files.clear();
    }

    /// Add a header. Repeated names keep every value.
    ///
    /// Invalid names or values are ignored.
    pub fn header(
        mut self,
        name: impl TryInto<http::HeaderName>,
        value: impl TryInto<http::HeaderValue>,
    ) -> Self {
        if let (Ok(name), Ok(value)) = (name.try_into(), value.try_into()) {
            self.headers.append(name, value);
        }
        self
    }

    /// Mutable access to the headers sent with this request.
    pub fn headers_mut(&mut self) -> &mut http::HeaderMap {
        &mut self.headers
    }

    /// The headers sent with this request.
    pub fn headers(&self) -> &http::HeaderMap {
        &self.headers
    }

    /// The query document.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The variables set so far.
    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    /// The attached files, in declaration order.
    pub fn files(&self) -> &[File] {
        &self.files
    }

    pub(crate) fn files_mut(&mut self) -> &mut [File] {
        &mut self.files
    }

    /// Check if any file is attached.
    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }
}

/// A file to upload.
///
/// The byte source is read to the end once per run. Re-attach a fresh source
/// before running the same request again.
pub struct File {
    field: String,
    name: String,
    reader: Box<dyn AsyncRead + Send + Unpin>,
}

impl File {
    /// Create a file from any async byte source.
    pub fn new(
        field: impl Into<String>,
        name: impl Into<String>,
        reader: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            field: field.into(),
            name: name.into(),
            reader: Box::new(reader),
        }
    }

    /// Create a file from bytes already in memory.
    pub fn from_bytes(
        field: impl Into<String>,
        name: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self::new(field, name, Cursor::new(bytes.into()))
    }

    /// The form field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The file name sent to the server.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Drain the byte source.
    pub(crate) async fn read_all(&mut self) -> std::io::Result<Bytes> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf).await?;
        Ok(Bytes::from(buf))
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("field", &self.field)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
