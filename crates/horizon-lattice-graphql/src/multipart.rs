//! Multipart form bodies.

use bytes::Bytes;

use crate::error::Result;

/// Content type sent with every file part.
pub const FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// One part of a multipart form.
#[derive(Clone, Debug, PartialEq)]
pub enum Part {
    /// A plain text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// A file field.
    File {
        /// Field name.
        name: String,
        /// File name reported in the part's content disposition.
        file_name: String,
        /// File contents.
        bytes: Bytes,
    },
}

impl Part {
    /// The field name of this part.
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Multipart form data, kept in the order parts were added.
///
/// Transports turn this into a `multipart/form-data` body; the boundary and
/// the resulting content type are chosen by the multipart writer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultipartForm {
    parts: Vec<Part>,
}

impl MultipartForm {
    /// Create a new empty multipart form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field to the form.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Add a file field from bytes.
    pub fn file_bytes(
        mut self,
        name: impl Into<String>,
        bytes: impl Into<Bytes>,
        file_name: impl Into<String>,
    ) -> Self {
        self.parts.push(Part::File {
            name: name.into(),
            file_name: file_name.into(),
            bytes: bytes.into(),
        });
        self
    }

    /// The parts in order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Look up the first text field with the given name.
    pub fn text_field(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            Part::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Field names in order, for diagnostics.
    pub fn field_names(&self) -> Vec<&str> {
        self.parts.iter().map(Part::name).collect()
    }

    /// Convert to a reqwest form. File parts carry [`FILE_CONTENT_TYPE`].
    pub(crate) fn into_reqwest(self) -> Result<reqwest::multipart::Form> {
        self.parts
            .into_iter()
            .try_fold(reqwest::multipart::Form::new(), |form, part| match part {
                Part::Text { name, value } => Ok(form.text(name, value)),
                Part::File {
                    name,
                    file_name,
                    bytes,
                } => {
                    let length = bytes.len() as u64;
                    let part = reqwest::multipart::Part::stream_with_length(bytes, length)
                        .file_name(file_name)
                        .mime_str(FILE_CONTENT_TYPE)?;
                    Ok(form.part(name, part))
                }
            })
    }
}
