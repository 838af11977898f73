//! Request body encoders.
//!
//! Three wire formats are supported:
//!
//! - plain JSON: `{"query": ..., "variables": ...}`
//! - classic multipart form: `query`, `variables` and one part per file
//! - the [GraphQL multipart request specification]: `operations`, `map` and
//!   one part per file
//!
//! Each encoder returns an [`EncodedBody`] that lives only for the current
//! call; nothing is staged on the caller's [`Request`].
//!
//! [GraphQL multipart request specification]: https://github.com/jaydenseric/graphql-multipart-request-spec

use http::HeaderValue;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{Error, Result};
use crate::multipart::MultipartForm;
use crate::request::Request;
use crate::transport::TransportBody;

/// Content type of plain JSON requests; also sent as `Accept` on every request.
pub(crate) const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A serialized request body and the content type it must be sent with.
#[derive(Debug)]
pub(crate) struct EncodedBody {
    pub(crate) body: TransportBody,
    /// `None` when the transport's multipart writer picks the content type.
    pub(crate) content_type: Option<HeaderValue>,
}

#[derive(Serialize)]
struct JsonBody<'a, V: Serialize> {
    query: &'a str,
    variables: V,
}

/// Encode the request as a single JSON document.
pub(crate) fn encode_json(request: &Request, sink: &dyn DiagnosticSink) -> Result<EncodedBody> {
    let variables = (!request.variables().is_empty()).then(|| request.variables());
    let body = serde_json::to_vec(&JsonBody {
        query: request.query(),
        variables,
    })
    .map_err(Error::Encode)?;

    sink.record(&Diagnostic::Variables(request.variables()));
    sink.record(&Diagnostic::Query(request.query()));

    Ok(EncodedBody {
        body: TransportBody::Bytes(body.into()),
        content_type: Some(HeaderValue::from_static(JSON_CONTENT_TYPE)),
    })
}

/// Encode the request as a classic `multipart/form-data` body.
///
/// `variables` is only written when at least one variable is set.
pub(crate) async fn encode_multipart_form(
    request: &mut Request,
    sink: &dyn DiagnosticSink,
) -> Result<EncodedBody> {
    let mut form = MultipartForm::new().text("query", request.query());

    if !request.variables().is_empty() {
        let variables = serde_json::to_string(request.variables()).map_err(Error::Encode)?;
        form = form.text("variables", variables);
    }

    let file_count = request.files().len();
    for file in request.files_mut() {
        let bytes = file.read_all().await?;
        form = form.file_bytes(file.field(), bytes, file.name());
    }

    sink.record(&Diagnostic::Variables(request.variables()));
    sink.record(&Diagnostic::Files(file_count));
    sink.record(&Diagnostic::Query(request.query()));

    Ok(EncodedBody {
        body: TransportBody::Multipart(form),
        content_type: None,
    })
}

/// The `operations` and `map` fields of an upload-specification body.
#[derive(Debug, PartialEq)]
pub(crate) struct UploadOperations {
    pub(crate) operations: Value,
    pub(crate) map: Map<String, Value>,
}

impl UploadOperations {
    /// Build placeholders for the request's files.
    ///
    /// One file maps to `variables.file`; two or more map to
    /// `variables.files.<index>` in declaration order.
    pub(crate) fn for_request(request: &Request) -> Self {
        let files = request.files();
        let mut map = Map::new();

        let variables = match files.len() {
            0 => Value::Object(Map::new()),
            1 => {
                map.insert(
                    files[0].field().to_string(),
                    Value::from(vec!["variables.file"]),
                );
                serde_json::json!({ "file": null })
            }
            n => {
                for (index, file) in files.iter().enumerate() {
                    map.insert(
                        file.field().to_string(),
                        Value::from(vec![format!("variables.files.{index}")]),
                    );
                }
                serde_json::json!({ "files": vec![Value::Null; n] })
            }
        };

        Self {
            operations: serde_json::json!({
                "query": request.query(),
                "variables": variables,
            }),
            map,
        }
    }
}

/// Encode the request per the GraphQL multipart request specification.
///
/// Variables cannot be expressed next to the file placeholders, so a request
/// carrying both is rejected before anything is read.
pub(crate) async fn encode_upload_spec(
    request: &mut Request,
    sink: &dyn DiagnosticSink,
) -> Result<EncodedBody> {
    if !request.variables().is_empty() {
        return Err(Error::config(
            "variables are not supported together with files in multipart request spec mode",
        ));
    }

    let UploadOperations { operations, map } = UploadOperations::for_request(request);
    let operations = serde_json::to_string(&operations).map_err(Error::Encode)?;
    let map = serde_json::to_string(&map).map_err(Error::Encode)?;

    sink.record(&Diagnostic::Field {
        name: "operations",
        value: &operations,
    });
    sink.record(&Diagnostic::Field {
        name: "map",
        value: &map,
    });

    let mut form = MultipartForm::new()
        .text("operations", operations)
        .text("map", map);

    for file in request.files_mut() {
        let bytes = file.read_all().await?;
        form = form.file_bytes(file.field(), bytes, file.name());

        // Simpler multipart servers look for `<field>=@<filename>`.
        let legacy_value = format!("@{}", file.name());
        sink.record(&Diagnostic::Field {
            name: file.field(),
            value: &legacy_value,
        });
        form = form.text(file.field(), legacy_value);
    }

    Ok(EncodedBody {
        body: TransportBody::Multipart(form),
        content_type: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NoopSink;
    use crate::multipart::Part;
    use crate::request::File;
    use serde_json::json;

    fn json_of(encoded: &EncodedBody) -> Value {
        match &encoded.body {
            TransportBody::Bytes(bytes) => serde_json::from_slice(bytes).unwrap(),
            other => panic!("expected bytes body, got {other:?}"),
        }
    }

    fn form_of(encoded: EncodedBody) -> MultipartForm {
        match encoded.body {
            TransportBody::Multipart(form) => form,
            other => panic!("expected multipart body, got {other:?}"),
        }
    }

    #[test]
    fn test_json_without_variables_sends_null() {
        let request = Request::new("{ a }");
        let encoded = encode_json(&request, &NoopSink).unwrap();
        assert_eq!(json_of(&encoded), json!({"query": "{ a }", "variables": null}));
        assert_eq!(encoded.content_type.unwrap(), JSON_CONTENT_TYPE);
    }

    #[test]
    fn test_json_with_variables() {
        let request = Request::new("query($id: ID!) { a(id: $id) }").variable("id", 5);
        let encoded = encode_json(&request, &NoopSink).unwrap();
        assert_eq!(
            json_of(&encoded),
            json!({"query": "query($id: ID!) { a(id: $id) }", "variables": {"id": 5}})
        );
    }

    #[tokio::test]
    async fn test_multipart_form_without_variables_or_files() {
        let mut request = Request::new("{ a }");
        let form = form_of(encode_multipart_form(&mut request, &NoopSink).await.unwrap());
        assert_eq!(form.field_names(), vec!["query"]);
        assert_eq!(form.text_field("query"), Some("{ a }"));
    }

    #[tokio::test]
    async fn test_multipart_form_with_variables_and_files() {
        let mut request = Request::new("mutation { upload }")
            .variable("name", "report")
            .file(File::from_bytes("doc", "report.txt", "hello"));
        let encoded = encode_multipart_form(&mut request, &NoopSink).await.unwrap();
        assert!(encoded.content_type.is_none());

        let form = form_of(encoded);
        assert_eq!(form.field_names(), vec!["query", "variables", "doc"]);
        let variables: Value = serde_json::from_str(form.text_field("variables").unwrap()).unwrap();
        assert_eq!(variables, json!({"name": "report"}));
        assert_eq!(
            form.parts()[2],
            Part::File {
                name: "doc".into(),
                file_name: "report.txt".into(),
                bytes: "hello".into(),
            }
        );
    }

    #[test]
    fn test_upload_operations_single_file() {
        let request = Request::new("mutation($file: Upload!) { upload(file: $file) }")
            .file(File::from_bytes("upload", "a.txt", "a"));
        let ops = UploadOperations::for_request(&request);
        assert_eq!(
            ops.operations,
            json!({
                "query": "mutation($file: Upload!) { upload(file: $file) }",
                "variables": {"file": null},
            })
        );
        assert_eq!(Value::Object(ops.map), json!({"upload": ["variables.file"]}));
    }

    #[test]
    fn test_upload_operations_many_files_keep_declaration_order() {
        let request = Request::new("mutation { upload }")
            .file(File::from_bytes("c", "c.txt", "c"))
            .file(File::from_bytes("a", "a.txt", "a"))
            .file(File::from_bytes("b", "b.txt", "b"));
        let ops = UploadOperations::for_request(&request);
        assert_eq!(ops.operations["variables"], json!({"files": [null, null, null]}));

        let entries: Vec<(&str, &Value)> = ops.map.iter().map(|(k, v)| (k.as_str(), v)).collect();
        assert_eq!(
            entries,
            vec![
                ("c", &json!(["variables.files.0"])),
                ("a", &json!(["variables.files.1"])),
                ("b", &json!(["variables.files.2"])),
            ]
        );
    }

    #[test]
    fn test_upload_operations_repeated_field_names() {
        let request = Request::new("mutation { upload }")
            .file(File::from_bytes("upload", "a.txt", "a"))
            .file(File::from_bytes("upload", "b.txt", "b"));
        let ops = UploadOperations::for_request(&request);
        assert_eq!(ops.operations["variables"], json!({"files": [null, null]}));
        assert_eq!(Value::Object(ops.map), json!({"upload": ["variables.files.1"]}));
    }

    #[tokio::test]
    async fn test_upload_spec_body_layout() {
        let mut request = Request::new("mutation { upload }")
            .file(File::from_bytes("first", "1.txt", "one"))
            .file(File::from_bytes("second", "2.txt", "two"));
        let form = form_of(encode_upload_spec(&mut request, &NoopSink).await.unwrap());

        assert_eq!(
            form.field_names(),
            vec!["operations", "map", "first", "first", "second", "second"]
        );
        let map: Value = serde_json::from_str(form.text_field("map").unwrap()).unwrap();
        assert_eq!(
            map,
            json!({"first": ["variables.files.0"], "second": ["variables.files.1"]})
        );
        assert_eq!(form.text_field("first"), Some("@1.txt"));
        assert_eq!(form.text_field("second"), Some("@2.txt"));
        assert!(matches!(&form.parts()[4], Part::File { bytes, .. } if bytes == "two"));
    }

    #[tokio::test]
    async fn test_upload_spec_rejects_variables() {
        let mut request = Request::new("mutation { upload }")
            .variable("x", 1)
            .file(File::from_bytes("upload", "a.txt", "a"));
        let err = encode_upload_spec(&mut request, &NoopSink).await.unwrap_err();
        assert!(err.is_config());
    }
}
