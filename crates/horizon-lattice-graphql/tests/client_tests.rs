//! Integration tests for the GraphQL client against a mock HTTP server.

use std::io::Write;

use horizon_lattice_graphql::{CancellationToken, File, GraphQLClient, Request};
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize, PartialEq)]
struct ItemData {
    item: Item,
}

fn endpoint(server: &MockServer) -> String {
    format!("{}/graphql", server.uri())
}

async fn received_body(server: &MockServer) -> String {
    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    String::from_utf8_lossy(&requests[0].body).into_owned()
}

async fn received_content_type(server: &MockServer) -> String {
    let requests = server.received_requests().await.expect("recording enabled");
    requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_json_query_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("Content-Type", "application/json; charset=utf-8"))
        .and(header("Accept", "application/json; charset=utf-8"))
        .and(header("X-Request-Id", "abc-123"))
        .and(body_json(json!({
            "query": "query ($key: String!) { item(id: $key) { id name } }",
            "variables": {"key": "value"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"item": {"id": "1", "name": "Widget"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphQLClient::new(endpoint(&server)).unwrap();
    let mut request = Request::new("query ($key: String!) { item(id: $key) { id name } }")
        .variable("key", "value")
        .header("X-Request-Id", "abc-123");

    let data: Option<ItemData> = client
        .run(&CancellationToken::new(), &mut request)
        .await
        .unwrap();

    assert_eq!(
        data,
        Some(ItemData {
            item: Item {
                id: "1".into(),
                name: "Widget".into(),
            }
        })
    );
}

#[tokio::test]
async fn test_query_without_variables_sends_null() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_json(json!({"query": "{ ping }", "variables": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"ping": true}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphQLClient::new(endpoint(&server)).unwrap();
    client
        .run_discarding_data(&CancellationToken::new(), &mut Request::new("{ ping }"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_graphql_errors_with_partial_data() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"item": {"id": "1", "name": "Widget"}},
            "errors": [
                {"message": "miss", "path": ["item", "price"]},
                {"message": "also miss", "locations": [{"line": 1, "column": 3}]}
            ]
        })))
        .mount(&server)
        .await;

    let client = GraphQLClient::new(endpoint(&server)).unwrap();
    let err = client
        .run::<ItemData>(&CancellationToken::new(), &mut Request::new("{ item { id name price } }"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "graphql: miss | also miss");
    let errors = err.graphql_errors().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors.errors()[1].locations[0].column, 3);

    let partial: Option<ItemData> = err.partial_data().unwrap();
    assert_eq!(partial.unwrap().item.name, "Widget");
}

#[tokio::test]
async fn test_non_200_with_html_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let client = GraphQLClient::new(endpoint(&server)).unwrap();
    let err = client
        .run::<ItemData>(&CancellationToken::new(), &mut Request::new("{ item { id } }"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(502));
    assert_eq!(
        err.to_string(),
        "graphql: server returned a non-200 status code: 502"
    );
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Nothing listens on port 1.
    let client = GraphQLClient::new("http://127.0.0.1:1/graphql").unwrap();
    let err = client
        .run::<ItemData>(&CancellationToken::new(), &mut Request::new("{ item { id } }"))
        .await
        .unwrap_err();

    assert!(matches!(err, horizon_lattice_graphql::Error::Transport(_)));
}

#[tokio::test]
async fn test_multipart_form_upload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"ok": true}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphQLClient::builder(endpoint(&server))
        .multipart_form()
        .build()
        .unwrap();
    let mut request = Request::new("mutation ($name: String!) { upload(name: $name) }")
        .variable("name", "greeting")
        .file(File::from_bytes("document", "hello.txt", "hello world"));

    client
        .run_discarding_data(&CancellationToken::new(), &mut request)
        .await
        .unwrap();

    assert!(received_content_type(&server)
        .await
        .starts_with("multipart/form-data; boundary="));
    let body = received_body(&server).await;
    assert!(body.contains(r#"name="query""#));
    assert!(body.contains(r#"name="variables""#));
    assert!(body.contains(r#"{"name":"greeting"}"#));
    assert!(body.contains(r#"name="document"; filename="hello.txt""#));
    assert!(body
        .to_ascii_lowercase()
        .contains("content-type: application/octet-stream"));
    assert!(body.contains("hello world"));
}

#[tokio::test]
async fn test_request_spec_upload_from_disk() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"upload": "1"}})))
        .expect(1)
        .mount(&server)
        .await;

    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(b"file on disk").unwrap();
    let source = tokio::fs::File::open(tmp.path()).await.unwrap();

    let client = GraphQLClient::builder(endpoint(&server))
        .multipart_request_spec()
        .build()
        .unwrap();
    let mut request = Request::new("mutation ($file: Upload!) { upload(file: $file) }")
        .file(File::new("upload", "disk.txt", source));

    client
        .run_discarding_data(&CancellationToken::new(), &mut request)
        .await
        .unwrap();

    let body = received_body(&server).await;
    assert!(body.contains(r#"name="operations""#));
    assert!(body.contains(r#""variables":{"file":null}"#));
    assert!(body.contains(r#"{"upload":["variables.file"]}"#));
    assert!(body.contains(r#"name="upload"; filename="disk.txt""#));
    assert_eq!(
        body.to_ascii_lowercase()
            .matches("content-type: application/octet-stream")
            .count(),
        1
    );
    assert!(body.contains("file on disk"));
    assert!(body.contains("@disk.txt"));
}

#[tokio::test]
async fn test_request_spec_without_files_posts_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("Content-Type", "application/json; charset=utf-8"))
        .and(body_json(json!({"query": "{ ping }", "variables": {"a": 1}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": null})))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphQLClient::builder(endpoint(&server))
        .multipart_request_spec()
        .build()
        .unwrap();
    let mut request = Request::new("{ ping }").variable("a", 1);

    let data: Option<serde_json::Value> = client
        .run(&CancellationToken::new(), &mut request)
        .await
        .unwrap();
    assert!(data.is_none());
}
