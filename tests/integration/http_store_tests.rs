//! Integration tests for the HTTP store client
//!
//! These tests use wiremock to stand in for the files API and check request shape, error
//! mapping and pagination.

use crate::{folder_url, test_config};
use corpus_mirror::store::{ExportFormat, StoreError};
use corpus_mirror::{Discoverer, DiscoveryStatus, HttpStoreClient, StoreClient};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const DOCUMENT_MIME: &str = "application/vnd.google-apps.document";

fn client(server: &MockServer) -> HttpStoreClient {
    HttpStoreClient::new(&server.uri(), "secret-token", Duration::from_secs(5))
        .expect("Failed to build client")
}

fn file_json(id: &str, name: &str, mime_type: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "mimeType": mime_type,
        "modifiedTime": "2024-03-01T10:00:00.000Z"
    })
}

#[tokio::test]
async fn test_get_metadata_sends_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/abc"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_json("abc", "Guide", DOCUMENT_MIME)))
        .expect(1)
        .mount(&server)
        .await;

    let meta = client(&server).get_metadata("abc").await.unwrap();

    assert_eq!(meta.id, "abc");
    assert_eq!(meta.name, "Guide");
    assert_eq!(meta.mime_type, DOCUMENT_MIME);
    assert_eq!(meta.marker(), "2024-03-01T10:00:00.000Z");
}

#[tokio::test]
async fn test_error_status_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "File not found: gone."}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/locked"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "No access", "errors": [{"reason": "insufficientFilePermissions"}]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/busy"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "Slow down", "errors": [{"reason": "userRateLimitExceeded"}]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(
        client.get_metadata("gone").await,
        Err(StoreError::NotFound("File not found: gone.".to_string()))
    );
    assert!(matches!(
        client.get_metadata("locked").await,
        Err(StoreError::PermissionDenied(_))
    ));
    assert!(matches!(
        client.get_metadata("busy").await,
        Err(StoreError::RateLimited(_))
    ));
    assert!(matches!(
        client.get_metadata("broken").await,
        Err(StoreError::Http { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_list_children_pagination() {
    let server = MockServer::start().await;
    // The continuation request is mounted first so it wins over the first-page mock
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [file_json("c", "Gamma", DOCUMENT_MIME)]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("pageSize", "2"))
        .and(query_param("q", "'root' in parents and trashed = false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [file_json("a", "Alpha", DOCUMENT_MIME), file_json("b", "Beta", DOCUMENT_MIME)],
            "nextPageToken": "page-2"
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let first = client.list_children("root", None, 2).await.unwrap();
    assert_eq!(first.children.len(), 2);
    assert_eq!(first.next_page_token.as_deref(), Some("page-2"));

    let second = client
        .list_children("root", Some("page-2"), 2)
        .await
        .unwrap();
    assert_eq!(second.children[0].name, "Gamma");
    assert!(second.next_page_token.is_none());
}

#[tokio::test]
async fn test_export_requests_format() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/abc/export"))
        .and(query_param("mimeType", "text/markdown"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Title\n\nBody\n"))
        .mount(&server)
        .await;

    let text = client(&server)
        .export("abc", ExportFormat::Markdown)
        .await
        .unwrap();
    assert_eq!(text, "# Title\n\nBody\n");
}

#[tokio::test]
async fn test_discovery_over_http_follows_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/root"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_json("root", "Root", FOLDER_MIME)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("pageToken", "next"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [file_json("c", "Gamma", DOCUMENT_MIME)]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [file_json("a", "Alpha", DOCUMENT_MIME), file_json("b", "Beta", DOCUMENT_MIME)],
            "nextPageToken": "next"
        })))
        .mount(&server)
        .await;

    let mut config = test_config();
    config.store.api_base = server.uri();
    config.discovery.max_depth = 0;
    let store = Arc::new(client(&server));
    let discoverer = Discoverer::new(store, &config).unwrap();

    let records = discoverer.discover(&[folder_url("root")]).await;

    let titles: Vec<&str> = records.iter().map(|r| r.title()).collect();
    assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);
    assert!(records.iter().all(|r| r.status() == DiscoveryStatus::Available));
    assert_eq!(records[0].link(), "https://docs.google.com/document/d/a/edit");
}
