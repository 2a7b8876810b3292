//! Integration tests for sync
//!
//! A corpus is converted first, then synced against the same in-memory store while documents
//! change underneath it.

use crate::{doc_url, test_config};
use corpus_mirror::config::Config;
use corpus_mirror::output::parse_document;
use corpus_mirror::store::StoreOp;
use corpus_mirror::sync::SyncStatus;
use corpus_mirror::{ConversionRecord, Converter, MemoryStore, Syncer};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn config(output_dir: &Path) -> Config {
    let mut config = test_config();
    config.conversion.output_dir = output_dir.to_path_buf();
    config.conversion.stub_unsupported = true;
    config
}

fn corpus(store: &MemoryStore) -> Vec<ConversionRecord> {
    store.add_document("a", "A", &format!("Intro, then [B]({})\n", doc_url("b")));
    store.add_document("b", "B", "Plain reference\n");
    store.add_file("img", "Diagram", "image/png", b"\x89PNG");
    vec![
        ConversionRecord::new(&doc_url("a"), "Alpha").with_fragments(&["guides"]),
        ConversionRecord::new(&doc_url("b"), "Beta").with_fragments(&["reference"]),
        ConversionRecord::new("https://drive.google.com/file/d/img/view", "Diagram"),
    ]
}

#[tokio::test]
async fn test_second_pass_with_unchanged_markers_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    let records = corpus(&store);
    let config = config(dir.path());

    let report = Converter::new(store.clone(), &config)
        .unwrap()
        .convert(&records)
        .await;
    assert_eq!(report.converted(), 2);
    assert_eq!(report.stubbed(), 1);

    let alpha = dir.path().join("guides/alpha.md");
    let before = std::fs::read_to_string(&alpha).unwrap();
    let modified = std::fs::metadata(&alpha).unwrap().modified().unwrap();
    let exports = store.calls(StoreOp::Export);

    let syncer = Syncer::new(store.clone(), &config).unwrap();
    for _ in 0..2 {
        let report = syncer.sync(&records).await.unwrap();
        assert_eq!(report.total(), 3);
        assert_eq!(report.unchanged(), 2);
        assert_eq!(report.skipped(), 1);
        assert!(report.ensure_success().is_ok());
    }

    assert_eq!(store.calls(StoreOp::Export), exports);
    assert_eq!(std::fs::read_to_string(&alpha).unwrap(), before);
    assert_eq!(std::fs::metadata(&alpha).unwrap().modified().unwrap(), modified);
}

#[tokio::test]
async fn test_changed_document_is_rerendered_with_relative_links() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    let records = corpus(&store);
    let config = config(dir.path());
    Converter::new(store.clone(), &config)
        .unwrap()
        .convert(&records)
        .await;

    store.update(
        "a",
        &format!("Rewritten intro, see [B]({}) again\n", doc_url("b")),
        "2024-05-01T12:00:00.000Z",
    );
    let report = Syncer::new(store.clone(), &config)
        .unwrap()
        .sync(&records)
        .await
        .unwrap();

    assert_eq!(report.updated(), 1);
    assert_eq!(report.unchanged(), 1);
    let alpha = report
        .outcomes
        .iter()
        .find(|o| o.path.ends_with("guides/alpha.md"))
        .unwrap();
    assert!(matches!(alpha.status, SyncStatus::Updated));

    let text = std::fs::read_to_string(dir.path().join("guides/alpha.md")).unwrap();
    let (header, body) = parse_document(&text).unwrap();
    assert_eq!(body, "Rewritten intro, see [B](../reference/beta.md) again\n");
    assert_eq!(header.marker(), Some("2024-05-01T12:00:00.000Z"));
    assert_eq!(header.get("title"), Some("Alpha"));

    // A further pass sees the new marker and leaves the file alone
    let again = Syncer::new(store, &config)
        .unwrap()
        .sync(&records)
        .await
        .unwrap();
    assert_eq!(again.unchanged(), 2);
}

#[tokio::test]
async fn test_stub_is_never_refetched() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    let records = corpus(&store);
    let config = config(dir.path());
    Converter::new(store.clone(), &config)
        .unwrap()
        .convert(&records)
        .await;
    let before = store.calls_for(StoreOp::GetMetadata, "img");

    store.set_marker("img", Some("2024-06-01T00:00:00.000Z"));
    let report = Syncer::new(store.clone(), &config)
        .unwrap()
        .sync(&records)
        .await
        .unwrap();

    let stub = report
        .outcomes
        .iter()
        .find(|o| o.path.ends_with("diagram.md"))
        .unwrap();
    assert!(matches!(stub.status, SyncStatus::Skipped(_)));
    assert_eq!(store.calls_for(StoreOp::GetMetadata, "img"), before);
}
