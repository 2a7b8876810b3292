//! Integration tests for discovery
//!
//! These tests build small document graphs in the in-memory store and run complete discovery
//! passes over them.

use crate::{doc_url, folder_url, test_config};
use corpus_mirror::output::INVALID_URL_TITLE;
use corpus_mirror::store::{StoreError, StoreOp};
use corpus_mirror::{Discoverer, DiscoveryRecord, DiscoveryStatus, MemoryStore};
use std::sync::Arc;

fn discoverer(store: &Arc<MemoryStore>, max_depth: u32) -> Discoverer {
    let mut config = test_config();
    config.discovery.max_depth = max_depth;
    Discoverer::new(store.clone(), &config).expect("Failed to build discoverer")
}

fn titles(records: &[DiscoveryRecord]) -> Vec<&str> {
    records.iter().map(|r| r.title()).collect()
}

#[tokio::test]
async fn test_link_cycle_visits_each_document_once() {
    let store = Arc::new(MemoryStore::new());
    store.add_document("a", "Alpha", &format!("See [Beta]({})", doc_url("b")));
    store.add_document("b", "Beta", &format!("Back to {}", doc_url("a")));

    let records = discoverer(&store, 5).discover(&[doc_url("a")]).await;

    assert_eq!(titles(&records), vec!["Alpha", "Beta"]);
    assert_eq!(store.calls_for(StoreOp::GetMetadata, "a"), 1);
    assert_eq!(store.calls_for(StoreOp::GetMetadata, "b"), 1);
}

#[tokio::test]
async fn test_folder_reachable_by_two_paths_is_listed_once() {
    let store = Arc::new(MemoryStore::new());
    store.add_folder("root", "Root");
    store.add_folder("left", "Left");
    store.add_folder("right", "Right");
    store.add_folder("shared", "Shared");
    store.add_document("s1", "Shared One", "");
    store.add_document("s2", "Shared Two", "");
    store.add_document("l1", "Left Only", "");
    store.link("root", "left");
    store.link("root", "right");
    store.link("left", "shared");
    store.link("left", "l1");
    store.link("right", "shared");
    store.link("shared", "s1");
    store.link("shared", "s2");

    let records = discoverer(&store, 3).discover(&[folder_url("root")]).await;

    assert_eq!(titles(&records), vec!["Shared One", "Shared Two", "Left Only"]);
    assert_eq!(store.calls_for(StoreOp::ListChildren, "shared"), 1);
    assert!(records.iter().all(|r| r.status() == DiscoveryStatus::Available));
}

#[tokio::test]
async fn test_document_linked_from_folder_and_text_reported_once() {
    let store = Arc::new(MemoryStore::new());
    store.add_folder("root", "Root");
    store.add_document("index", "Index", &format!("Read {}", doc_url("guide")));
    store.add_document("guide", "Guide", "");
    store.link("root", "index");
    store.link("root", "guide");

    let records = discoverer(&store, 2).discover(&[folder_url("root")]).await;

    assert_eq!(titles(&records), vec!["Index", "Guide"]);
}

#[tokio::test]
async fn test_depth_limit_stops_link_extraction() {
    let store = Arc::new(MemoryStore::new());
    store.add_document("a", "A", &format!("next {}", doc_url("b")));
    store.add_document("b", "B", &format!("next {}", doc_url("c")));
    store.add_document("c", "C", "end");

    let records = discoverer(&store, 0).discover(&[doc_url("a")]).await;
    assert_eq!(titles(&records), vec!["A"]);
    assert_eq!(store.calls(StoreOp::Export), 0);

    let store = Arc::new(MemoryStore::new());
    store.add_document("a", "A", &format!("next {}", doc_url("b")));
    store.add_document("b", "B", &format!("next {}", doc_url("c")));
    store.add_document("c", "C", "end");

    let records = discoverer(&store, 1).discover(&[doc_url("a")]).await;
    assert_eq!(titles(&records), vec!["A", "B"]);
    assert_eq!(store.calls_for(StoreOp::Export, "a"), 1);
    assert_eq!(store.calls_for(StoreOp::Export, "b"), 0);
}

#[tokio::test]
async fn test_failure_classification() {
    let store = Arc::new(MemoryStore::new());
    store.add_document("locked", "Locked", "");
    store.add_document("odd", "Odd", "");
    store.add_document("flaky", "Flaky", "");
    store.fail_id("locked", StoreError::PermissionDenied("locked".to_string()));
    store.fail_id("odd", StoreError::BadRequest("odd".to_string()));
    store.fail_id(
        "flaky",
        StoreError::Http {
            status: 500,
            message: "backend error".to_string(),
        },
    );

    let seeds = vec![
        doc_url("gone"),
        doc_url("locked"),
        "https://example.com/not-a-document".to_string(),
        doc_url("odd"),
        doc_url("flaky"),
    ];
    let records = discoverer(&store, 1).discover(&seeds).await;

    let statuses: Vec<DiscoveryStatus> = records.iter().map(|r| r.status()).collect();
    assert_eq!(
        statuses,
        vec![
            DiscoveryStatus::Deleted,
            DiscoveryStatus::PermissionDenied,
            DiscoveryStatus::Invalid,
            DiscoveryStatus::Invalid,
            DiscoveryStatus::Error,
        ]
    );
    assert_eq!(records[0].link(), doc_url("gone"));
    assert_eq!(records[2].title(), INVALID_URL_TITLE);
    assert_eq!(records[2].link(), "https://example.com/not-a-document");
}

#[tokio::test]
async fn test_rate_limited_listing_recovers() {
    let store = Arc::new(MemoryStore::new());
    store.add_folder("root", "Root");
    store.add_document("a", "A", "");
    store.link("root", "a");
    store.rate_limit(StoreOp::ListChildren, 1);

    let records = discoverer(&store, 0).discover(&[folder_url("root")]).await;

    assert_eq!(titles(&records), vec!["A"]);
    assert_eq!(store.calls(StoreOp::ListChildren), 2);
}
