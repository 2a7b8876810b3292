//! Integration tests for conversion
//!
//! Inventories are converted into a temporary directory and the resulting files are checked
//! on disk, including that rewritten relative links land on the files they point at.

use crate::{doc_url, test_config};
use corpus_mirror::convert::{ConversionStatus, ConvertError};
use corpus_mirror::output::parse_document;
use corpus_mirror::{ConversionRecord, Converter, CorpusError, MemoryStore};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn converter(store: &Arc<MemoryStore>, output_dir: &Path) -> Converter {
    let mut config = test_config();
    config.conversion.output_dir = output_dir.to_path_buf();
    Converter::new(store.clone(), &config).expect("Failed to build converter")
}

/// Returns the targets of every Markdown link in `body`
fn link_targets(body: &str) -> Vec<String> {
    let link = Regex::new(r"\]\(([^)]+)\)").unwrap();
    link.captures_iter(body).map(|c| c[1].to_string()).collect()
}

fn read_body(path: &Path) -> String {
    let text = std::fs::read_to_string(path).unwrap();
    let (_, body) = parse_document(&text).unwrap();
    body.to_string()
}

#[tokio::test]
async fn test_mutually_linking_documents_point_at_each_other() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    store.add_document("a", "A", &format!("# A\n\nContinue with [B]({})\n", doc_url("b")));
    store.add_document("b", "B", &format!("# B\n\nBack to [A]({})\n", doc_url("a")));

    let records = vec![
        ConversionRecord::new(&doc_url("a"), "Getting Started").with_fragments(&["guides", "intro"]),
        ConversionRecord::new(&doc_url("b"), "API Reference").with_fragments(&["reference"]),
    ];
    let report = converter(&store, dir.path()).convert(&records).await;

    assert_eq!(report.converted(), 2);
    let a_path = dir.path().join("guides/intro/getting-started.md");
    let b_path = dir.path().join("reference/api-reference.md");
    assert_eq!(report.outcomes[0].path, a_path);
    assert_eq!(report.outcomes[1].path, b_path);

    let a_links = link_targets(&read_body(&a_path));
    assert_eq!(a_links, vec!["../../reference/api-reference.md"]);
    let b_links = link_targets(&read_body(&b_path));
    assert_eq!(b_links, vec!["../guides/intro/getting-started.md"]);

    let resolved: PathBuf = a_path.parent().unwrap().join(&a_links[0]);
    assert_eq!(
        std::fs::canonicalize(resolved).unwrap(),
        std::fs::canonicalize(&b_path).unwrap()
    );
    let resolved: PathBuf = b_path.parent().unwrap().join(&b_links[0]);
    assert_eq!(
        std::fs::canonicalize(resolved).unwrap(),
        std::fs::canonicalize(&a_path).unwrap()
    );
}

#[tokio::test]
async fn test_colliding_titles_get_distinct_files() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    store.add_document("one", "Notes", &format!("see [other]({})\n", doc_url("two")));
    store.add_document("two", "Notes", "second\n");

    let records = vec![
        ConversionRecord::new(&doc_url("one"), "Notes"),
        ConversionRecord::new(&doc_url("two"), "Notes"),
    ];
    let report = converter(&store, dir.path()).convert(&records).await;

    assert_eq!(report.converted(), 2);
    assert_eq!(report.outcomes[0].path, dir.path().join("notes.md"));
    assert_eq!(report.outcomes[1].path, dir.path().join("notes_1.md"));
    assert_eq!(link_targets(&read_body(&report.outcomes[0].path)), vec!["notes_1.md"]);
}

#[tokio::test]
async fn test_unsupported_record_fails_without_stopping_batch() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    store.add_document("a", "A", "alpha\n");
    store.add_file("img", "Diagram", "image/png", b"\x89PNG");
    store.add_document("c", "C", "gamma\n");

    let records = vec![
        ConversionRecord::new(&doc_url("a"), "Alpha"),
        ConversionRecord::new("https://drive.google.com/file/d/img/view", "Diagram"),
        ConversionRecord::new(&doc_url("c"), "Gamma"),
        ConversionRecord::new("https://example.com/elsewhere", "Elsewhere"),
    ];
    let report = converter(&store, dir.path()).convert(&records).await;

    assert_eq!(report.converted(), 2);
    assert_eq!(report.failed(), 2);
    assert!(dir.path().join("alpha.md").exists());
    assert!(dir.path().join("gamma.md").exists());
    assert!(!dir.path().join("diagram.md").exists());
    assert!(matches!(
        report.outcomes[1].status,
        ConversionStatus::Failed(ConvertError::UnsupportedType(_))
    ));
    assert!(matches!(
        report.outcomes[3].status,
        ConversionStatus::Failed(ConvertError::InvalidUrl(_))
    ));
    assert!(matches!(
        report.ensure_success(),
        Err(CorpusError::BatchFailed { failed: 2, total: 4 })
    ));
}
