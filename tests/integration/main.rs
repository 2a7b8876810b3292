//! Integration tests for Corpus-Mirror
//!
//! The HTTP store client is exercised against wiremock servers; discovery, conversion and sync
//! run end-to-end against the in-memory store and a temporary output directory.

mod convert_tests;
mod crawl_tests;
mod http_store_tests;
mod sync_tests;

use corpus_mirror::config::Config;

pub fn doc_url(id: &str) -> String {
    format!("https://docs.google.com/document/d/{}/edit", id)
}

pub fn folder_url(id: &str) -> String {
    format!("https://drive.google.com/drive/folders/{}", id)
}

/// Configuration with fast retries and small listing pages
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.store.page_size = 2;
    config.retry.max_attempts = 2;
    config.retry.base_delay_ms = 1;
    config.conversion.workers = 3;
    config
}
