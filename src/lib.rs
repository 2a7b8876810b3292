//! Corpus-Mirror: a document-store crawler and Markdown corpus builder
//!
//! This crate walks a remote hierarchical document store (folders and documents that link to
//! each other), produces an inventory of everything reachable, and materializes an inventory
//! into a directory of Markdown files whose cross-document links point at each other by
//! relative path. Previously materialized files can be re-synced cheaply using the remote
//! modification marker stored in each file's header.

pub mod config;
pub mod convert;
pub mod crawler;
pub mod output;
pub mod paths;
pub mod state;
pub mod store;
pub mod sync;
pub mod url;

use thiserror::Error;

/// Main error type for Corpus-Mirror operations
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Header error: {0}")]
    Header(#[from] output::HeaderError),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Inventory error: {0}")]
    Inventory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing access token: environment variable {0} is not set")]
    MissingToken(String),

    #[error("{failed} of {total} documents failed")]
    BatchFailed { failed: usize, total: usize },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
///
/// Every variant belongs to the "invalid URL" category: the input cannot be mapped to a
/// document in the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Not a document store URL: {0}")]
    UnrecognizedHost(String),

    #[error("Could not extract a document id from {0}")]
    NoIdentifier(String),
}

/// Result type alias for Corpus-Mirror operations
pub type Result<T> = std::result::Result<T, CorpusError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use convert::{ConversionReport, Converter};
pub use crawler::Discoverer;
pub use output::{ConversionRecord, DiscoveryRecord};
pub use state::DiscoveryStatus;
pub use store::{HttpStoreClient, MemoryStore, RetryPolicy, StoreClient};
pub use sync::{SyncReport, Syncer};
pub use url::{build_link, extract_id, LinkGrammar};
