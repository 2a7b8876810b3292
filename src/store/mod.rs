//! Remote document store access
//!
//! This module defines the narrow interface the crawler and converter need from the remote
//! store, plus the pieces layered on top of it:
//!
//! - `StoreClient`: the six store operations (metadata, listing, export, download, copy, delete)
//! - `RetryPolicy`: bounded exponential backoff for rate-limited calls
//! - `export_via_clone`: the create → export → delete transaction for binary documents
//! - `HttpStoreClient`: the REST implementation
//! - `MemoryStore`: an in-memory store with scripted failures

pub mod mime;
mod http;
mod memory;
mod retry;
mod transaction;

pub use http::HttpStoreClient;
pub use memory::{MemoryStore, StoreOp};
pub use mime::{ContentKind, TextFormat};
pub use retry::{IsTransient, RetryPolicy};
pub use transaction::{export_via_clone, CloneError, CloneExport};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The only transient failure; retried by `RetryPolicy`
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl IsTransient for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Metadata of a single document or folder
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    /// Remote modification marker; absent for some shared items
    #[serde(default)]
    pub modified_time: Option<String>,
}

impl Metadata {
    pub fn kind(&self) -> ContentKind {
        ContentKind::classify(&self.mime_type)
    }

    /// Returns the modification marker, empty when the store did not report one
    pub fn marker(&self) -> &str {
        self.modified_time.as_deref().unwrap_or_default()
    }
}

/// One page of a folder listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildPage {
    #[serde(default, rename = "files")]
    pub children: Vec<Metadata>,
    /// Continuation token; `None` on the last page
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Export target format for native documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    PlainText,
    Markdown,
}

impl ExportFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::PlainText => mime::TEXT_PLAIN,
            Self::Markdown => mime::TEXT_MARKDOWN,
        }
    }
}

/// Parameters for copying a document into a (possibly converted) new document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyRequest {
    pub name: String,
    /// Target content type; a native type requests server-side conversion
    pub mime_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

/// Operations the pipeline needs from the remote document store
///
/// Implementations must be shareable across worker tasks. None of the methods retry; callers
/// wrap them in a `RetryPolicy`.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Fetches id, name, content type and modification marker of a document
    async fn get_metadata(&self, id: &str) -> StoreResult<Metadata>;

    /// Lists one page of non-trashed children of a folder
    ///
    /// # Arguments
    ///
    /// * `folder_id` - The folder to list
    /// * `page_token` - Continuation token from the previous page, `None` for the first page
    /// * `page_size` - Maximum number of children per page
    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> StoreResult<ChildPage>;

    /// Exports a native document in the given format
    async fn export(&self, id: &str, format: ExportFormat) -> StoreResult<String>;

    /// Downloads the raw bytes of an uploaded (non-native) document
    async fn download(&self, id: &str) -> StoreResult<Vec<u8>>;

    /// Copies a document, returning the new document's metadata
    async fn copy(&self, id: &str, request: &CopyRequest) -> StoreResult<Metadata>;

    /// Permanently deletes a document
    async fn delete(&self, id: &str) -> StoreResult<()>;
}
