//! Conversion of an inventory into a Markdown corpus
//!
//! This module contains everything between a curated inventory and files on disk:
//! - Planning every output path and indexing records by link (`LinkMap`)
//! - The fixed-size worker pool that drains the job queue
//! - Rendering remote content as Markdown
//! - Rewriting store links into relative paths
//! - The per-record pipeline and its report (`Converter`)

mod link_map;
pub mod pool;
mod pipeline;
mod render;
mod rewrite;

pub use link_map::{ConversionSession, LinkMap, LinkTarget};
pub use pipeline::{ConversionOutcome, ConversionReport, ConversionStatus, Converter};
pub use render::{compose_document, compose_stub, content_hash, render_markdown, RenderedBody};
pub use rewrite::rewrite_links;

use crate::store::StoreError;
use crate::UrlError;
use thiserror::Error;

/// Failure of a single record; never aborts the batch
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Invalid document link: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("Failed to export temporary clone: {source}")]
    CloneExport {
        source: StoreError,
        cleanup_failed: bool,
    },

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}
