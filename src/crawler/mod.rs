//! Crawler module for document discovery
//!
//! This module contains the discovery side of the pipeline, including:
//! - The depth-bounded folder and link walk (`Discoverer`)
//! - Reading document text and resolving the store links inside it (`LinkExtractor`)
//! - Decoding downloaded HTML, PDF and text uploads

mod discoverer;
mod extractor;
mod parser;

pub use discoverer::Discoverer;
pub use extractor::{DocumentText, ExtractError, Extraction, FoundLink, LinkExtractor};
pub use parser::{decode_text, extract_pdf_text, parse_html, ParsedHtml};

use crate::config::Config;
use crate::output::DiscoveryRecord;
use crate::store::StoreClient;
use crate::Result;
use std::sync::Arc;

/// Runs a complete discovery pass
///
/// This is the main entry point for discovery. It will:
/// 1. Compile the link grammar for the configured hosts
/// 2. Resolve every seed URL to a document id
/// 3. Walk folders and embedded links up to the configured depth
///
/// # Arguments
///
/// * `store` - The store client
/// * `config` - The configuration
/// * `seeds` - Seed URLs, in order
///
/// # Returns
///
/// * `Ok(Vec<DiscoveryRecord>)` - One record per document found or seed that failed
/// * `Err(CorpusError)` - The configuration is unusable
pub async fn discover(
    store: Arc<dyn StoreClient>,
    config: &Config,
    seeds: &[String],
) -> Result<Vec<DiscoveryRecord>> {
    let discoverer = Discoverer::new(store, config)?;
    Ok(discoverer.discover(seeds).await)
}
