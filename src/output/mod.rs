//! Output module for everything the pipeline reads and writes besides the store
//!
//! This module handles:
//! - The header block at the top of every materialized document
//! - Reading seed and inventory CSV files and writing the discovery inventory
//! - Summarizing and printing run results

mod header;
mod inventory;
pub mod stats;

pub use header::{
    parse_document, render_document, Header, HeaderError, KEY_CONTENT_HASH, KEY_DESCRIPTION,
    KEY_EDITOR, KEY_MARKER, KEY_PUBLISHED, KEY_SOURCE, KEY_TAGS, KEY_TITLE, STUB_MARKER,
};
pub use inventory::{
    read_conversion_records, read_conversion_records_from, read_seeds, read_seeds_from,
    write_discovery_records, write_discovery_records_to, ConversionRecord, DiscoveryRecord,
    FRAGMENT_COUNT, INVALID_URL_TITLE,
};
pub use stats::{
    print_conversion_report, print_discovery_statistics, print_sync_report, DiscoveryStatistics,
};
