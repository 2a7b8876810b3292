//! Configuration module for Corpus-Mirror
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use corpus_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("corpus.toml")).unwrap();
//! println!("Discovery will follow links {} levels deep", config.discovery.max_depth);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, ConversionConfig, DiscoveryConfig, RetryConfig, StoreConfig};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
