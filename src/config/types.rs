use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Corpus-Mirror
///
/// Every section may be omitted; missing sections and keys take the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub retry: RetryConfig,
    pub discovery: DiscoveryConfig,
    pub conversion: ConversionConfig,
}

/// Remote store connection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StoreConfig {
    /// Base URL of the store's REST API
    pub api_base: String,

    /// Environment variable holding the bearer access token
    pub token_env: String,

    /// Host patterns recognized as store links ("docs.example.com" or "*.example.com")
    pub allowed_hosts: Vec<String>,

    /// Number of children requested per listing page
    pub page_size: u32,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/drive/v3".to_string(),
            token_env: "CORPUS_MIRROR_TOKEN".to_string(),
            allowed_hosts: vec!["docs.google.com".to_string(), "drive.google.com".to_string()],
            page_size: 100,
            request_timeout_secs: 60,
        }
    }
}

/// Backoff behavior for transient (rate-limited) store calls
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Retried attempts before the final unconditional attempt
    pub max_attempts: u32,

    /// Delay before the first retry, doubled on each further attempt (milliseconds)
    pub base_delay_ms: u64,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1000,
        }
    }
}

/// Discovery behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    /// Maximum number of embedded-link hops followed from a seed
    pub max_depth: u32,

    /// Allow temporary remote clones of binary documents to scan them for links
    pub clone_binary_documents: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            clone_binary_documents: false,
        }
    }
}

/// Conversion and sync configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConversionConfig {
    /// Root directory of the materialized corpus
    pub output_dir: PathBuf,

    /// Number of concurrent workers
    pub workers: usize,

    /// Plan and render everything but skip filesystem writes
    pub dry_run: bool,

    /// Write placeholder documents for unsupported content types instead of failing them
    pub stub_unsupported: bool,

    /// Folder that receives temporary clones (store default when unset)
    pub scratch_folder: Option<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            workers: 5,
            dry_run: false,
            stub_unsupported: false,
            scratch_folder: None,
        }
    }
}
