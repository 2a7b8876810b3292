use crate::config::{Config, ConversionConfig};
use crate::convert::{pool, render_markdown, rewrite_links, ConversionSession, ConvertError};
use crate::output::{
    parse_document, render_document, ConversionRecord, HeaderError, KEY_CONTENT_HASH, KEY_MARKER,
};
use crate::paths::{components_under, DOCUMENT_EXTENSION};
use crate::store::{RetryPolicy, StoreClient, StoreError};
use crate::url::LinkGrammar;
use crate::{ConfigError, CorpusError, UrlError};
use chrono::{DateTime, FixedOffset};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Failure to sync one file
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to access file: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error("Invalid source link: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] ConvertError),
}

/// What happened to one file
#[derive(Debug)]
pub enum SyncStatus {
    /// Remote changed and the body changed with it
    Updated,
    /// Remote marker advanced but the rewritten body is identical; the file was rewritten
    Refreshed,
    /// Remote marker unchanged; the file was not touched
    Unchanged,
    /// Not eligible for sync (placeholder, or no marker/source recorded)
    Skipped(String),
    Failed(SyncError),
}

/// Outcome of one file
#[derive(Debug)]
pub struct SyncOutcome {
    pub path: PathBuf,
    pub status: SyncStatus,
}

/// Result of a sync run
#[derive(Debug, Default)]
pub struct SyncReport {
    /// One outcome per file, in path order
    pub outcomes: Vec<SyncOutcome>,
    /// Temporary clones left behind in the store
    pub cleanup_failures: usize,
    pub dry_run: bool,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    fn count(&self, predicate: impl Fn(&SyncStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }

    pub fn updated(&self) -> usize {
        self.count(|s| matches!(s, SyncStatus::Updated))
    }

    pub fn refreshed(&self) -> usize {
        self.count(|s| matches!(s, SyncStatus::Refreshed))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|s| matches!(s, SyncStatus::Unchanged))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, SyncStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, SyncStatus::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &SyncError)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            SyncStatus::Failed(e) => Some((o.path.as_path(), e)),
            _ => None,
        })
    }

    /// Fails when at least one file failed
    pub fn ensure_success(&self) -> Result<(), CorpusError> {
        match self.failed() {
            0 => Ok(()),
            failed => Err(CorpusError::BatchFailed {
                failed,
                total: self.total(),
            }),
        }
    }
}

/// Lists every materialized document under `dir`, sorted by path
///
/// A missing directory has no documents.
pub fn find_documents(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    fn visit_dir(dir: &Path, results: &mut Vec<PathBuf>) -> std::io::Result<()> {
        for entry_res in std::fs::read_dir(dir)? {
            let path = entry_res?.path();
            if path.is_dir() {
                visit_dir(&path, results)?;
            } else if path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(DOCUMENT_EXTENSION)
            {
                results.push(path);
            }
        }
        Ok(())
    }

    let mut results = Vec::new();
    if dir.is_dir() {
        visit_dir(dir, &mut results)?;
    }
    results.sort();
    Ok(results)
}

struct RunContext {
    store: Arc<dyn StoreClient>,
    retry: RetryPolicy,
    config: ConversionConfig,
    session: ConversionSession,
}

/// Per-file result before it is turned into an outcome
struct Synced {
    status: SyncStatus,
    cleanup_failed: bool,
}

impl From<SyncStatus> for Synced {
    fn from(status: SyncStatus) -> Self {
        Self {
            status,
            cleanup_failed: false,
        }
    }
}

/// Refreshes materialized documents whose remote copy changed
pub struct Syncer {
    store: Arc<dyn StoreClient>,
    retry: RetryPolicy,
    grammar: LinkGrammar,
    config: ConversionConfig,
}

impl Syncer {
    /// Creates a syncer from configuration
    pub fn new(store: Arc<dyn StoreClient>, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            store,
            retry: RetryPolicy::from_config(&config.retry),
            grammar: LinkGrammar::new(&config.store.allowed_hosts)?,
            config: config.conversion.clone(),
        })
    }

    /// Syncs every document under the output directory
    ///
    /// `records` is the inventory the corpus was built from; it supplies the link targets
    /// used when re-rendered bodies are rewritten.
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReport)` - One outcome per file
    /// * `Err(CorpusError)` - The output directory could not be listed
    pub async fn sync(&self, records: &[ConversionRecord]) -> Result<SyncReport, CorpusError> {
        let files = find_documents(&self.config.output_dir)?;
        let session = ConversionSession::plan(records, self.grammar.clone(), &self.config.output_dir);
        let context = Arc::new(RunContext {
            store: Arc::clone(&self.store),
            retry: self.retry,
            config: self.config.clone(),
            session,
        });

        tracing::info!(
            "Syncing {} documents under {}{}",
            files.len(),
            self.config.output_dir.display(),
            if self.config.dry_run { " (dry run)" } else { "" }
        );

        let worker_context = Arc::clone(&context);
        let results = pool::drain(files.clone(), self.config.workers, move |path| {
            let context = Arc::clone(&worker_context);
            async move { context.sync_one(&path).await }
        })
        .await;

        let mut report = SyncReport {
            dry_run: self.config.dry_run,
            ..SyncReport::default()
        };
        for (path, synced) in files.into_iter().zip(results) {
            if synced.cleanup_failed {
                report.cleanup_failures += 1;
            }
            report.outcomes.push(SyncOutcome {
                path,
                status: synced.status,
            });
        }

        tracing::info!(
            "Sync finished: {} updated, {} refreshed, {} unchanged, {} skipped, {} failed",
            report.updated(),
            report.refreshed(),
            report.unchanged(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }
}

impl RunContext {
    async fn sync_one(&self, path: &Path) -> Synced {
        match self.process(path).await {
            Ok(synced) => synced,
            Err(e) => {
                tracing::error!("Failed to sync {}: {}", path.display(), e);
                let cleanup_failed = matches!(
                    e,
                    SyncError::Render(ConvertError::CloneExport {
                        cleanup_failed: true,
                        ..
                    })
                );
                Synced {
                    status: SyncStatus::Failed(e),
                    cleanup_failed,
                }
            }
        }
    }

    async fn process(&self, path: &Path) -> Result<Synced, SyncError> {
        let text = tokio::fs::read_to_string(path).await?;
        let (mut header, _) = parse_document(&text)?;

        if header.is_stub() {
            tracing::debug!("Skipping placeholder {}", path.display());
            return Ok(SyncStatus::Skipped("placeholder document".to_string()).into());
        }
        let (stored_marker, source) = match (header.marker(), header.source()) {
            (Some(marker), Some(source)) if !source.is_empty() => {
                (marker.to_string(), source.to_string())
            }
            _ => {
                tracing::debug!("Skipping {}: no hash-remote or source", path.display());
                return Ok(SyncStatus::Skipped("no hash-remote or source".to_string()).into());
            }
        };

        let id = self.session.grammar.extract_id(&source)?;
        let id = id.as_str();
        let store = self.store.as_ref();
        let meta = self
            .retry
            .run("get_metadata", move || store.get_metadata(id))
            .await?;

        let marker = meta.marker();
        if marker == stored_marker {
            tracing::debug!("{} is up to date", path.display());
            return Ok(SyncStatus::Unchanged.into());
        }
        warn_if_marker_regressed(path, &stored_marker, marker);

        let rendered = render_markdown(
            store,
            &self.retry,
            &meta,
            self.config.scratch_folder.as_deref(),
        )
        .await?;

        let source_dir = path
            .parent()
            .and_then(|dir| components_under(&self.session.output_dir, dir))
            .unwrap_or_default();
        let (body, links_rewritten) = rewrite_links(&self.session, &rendered.markdown, &source_dir);
        let hash = crate::convert::content_hash(&body);

        let status = if header.content_hash() == Some(hash.as_str()) {
            SyncStatus::Refreshed
        } else {
            SyncStatus::Updated
        };
        header.set(KEY_MARKER, marker);
        header.set(KEY_CONTENT_HASH, &hash);

        if self.config.dry_run {
            tracing::info!("Dry run: would rewrite {}", path.display());
        } else {
            tokio::fs::write(path, render_document(&header, &body)).await?;
        }
        tracing::debug!(
            "Synced {} ({:?}, {} links rewritten)",
            path.display(),
            status,
            links_rewritten
        );

        Ok(Synced {
            status,
            cleanup_failed: rendered.cleanup_failed,
        })
    }
}

/// Logs a marker that moved backwards in time; the document is still re-synced
fn warn_if_marker_regressed(path: &Path, stored: &str, current: &str) {
    let parse = |s: &str| DateTime::<FixedOffset>::parse_from_rfc3339(s).ok();
    if let (Some(stored_time), Some(current_time)) = (parse(stored), parse(current)) {
        if current_time < stored_time {
            tracing::warn!(
                "Remote marker of {} moved backwards ({} -> {})",
                path.display(),
                stored,
                current
            );
        }
    }
}
