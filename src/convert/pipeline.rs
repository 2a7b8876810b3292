use crate::config::{Config, ConversionConfig};
use crate::convert::{
    compose_document, compose_stub, pool, render_markdown, rewrite_links, ConversionSession,
    ConvertError, LinkTarget,
};
use crate::output::ConversionRecord;
use crate::store::{RetryPolicy, StoreClient};
use crate::url::LinkGrammar;
use crate::{ConfigError, CorpusError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What happened to one record
#[derive(Debug)]
pub enum ConversionStatus {
    /// Rendered and written to its output path (only rendered in a dry run)
    Converted,
    /// Unsupported content; a placeholder was written instead
    Stubbed,
    Failed(ConvertError),
}

/// Outcome of one record, in inventory order
#[derive(Debug)]
pub struct ConversionOutcome {
    pub link: String,
    pub title: String,
    pub path: PathBuf,
    pub status: ConversionStatus,
    pub links_rewritten: usize,
}

impl ConversionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, ConversionStatus::Failed(_))
    }

    pub fn error(&self) -> Option<&ConvertError> {
        match &self.status {
            ConversionStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Result of a conversion run
#[derive(Debug, Default)]
pub struct ConversionReport {
    pub outcomes: Vec<ConversionOutcome>,
    /// Temporary clones left behind in the store
    pub cleanup_failures: usize,
    /// Nothing was written to disk
    pub dry_run: bool,
}

impl ConversionReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    fn count(&self, predicate: impl Fn(&ConversionStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }

    pub fn converted(&self) -> usize {
        self.count(|s| matches!(s, ConversionStatus::Converted))
    }

    pub fn stubbed(&self) -> usize {
        self.count(|s| matches!(s, ConversionStatus::Stubbed))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ConversionStatus::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConversionOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    /// Fails when at least one record failed
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

/// Shared by every worker of one run
struct RunContext {
    store: Arc<dyn StoreClient>,
    retry: RetryPolicy,
    config: ConversionConfig,
    session: ConversionSession,
}

/// Per-record result before it is turned into an outcome
struct Converted {
    status: ConversionStatus,
    links_rewritten: usize,
    cleanup_failed: bool,
}

/// Materializes inventory records as Markdown files
pub struct Converter {
    store: Arc<dyn StoreClient>,
    retry: RetryPolicy,
    grammar: LinkGrammar,
    config: ConversionConfig,
}

impl Converter {
    /// Creates a converter from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Converter)` - Ready to run
    /// * `Err(ConfigError)` - The allowed host patterns do not compile
    pub fn new(store: Arc<dyn StoreClient>, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            store,
            retry: RetryPolicy::from_config(&config.retry),
            grammar: LinkGrammar::new(&config.store.allowed_hosts)?,
            config: config.conversion.clone(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Converts every record
    ///
    /// Output paths are planned for all records before any worker starts; records then run
    /// independently on the worker pool. A failing record never stops the others.
    ///
    /// # Returns
    ///
    /// One outcome per record, in input order
    pub async fn convert(&self, records: &[ConversionRecord]) -> ConversionReport {
        let session = ConversionSession::plan(records, self.grammar.clone(), &self.config.output_dir);
        let context = Arc::new(RunContext {
            store: Arc::clone(&self.store),
            retry: self.retry,
            config: self.config.clone(),
            session,
        });

        tracing::info!(
            "Converting {} documents with {} workers{}",
            records.len(),
            self.config.workers,
            if self.config.dry_run { " (dry run)" } else { "" }
        );

        let jobs: Vec<usize> = (0..records.len()).collect();
        let worker_context = Arc::clone(&context);
        let results = pool::drain(jobs, self.config.workers, move |index| {
            let context = Arc::clone(&worker_context);
            async move { context.convert_one(index).await }
        })
        .await;

        let mut report = ConversionReport {
            dry_run: self.config.dry_run,
            ..ConversionReport::default()
        };
        for (target, converted) in context.session.link_map.targets().iter().zip(results) {
            if converted.cleanup_failed {
                report.cleanup_failures += 1;
            }
            report.outcomes.push(ConversionOutcome {
                link: target.record.link.clone(),
                title: target.record.title.clone(),
                path: target.path.clone(),
                status: converted.status,
                links_rewritten: converted.links_rewritten,
            });
        }

        tracing::info!(
            "Conversion finished: {} converted, {} stubbed, {} failed",
            report.converted(),
            report.stubbed(),
            report.failed()
        );
        report
    }
}

impl RunContext {
    async fn convert_one(&self, index: usize) -> Converted {
        let Some(target) = self.session.link_map.target(index) else {
            return Converted {
                status: ConversionStatus::Failed(ConvertError::Extraction(format!(
                    "no planned target for job {}",
                    index
                ))),
                links_rewritten: 0,
                cleanup_failed: false,
            };
        };

        match self.process(target).await {
            Ok(converted) => converted,
            Err(e) => {
                tracing::error!("Failed to convert {} ({}): {}", target.record.title, target.record.link, e);
                let cleanup_failed = matches!(
                    e,
                    ConvertError::CloneExport {
                        cleanup_failed: true,
                        ..
                    }
                );
                Converted {
                    status: ConversionStatus::Failed(e),
                    links_rewritten: 0,
                    cleanup_failed,
                }
            }
        }
    }

    async fn process(&self, target: &LinkTarget) -> Result<Converted, ConvertError> {
        let record = &target.record;
        let id = self.session.grammar.extract_id(&record.link)?;
        let id = id.as_str();

        let store = self.store.as_ref();
        let meta = self
            .retry
            .run("get_metadata", move || store.get_metadata(id))
            .await?;
        let tags = record.tag_list();

        let rendered = match render_markdown(
            store,
            &self.retry,
            &meta,
            self.config.scratch_folder.as_deref(),
        )
        .await
        {
            Ok(rendered) => rendered,
            Err(ConvertError::UnsupportedType(mime_type)) if self.config.stub_unsupported => {
                tracing::info!("Writing placeholder for {} ({})", record.title, mime_type);
                let (file, _) = compose_stub(&record.title, &record.link, &tags, &mime_type);
                self.write(&target.path, &file).await?;
                return Ok(Converted {
                    status: ConversionStatus::Stubbed,
                    links_rewritten: 0,
                    cleanup_failed: false,
                });
            }
            Err(e) => return Err(e),
        };

        let (body, links_rewritten) = rewrite_links(&self.session, &rendered.markdown, target.directory());
        let (file, hash) = compose_document(&record.title, &record.link, &tags, &body, meta.marker());
        self.write(&target.path, &file).await?;

        tracing::debug!(
            "Converted {} -> {} ({} links rewritten, hash {})",
            record.title,
            target.path.display(),
            links_rewritten,
            hash
        );
        Ok(Converted {
            status: ConversionStatus::Converted,
            links_rewritten,
            cleanup_failed: rendered.cleanup_failed,
        })
    }

    /// Writes `contents` to `path` unless this is a dry run
    async fn write(&self, path: &Path, contents: &str) -> Result<(), ConvertError> {
        if self.config.dry_run {
            tracing::info!("Dry run: would write {}", path.display());
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
        Ok(())
    }
}
