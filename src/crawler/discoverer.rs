//! Depth-bounded discovery of every document reachable from a set of seed URLs

use crate::config::Config;
use crate::crawler::extractor::LinkExtractor;
use crate::output::DiscoveryRecord;
use crate::state::{DiscoveryStatus, DiscoverySession};
use crate::store::{ContentKind, Metadata, RetryPolicy, StoreClient};
use crate::url::{build_link, LinkGrammar};
use crate::ConfigError;
use std::sync::Arc;

/// A document waiting to be visited
struct WorkItem {
    id: String,
    depth: u32,
    /// The URL that led here, when there was one
    link: Option<String>,
    /// Metadata already known from a folder listing
    metadata: Option<Metadata>,
}

/// Walks folders and embedded links and records every document found
///
/// Folder children are visited at the folder's own depth; links found inside a document are
/// visited one level deeper. Link extraction stops at `max_depth`. Each document is visited at
/// most once per session however many folders or links lead to it.
pub struct Discoverer {
    store: Arc<dyn StoreClient>,
    retry: RetryPolicy,
    extractor: LinkExtractor,
    max_depth: u32,
    page_size: u32,
}

impl Discoverer {
    /// Creates a discoverer from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Discoverer)` - Ready to run
    /// * `Err(ConfigError)` - The allowed host patterns do not compile
    pub fn new(store: Arc<dyn StoreClient>, config: &Config) -> Result<Self, ConfigError> {
        let retry = RetryPolicy::from_config(&config.retry);
        let grammar = LinkGrammar::new(&config.store.allowed_hosts)?;
        let extractor = LinkExtractor::new(
            Arc::clone(&store),
            retry,
            grammar,
            config.discovery.clone_binary_documents,
            config.conversion.scratch_folder.clone(),
        );

        Ok(Self {
            store,
            retry,
            extractor,
            max_depth: config.discovery.max_depth,
            page_size: config.store.page_size,
        })
    }

    /// Overrides the configured maximum depth
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Discovers everything reachable from `seeds` in a fresh session
    pub async fn discover(&self, seeds: &[String]) -> Vec<DiscoveryRecord> {
        let mut session = DiscoverySession::new();
        let records = self.run(&mut session, seeds).await;
        if session.cleanup_failures > 0 {
            tracing::warn!(
                "{} temporary clones could not be deleted",
                session.cleanup_failures
            );
        }
        records
    }

    /// Discovers everything reachable from `seeds` within an existing session
    ///
    /// Documents already visited in `session` are not visited again.
    ///
    /// # Returns
    ///
    /// One record per visited document (or per failed seed / folder listing), in depth-first
    /// order
    pub async fn run(&self, session: &mut DiscoverySession, seeds: &[String]) -> Vec<DiscoveryRecord> {
        let mut records = Vec::new();

        for (index, seed) in seeds.iter().enumerate() {
            let id = match self.extractor.grammar().extract_id(seed) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!("Invalid seed URL {}: {}", seed, e);
                    records.push(DiscoveryRecord::invalid_seed(seed));
                    continue;
                }
            };

            tracing::info!("Discovering from seed {}/{}: {}", index + 1, seeds.len(), seed);
            let before = records.len();
            let mut stack = vec![WorkItem {
                id,
                depth: 0,
                link: Some(seed.clone()),
                metadata: None,
            }];

            while let Some(item) = stack.pop() {
                self.visit(session, item, &mut stack, &mut records).await;
            }
            tracing::info!("Seed {} yielded {} records", seed, records.len() - before);
        }

        records
    }

    async fn visit(
        &self,
        session: &mut DiscoverySession,
        item: WorkItem,
        stack: &mut Vec<WorkItem>,
        records: &mut Vec<DiscoveryRecord>,
    ) {
        if !session.visited.try_visit(&item.id, item.depth) {
            tracing::debug!("Already visited {}", item.id);
            return;
        }

        let meta = match item.metadata {
            Some(meta) => meta,
            None => {
                let store = self.store.as_ref();
                let id = item.id.as_str();
                match self.retry.run("get_metadata", move || store.get_metadata(id)).await {
                    Ok(meta) => meta,
                    Err(e) => {
                        let status = DiscoveryStatus::from_store_error(&e);
                        tracing::warn!("Failed to fetch metadata for {}: {} ({})", item.id, e, status);
                        let link = item.link.unwrap_or_else(|| build_link(&item.id, ""));
                        records.push(DiscoveryRecord::new(link, item.id.as_str(), status));
                        return;
                    }
                }
            }
        };

        if meta.kind() == ContentKind::Folder {
            self.expand_folder(&meta, item.depth, stack, records).await;
            return;
        }

        tracing::debug!("Found {} ({}) at depth {}", meta.name, meta.id, item.depth);
        records.push(DiscoveryRecord::new(
            build_link(&meta.id, &meta.mime_type),
            meta.name.as_str(),
            DiscoveryStatus::Available,
        ));

        if item.depth >= self.max_depth {
            tracing::debug!(
                "Depth limit {} reached at {}, not following its links",
                self.max_depth,
                meta.id
            );
            return;
        }

        match self.extractor.extract(&meta, &session.visited).await {
            Ok(extraction) => {
                if extraction.cleanup_failed {
                    session.cleanup_failures += 1;
                }
                tracing::debug!("{} links to follow from {}", extraction.links.len(), meta.id);
                stack.extend(extraction.links.into_iter().rev().map(|link| WorkItem {
                    id: link.id,
                    depth: item.depth + 1,
                    link: Some(link.url),
                    metadata: None,
                }));
            }
            Err(e) => {
                tracing::warn!("Link extraction failed for {} ({}): {}", meta.name, meta.id, e);
            }
        }
    }

    /// Lists a folder and queues its children at the folder's depth
    ///
    /// A listing failure produces one record for the folder; children from pages that were
    /// already listed are still queued.
    async fn expand_folder(
        &self,
        folder: &Metadata,
        depth: u32,
        stack: &mut Vec<WorkItem>,
        records: &mut Vec<DiscoveryRecord>,
    ) {
        let store = self.store.as_ref();
        let folder_id = folder.id.as_str();
        let page_size = self.page_size;
        let mut children = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let token = page_token.as_deref();
            let page = self
                .retry
                .run("list_children", move || {
                    store.list_children(folder_id, token, page_size)
                })
                .await;

            match page {
                Ok(page) => {
                    children.extend(page.children);
                    match page.next_page_token.filter(|t| !t.is_empty()) {
                        Some(next) => page_token = Some(next),
                        None => break,
                    }
                }
                Err(e) => {
                    let status = DiscoveryStatus::from_store_error(&e);
                    tracing::warn!("Failed to list folder {} ({}): {}", folder.name, folder.id, e);
                    records.push(DiscoveryRecord::new(
                        build_link(&folder.id, &folder.mime_type),
                        folder.name.as_str(),
                        status,
                    ));
                    break;
                }
            }
        }

        tracing::debug!("Folder {} has {} children", folder.name, children.len());
        stack.extend(children.into_iter().rev().map(|child| WorkItem {
            id: child.id.clone(),
            depth,
            link: None,
            metadata: Some(child),
        }));
    }
}
