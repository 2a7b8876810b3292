//! Link extraction from document content
//!
//! Reads the text of a document the cheapest way its content type allows, repairs URLs the
//! export wrapped over several lines, and resolves every store link to a document id.

use crate::crawler::parser::{decode_text, extract_pdf_text};
use crate::state::VisitedSet;
use crate::store::{
    export_via_clone, CloneError, ContentKind, ExportFormat, Metadata, RetryPolicy, StoreClient,
    StoreError,
};
use crate::url::LinkGrammar;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Failure to read a document's text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    CloneExport(#[from] CloneError),

    #[error("{0}")]
    Pdf(String),
}

/// Text of one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentText {
    pub text: String,
    /// A temporary clone was left behind while reading the text
    pub cleanup_failed: bool,
}

/// A store link found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundLink {
    /// The URL as it appears in the (normalized) text
    pub url: String,
    pub id: String,
}

/// Links of one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub links: Vec<FoundLink>,
    pub cleanup_failed: bool,
}

/// Reads documents and finds the store links inside them
pub struct LinkExtractor {
    store: Arc<dyn StoreClient>,
    retry: RetryPolicy,
    grammar: LinkGrammar,
    clone_binary_documents: bool,
    scratch_folder: Option<String>,
}

impl LinkExtractor {
    /// Creates an extractor
    ///
    /// # Arguments
    ///
    /// * `store` - The store client
    /// * `retry` - Policy for every store call
    /// * `grammar` - Recognizes store links
    /// * `clone_binary_documents` - Read PDFs through a temporary native clone
    /// * `scratch_folder` - Parent folder for temporary clones
    pub fn new(
        store: Arc<dyn StoreClient>,
        retry: RetryPolicy,
        grammar: LinkGrammar,
        clone_binary_documents: bool,
        scratch_folder: Option<String>,
    ) -> Self {
        Self {
            store,
            retry,
            grammar,
            clone_binary_documents,
            scratch_folder,
        }
    }

    pub fn grammar(&self) -> &LinkGrammar {
        &self.grammar
    }

    /// Reads the plain text of a document
    ///
    /// # Returns
    ///
    /// * `Ok(Some(DocumentText))` - The document's text
    /// * `Ok(None)` - The content type has no readable text
    /// * `Err(ExtractError)` - Reading failed
    pub async fn document_text(
        &self,
        meta: &Metadata,
    ) -> Result<Option<DocumentText>, ExtractError> {
        let store = self.store.as_ref();
        let id = meta.id.as_str();

        match meta.kind() {
            ContentKind::Document | ContentKind::Presentation => {
                let text = self
                    .retry
                    .run("export", move || store.export(id, ExportFormat::PlainText))
                    .await?;
                Ok(Some(DocumentText {
                    text,
                    cleanup_failed: false,
                }))
            }
            ContentKind::Pdf if self.clone_binary_documents => {
                match export_via_clone(
                    store,
                    &self.retry,
                    id,
                    ExportFormat::PlainText,
                    self.scratch_folder.as_deref(),
                )
                .await
                {
                    Ok(export) => Ok(Some(DocumentText {
                        text: export.text,
                        cleanup_failed: export.cleanup_failed,
                    })),
                    Err(CloneError::Create(e)) => {
                        tracing::debug!("Clone of {} failed ({}), reading PDF locally", id, e);
                        self.local_pdf_text(id).await.map(Some)
                    }
                    Err(e) => Err(e.into()),
                }
            }
            ContentKind::Pdf => self.local_pdf_text(id).await.map(Some),
            ContentKind::Text(format) => {
                let bytes = self
                    .retry
                    .run("download", move || store.download(id))
                    .await?;
                Ok(Some(DocumentText {
                    text: decode_text(&bytes, format),
                    cleanup_failed: false,
                }))
            }
            ContentKind::Folder | ContentKind::OtherNative | ContentKind::Unsupported => Ok(None),
        }
    }

    async fn local_pdf_text(&self, id: &str) -> Result<DocumentText, ExtractError> {
        let store = self.store.as_ref();
        let bytes = self
            .retry
            .run("download", move || store.download(id))
            .await?;
        let text = extract_pdf_text(bytes).await.map_err(ExtractError::Pdf)?;
        Ok(DocumentText {
            text,
            cleanup_failed: false,
        })
    }

    /// Resolves the store links in `text`
    ///
    /// Links back to `self_id`, links to documents already in `visited` and repeats within
    /// the text are dropped. Links whose id cannot be extracted are skipped.
    pub fn resolve_links(&self, text: &str, self_id: &str, visited: &VisitedSet) -> Vec<FoundLink> {
        let normalized = self.grammar.normalize(text);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for url in self.grammar.find_urls(&normalized) {
            let id = match self.grammar.extract_id(url) {
                Ok(id) => id,
                Err(e) => {
                    tracing::debug!("Skipping link without document id: {}", e);
                    continue;
                }
            };
            if id == self_id || visited.contains(&id) || !seen.insert(id.clone()) {
                continue;
            }
            links.push(FoundLink {
                url: url.to_string(),
                id,
            });
        }
        links
    }

    /// Reads a document and resolves its links
    pub async fn extract(
        &self,
        meta: &Metadata,
        visited: &VisitedSet,
    ) -> Result<Extraction, ExtractError> {
        let text = match self.document_text(meta).await? {
            Some(text) => text,
            None => {
                tracing::debug!("No readable text in {} ({})", meta.id, meta.mime_type);
                return Ok(Extraction::default());
            }
        };

        Ok(Extraction {
            links: self.resolve_links(&text.text, &meta.id, visited),
            cleanup_failed: text.cleanup_failed,
        })
    }
}
