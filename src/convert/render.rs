use crate::convert::ConvertError;
use crate::crawler::{decode_text, extract_pdf_text};
use crate::output::{render_document, Header, STUB_MARKER};
use crate::store::{
    export_via_clone, CloneError, ContentKind, ExportFormat, Metadata, RetryPolicy, StoreClient,
};
use sha2::{Digest, Sha256};

/// Markdown body of a remote document, before link rewriting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBody {
    pub markdown: String,
    /// A temporary clone was left behind while rendering
    pub cleanup_failed: bool,
}

impl RenderedBody {
    fn new(markdown: String) -> Self {
        Self {
            markdown,
            cleanup_failed: false,
        }
    }
}

/// Renders a remote document as Markdown
///
/// | Content | Rendering |
/// |---------|-----------|
/// | Native document | Markdown export |
/// | PDF | Markdown export of a temporary native clone; local text extraction when no clone can be made |
/// | Text upload | Download; HTML is reduced to text with links kept |
/// | Anything else | `UnsupportedType`, without touching the content |
///
/// # Arguments
///
/// * `store` - The store client
/// * `retry` - Policy for every store call
/// * `meta` - Metadata of the document
/// * `scratch_folder` - Parent folder for temporary clones
pub async fn render_markdown(
    store: &dyn StoreClient,
    retry: &RetryPolicy,
    meta: &Metadata,
    scratch_folder: Option<&str>,
) -> Result<RenderedBody, ConvertError> {
    let id = meta.id.as_str();

    match meta.kind() {
        ContentKind::Document => {
            let markdown = retry
                .run("export", move || store.export(id, ExportFormat::Markdown))
                .await?;
            Ok(RenderedBody::new(markdown))
        }
        ContentKind::Pdf => {
            match export_via_clone(store, retry, id, ExportFormat::Markdown, scratch_folder).await {
                Ok(export) => Ok(RenderedBody {
                    markdown: export.text,
                    cleanup_failed: export.cleanup_failed,
                }),
                Err(CloneError::Create(e)) => {
                    tracing::info!(
                        "Could not clone {} ({}), extracting PDF text locally",
                        meta.name,
                        e
                    );
                    let bytes = retry.run("download", move || store.download(id)).await?;
                    let text = extract_pdf_text(bytes)
                        .await
                        .map_err(ConvertError::Extraction)?;
                    Ok(RenderedBody::new(text))
                }
                Err(CloneError::Export {
                    source,
                    cleanup_failed,
                }) => Err(ConvertError::CloneExport {
                    source,
                    cleanup_failed,
                }),
            }
        }
        ContentKind::Text(format) => {
            let bytes = retry.run("download", move || store.download(id)).await?;
            Ok(RenderedBody::new(decode_text(&bytes, format)))
        }
        ContentKind::Folder
        | ContentKind::Presentation
        | ContentKind::OtherNative
        | ContentKind::Unsupported => Err(ConvertError::UnsupportedType(meta.mime_type.clone())),
    }
}

/// Lowercase hex SHA-256 of a document body
pub fn content_hash(body: &str) -> String {
    hex::encode(Sha256::digest(body.as_bytes()))
}

/// Builds the complete file for a converted document
///
/// # Returns
///
/// The file contents and the content hash recorded in its header
pub fn compose_document(
    title: &str,
    source: &str,
    tags: &[String],
    body: &str,
    marker: &str,
) -> (String, String) {
    let hash = content_hash(body);
    let header = Header::for_document(title, source, tags, &hash, marker);
    (render_document(&header, body), hash)
}

/// Builds the placeholder file for a document that cannot be converted
///
/// The placeholder carries the `stub` marker, so sync never fetches it again.
pub fn compose_stub(title: &str, source: &str, tags: &[String], mime_type: &str) -> (String, String) {
    let body = format!(
        "This document ({}) cannot be converted to Markdown.\n\n[Open the original]({})\n",
        mime_type, source
    );
    compose_document(title, source, tags, &body, STUB_MARKER)
}
