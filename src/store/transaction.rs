use crate::store::{mime, CopyRequest, ExportFormat, RetryPolicy, StoreClient, StoreError};
use thiserror::Error;

/// Name prefix of temporary native clones
const CLONE_PREFIX: &str = "temp_conversion_";

/// Text exported from a temporary native clone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneExport {
    pub text: String,
    /// The clone could not be deleted and was left behind in the store
    pub cleanup_failed: bool,
}

/// Failure of a clone-based export
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloneError {
    /// The clone was never created; nothing to clean up
    #[error("Failed to create native clone: {0}")]
    Create(StoreError),

    #[error("Failed to export native clone: {source}")]
    Export {
        source: StoreError,
        cleanup_failed: bool,
    },
}

impl CloneError {
    pub fn cleanup_failed(&self) -> bool {
        matches!(
            self,
            Self::Export {
                cleanup_failed: true,
                ..
            }
        )
    }
}

/// Exports a binary document by way of a temporary native clone
///
/// Runs the create → export → delete transaction: the store converts the document while
/// copying it, the clone is exported, and the clone is then deleted on every path out of this
/// function. A failed delete never fails the export; it is logged as a clone cleanup failure
/// and reported through `cleanup_failed`.
///
/// # Arguments
///
/// * `store` - The store client
/// * `retry` - Policy applied to each of the three store calls
/// * `id` - The binary document to convert
/// * `format` - Export format for the clone
/// * `scratch_folder` - Parent folder for the clone; the store default when `None`
pub async fn export_via_clone(
    store: &dyn StoreClient,
    retry: &RetryPolicy,
    id: &str,
    format: ExportFormat,
    scratch_folder: Option<&str>,
) -> Result<CloneExport, CloneError> {
    let request = CopyRequest {
        name: format!("{}{}", CLONE_PREFIX, id),
        mime_type: mime::DOCUMENT.to_string(),
        parents: scratch_folder.map(|f| vec![f.to_string()]).unwrap_or_default(),
    };

    let request = &request;
    let clone = retry
        .run("copy", move || store.copy(id, request))
        .await
        .map_err(CloneError::Create)?;
    tracing::debug!("Created temporary clone {} of {}", clone.id, id);

    let clone_id = clone.id.as_str();
    let exported = retry
        .run("export", move || store.export(clone_id, format))
        .await;

    let cleanup_failed = match retry.run("delete", move || store.delete(clone_id)).await {
        Ok(()) => false,
        Err(e) => {
            tracing::warn!(
                "CloneCleanupFailure: temporary clone {} of {} was not deleted: {}",
                clone_id,
                id,
                e
            );
            true
        }
    };

    match exported {
        Ok(text) => Ok(CloneExport {
            text,
            cleanup_failed,
        }),
        Err(source) => Err(CloneError::Export {
            source,
            cleanup_failed,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreOp};
    use std::time::Duration;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(2, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_clone_export_and_cleanup() {
        let store = MemoryStore::new();
        store.add_pdf("pdf1", "Manual", "See the manual text");

        let result = export_via_clone(&store, &policy(), "pdf1", ExportFormat::PlainText, None)
            .await
            .unwrap();

        assert_eq!(result.text, "See the manual text");
        assert!(!result.cleanup_failed);
        assert_eq!(store.live_clones(), 0);
        assert_eq!(store.calls(StoreOp::Copy), 1);
        assert_eq!(store.calls(StoreOp::Delete), 1);
    }

    #[tokio::test]
    async fn test_clone_deleted_when_export_fails() {
        let store = MemoryStore::new();
        store.add_pdf("pdf1", "Manual", "text");
        store.fail_clone_exports(StoreError::Http {
            status: 500,
            message: "export broke".to_string(),
        });

        let err = export_via_clone(&store, &policy(), "pdf1", ExportFormat::Markdown, None)
            .await
            .unwrap_err();

        assert!(matches!(err, CloneError::Export { .. }));
        assert!(!err.cleanup_failed());
        assert_eq!(store.live_clones(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_failure_does_not_fail_export() {
        let store = MemoryStore::new();
        store.add_pdf("pdf1", "Manual", "text");
        store.fail_op(StoreOp::Delete, StoreError::PermissionDenied("no".to_string()));

        let result = export_via_clone(&store, &policy(), "pdf1", ExportFormat::PlainText, None)
            .await
            .unwrap();

        assert_eq!(result.text, "text");
        assert!(result.cleanup_failed);
        assert_eq!(store.live_clones(), 1);
    }

    #[tokio::test]
    async fn test_copy_failure_creates_nothing() {
        let store = MemoryStore::new();
        store.add_pdf("pdf1", "Manual", "text");
        store.fail_op(StoreOp::Copy, StoreError::PermissionDenied("read only".to_string()));

        let err = export_via_clone(&store, &policy(), "pdf1", ExportFormat::PlainText, None)
            .await
            .unwrap_err();

        assert!(matches!(err, CloneError::Create(StoreError::PermissionDenied(_))));
        assert_eq!(store.calls(StoreOp::Delete), 0);
        assert_eq!(store.live_clones(), 0);
    }

    #[tokio::test]
    async fn test_clone_placed_in_scratch_folder() {
        let store = MemoryStore::new();
        store.add_pdf("pdf1", "Manual", "text");

        export_via_clone(&store, &policy(), "pdf1", ExportFormat::PlainText, Some("scratch"))
            .await
            .unwrap();

        let requests = store.copy_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].name, "temp_conversion_pdf1");
        assert_eq!(requests[0].mime_type, mime::DOCUMENT);
        assert_eq!(requests[0].parents, vec!["scratch".to_string()]);
    }
}
