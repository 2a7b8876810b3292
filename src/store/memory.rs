//! In-memory document store
//!
//! Holds folders and documents in plain maps and serves them through `StoreClient`. Failures
//! can be scripted per operation, per document, or as a number of rate-limit responses, and
//! every call is counted, which makes the store suitable for exercising discovery, conversion
//! and sync without a network.

use crate::store::{
    mime, ChildPage, ContentKind, CopyRequest, ExportFormat, Metadata, StoreClient, StoreError,
    StoreResult,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Marker given to documents that were never explicitly modified
const INITIAL_MARKER: &str = "2024-01-01T00:00:00.000Z";

/// Store operation, used for failure scripting and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetMetadata,
    ListChildren,
    Export,
    Download,
    Copy,
    Delete,
}

#[derive(Debug, Clone)]
struct Entry {
    meta: Metadata,
    content: Vec<u8>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    children: HashMap<String, Vec<String>>,
    failing_ops: HashMap<StoreOp, StoreError>,
    failing_ids: HashMap<String, StoreError>,
    rate_limits: HashMap<StoreOp, usize>,
    clone_export_failure: Option<StoreError>,
    calls: HashMap<StoreOp, usize>,
    calls_by_id: HashMap<(StoreOp, String), usize>,
    copy_requests: Vec<CopyRequest>,
    live_clones: HashSet<String>,
    next_clone: usize,
}

/// In-memory `StoreClient`
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a document of any content type
    pub fn add_file(&self, id: &str, name: &str, mime_type: &str, content: &[u8]) {
        let entry = Entry {
            meta: Metadata {
                id: id.to_string(),
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                modified_time: Some(INITIAL_MARKER.to_string()),
            },
            content: content.to_vec(),
        };
        self.lock().entries.insert(id.to_string(), entry);
    }

    pub fn add_folder(&self, id: &str, name: &str) {
        self.add_file(id, name, mime::FOLDER, b"");
        self.lock().children.entry(id.to_string()).or_default();
    }

    /// Adds a native document; `text` is returned by every export format
    pub fn add_document(&self, id: &str, name: &str, text: &str) {
        self.add_file(id, name, mime::DOCUMENT, text.as_bytes());
    }

    /// Adds an uploaded PDF whose native clone exports as `text`
    pub fn add_pdf(&self, id: &str, name: &str, text: &str) {
        self.add_file(id, name, mime::PDF, text.as_bytes());
    }

    /// Places `child` at the end of `folder`'s listing; a child may live in several folders
    pub fn link(&self, folder: &str, child: &str) {
        self.lock()
            .children
            .entry(folder.to_string())
            .or_default()
            .push(child.to_string());
    }

    /// Replaces a document's content and advances its modification marker
    pub fn update(&self, id: &str, text: &str, marker: &str) {
        if let Some(entry) = self.lock().entries.get_mut(id) {
            entry.content = text.as_bytes().to_vec();
            entry.meta.modified_time = Some(marker.to_string());
        }
    }

    /// Sets a document's modification marker without touching its content
    pub fn set_marker(&self, id: &str, marker: Option<&str>) {
        if let Some(entry) = self.lock().entries.get_mut(id) {
            entry.meta.modified_time = marker.map(str::to_string);
        }
    }

    /// Makes every call of `op` fail with `error`
    pub fn fail_op(&self, op: StoreOp, error: StoreError) {
        self.lock().failing_ops.insert(op, error);
    }

    /// Makes every operation on document `id` fail with `error`
    pub fn fail_id(&self, id: &str, error: StoreError) {
        self.lock().failing_ids.insert(id.to_string(), error);
    }

    /// Makes the next `times` calls of `op` fail as rate limited
    pub fn rate_limit(&self, op: StoreOp, times: usize) {
        self.lock().rate_limits.insert(op, times);
    }

    /// Makes exports of temporary clones fail with `error`
    pub fn fail_clone_exports(&self, error: StoreError) {
        self.lock().clone_export_failure = Some(error);
    }

    /// Total number of calls of `op`
    pub fn calls(&self, op: StoreOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Number of calls of `op` for document `id`
    pub fn calls_for(&self, op: StoreOp, id: &str) -> usize {
        self.lock()
            .calls_by_id
            .get(&(op, id.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Every copy request received, in order
    pub fn copy_requests(&self) -> Vec<CopyRequest> {
        self.lock().copy_requests.clone()
    }

    /// Number of clones created and not yet deleted
    pub fn live_clones(&self) -> usize {
        self.lock().live_clones.len()
    }

    /// Counts the call and applies scripted failures
    fn begin(&self, op: StoreOp, id: &str) -> Result<MutexGuard<'_, Inner>, StoreError> {
        let mut inner = self.lock();
        *inner.calls.entry(op).or_insert(0) += 1;
        *inner.calls_by_id.entry((op, id.to_string())).or_insert(0) += 1;

        if let Some(remaining) = inner.rate_limits.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::RateLimited(format!("{:?} {}", op, id)));
            }
        }
        if let Some(error) = inner.failing_ops.get(&op) {
            return Err(error.clone());
        }
        if let Some(error) = inner.failing_ids.get(id) {
            return Err(error.clone());
        }
        Ok(inner)
    }
}

impl Inner {
    fn entry(&self, id: &str) -> StoreResult<&Entry> {
        self.entries
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn get_metadata(&self, id: &str) -> StoreResult<Metadata> {
        let inner = self.begin(StoreOp::GetMetadata, id)?;
        Ok(inner.entry(id)?.meta.clone())
    }

    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> StoreResult<ChildPage> {
        let inner = self.begin(StoreOp::ListChildren, folder_id)?;
        inner.entry(folder_id)?;

        let offset = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| StoreError::BadRequest(format!("invalid page token {}", token)))?,
            None => 0,
        };
        let ids = inner.children.get(folder_id).cloned().unwrap_or_default();
        let end = (offset + page_size.max(1) as usize).min(ids.len());

        let children = ids
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .filter_map(|id| inner.entries.get(id).map(|e| e.meta.clone()))
            .collect();
        let next_page_token = (end < ids.len()).then(|| end.to_string());

        Ok(ChildPage {
            children,
            next_page_token,
        })
    }

    async fn export(&self, id: &str, _format: ExportFormat) -> StoreResult<String> {
        let inner = self.begin(StoreOp::Export, id)?;
        if inner.live_clones.contains(id) {
            if let Some(error) = &inner.clone_export_failure {
                return Err(error.clone());
            }
        }

        let entry = inner.entry(id)?;
        match entry.meta.kind() {
            ContentKind::Document | ContentKind::Presentation => {
                Ok(String::from_utf8_lossy(&entry.content).into_owned())
            }
            _ => Err(StoreError::BadRequest(format!(
                "export is not supported for {}",
                entry.meta.mime_type
            ))),
        }
    }

    async fn download(&self, id: &str) -> StoreResult<Vec<u8>> {
        let inner = self.begin(StoreOp::Download, id)?;
        let entry = inner.entry(id)?;
        if entry.meta.kind().is_native() {
            return Err(StoreError::BadRequest(format!(
                "native document {} cannot be downloaded",
                id
            )));
        }
        Ok(entry.content.clone())
    }

    async fn copy(&self, id: &str, request: &CopyRequest) -> StoreResult<Metadata> {
        let mut inner = self.begin(StoreOp::Copy, id)?;
        let source = inner.entry(id)?.clone();

        inner.next_clone += 1;
        let clone_id = format!("clone-{}", inner.next_clone);
        let meta = Metadata {
            id: clone_id.clone(),
            name: request.name.clone(),
            mime_type: request.mime_type.clone(),
            modified_time: source.meta.modified_time.clone(),
        };

        inner.copy_requests.push(request.clone());
        inner.live_clones.insert(clone_id.clone());
        inner.entries.insert(
            clone_id,
            Entry {
                meta: meta.clone(),
                content: source.content,
            },
        );
        Ok(meta)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut inner = self.begin(StoreOp::Delete, id)?;
        inner
            .entries
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        inner.live_clones.remove(id);
        Ok(())
    }
}
