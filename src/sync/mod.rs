//! Re-sync of a materialized corpus
//!
//! Every materialized file records the remote modification marker it was built from. Sync
//! compares that marker with the store and only re-renders documents that changed.

mod syncer;

pub use syncer::{find_documents, SyncError, SyncOutcome, SyncReport, SyncStatus, Syncer};
