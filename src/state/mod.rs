//! State module for tracking discovery progress
//!
//! This module provides the run-scoped state of a discovery pass.
//!
//! # Components
//!
//! - `DiscoveryStatus`: The outcome recorded for each discovered document
//! - `VisitedSet`: Check-and-set record of visited document ids
//! - `DiscoverySession`: Everything one discovery run owns; dropped when the run ends

mod status;
mod visited;

// Re-export main types
pub use status::DiscoveryStatus;
pub use visited::VisitedSet;

/// State owned by a single discovery run
#[derive(Debug, Default)]
pub struct DiscoverySession {
    pub visited: VisitedSet,
    /// Clones that could not be deleted during link extraction
    pub cleanup_failures: usize,
}

impl DiscoverySession {
    pub fn new() -> Self {
        Self::default()
    }
}
