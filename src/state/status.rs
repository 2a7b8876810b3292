//! Discovery status definitions
//!
//! Every discovery record carries exactly one of these, assigned when the record is emitted.

use crate::store::StoreError;
use std::fmt;

/// Outcome of discovering a single document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoveryStatus {
    /// Metadata was fetched; the document exists and is readable
    Available,

    // ===== Terminal Error States =====
    /// The store reported the document as missing
    Deleted,

    /// The credentials may not read the document
    PermissionDenied,

    /// The URL could not be resolved to a document, or the store rejected the id
    Invalid,

    /// Any other failure (server errors, transport errors, exhausted retries)
    Error,
}

impl DiscoveryStatus {
    /// Returns true if this represents a successful discovery
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }

    /// Returns the status as a lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Deleted => "deleted",
            Self::PermissionDenied => "permission_denied",
            Self::Invalid => "invalid",
            Self::Error => "error",
        }
    }

    /// Returns the value written to the discovery CSV
    ///
    /// Available documents are written with an empty status column.
    pub fn csv_value(&self) -> &'static str {
        match self {
            Self::Available => "",
            other => other.as_str(),
        }
    }

    /// Parses a status from its CSV value
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_csv_value(s: &str) -> Option<Self> {
        match s.trim() {
            "" | "available" => Some(Self::Available),
            "deleted" => Some(Self::Deleted),
            "permission_denied" => Some(Self::PermissionDenied),
            "invalid" => Some(Self::Invalid),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Classifies a failed store call
    pub fn from_store_error(error: &StoreError) -> Self {
        match error {
            StoreError::NotFound(_) => Self::Deleted,
            StoreError::PermissionDenied(_) => Self::PermissionDenied,
            StoreError::BadRequest(_) => Self::Invalid,
            _ => Self::Error,
        }
    }
}

impl fmt::Display for DiscoveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
