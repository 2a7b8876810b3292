use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Returns `path`, or the first `<stem>_<n>.<ext>` variant not in `reserved`
///
/// # Examples
///
/// ```
/// use corpus_mirror::paths::ensure_unique_path;
/// use std::collections::HashSet;
/// use std::path::{Path, PathBuf};
///
/// let reserved: HashSet<PathBuf> = [PathBuf::from("out/doc.md")].into_iter().collect();
/// let unique = ensure_unique_path(Path::new("out/doc.md"), &reserved);
/// assert_eq!(unique, PathBuf::from("out/doc_1.md"));
/// ```
pub fn ensure_unique_path(path: &Path, reserved: &HashSet<PathBuf>) -> PathBuf {
    if !reserved.contains(path) {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1u32;
    loop {
        let candidate = path.with_file_name(format!("{}_{}{}", stem, counter, extension));
        if !reserved.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Output paths claimed during one run
///
/// Shared by every worker of a run; the check and the insert happen under one lock.
#[derive(Debug, Default)]
pub struct PathReservations {
    reserved: Mutex<HashSet<PathBuf>>,
}

impl PathReservations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `path`, or a suffixed variant when it is already taken
    ///
    /// # Returns
    ///
    /// The path that was actually reserved
    pub fn reserve(&self, path: &Path) -> PathBuf {
        let mut reserved = self.reserved.lock().unwrap_or_else(PoisonError::into_inner);
        let unique = ensure_unique_path(path, &reserved);
        reserved.insert(unique.clone());
        unique
    }

    pub fn is_reserved(&self, path: &Path) -> bool {
        self.reserved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path)
    }

    pub fn len(&self) -> usize {
        self.reserved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
