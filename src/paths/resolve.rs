use super::{normalize_filename, sanitize_component};
use std::path::{Path, PathBuf};

/// Extension of every materialized document
pub const DOCUMENT_EXTENSION: &str = "md";

/// Sanitizes fragments, dropping empty ones
fn sanitized_fragments<S: AsRef<str>>(fragments: &[S]) -> Vec<String> {
    fragments
        .iter()
        .map(|f| f.as_ref().trim())
        .filter(|f| !f.is_empty())
        .map(sanitize_component)
        .collect()
}

/// File name a document with `title` is written to
pub fn document_filename(title: &str) -> String {
    format!(
        "{}.{}",
        sanitize_component(&normalize_filename(title)),
        DOCUMENT_EXTENSION
    )
}

/// Builds the output path of a document
///
/// # Arguments
///
/// * `base` - Output directory
/// * `title` - Document title, normalized into the file name
/// * `fragments` - Hierarchy fragments, outermost first; empty entries are skipped
///
/// # Examples
///
/// ```
/// use corpus_mirror::paths::build_output_path;
/// use std::path::Path;
///
/// let path = build_output_path(Path::new("out"), "Getting Started", &["Guides", "", "Basics"]);
/// assert_eq!(path, Path::new("out/Guides/Basics/getting-started.md"));
/// ```
pub fn build_output_path<S: AsRef<str>>(base: &Path, title: &str, fragments: &[S]) -> PathBuf {
    let mut path = base.to_path_buf();
    for fragment in sanitized_fragments(fragments) {
        path.push(fragment);
    }
    path.push(document_filename(title));
    path
}

/// Relative link from a document in `src_fragments` to the document `tgt_title` in
/// `tgt_fragments`
///
/// Both fragment lists are sanitized the same way `build_output_path` does, so the link
/// points at where the target is written. The result is always `/`-separated.
///
/// # Examples
///
/// ```
/// use corpus_mirror::paths::calculate_relative_path;
///
/// assert_eq!(
///     calculate_relative_path(&["guides", "tutorials"], &["reference", "api"], "Target"),
///     "../../reference/api/target.md"
/// );
/// ```
pub fn calculate_relative_path<S: AsRef<str>, T: AsRef<str>>(
    src_fragments: &[S],
    tgt_fragments: &[T],
    tgt_title: &str,
) -> String {
    let src = sanitized_fragments(src_fragments);
    let mut tgt = sanitized_fragments(tgt_fragments);
    tgt.push(format!("{}.{}", normalize_filename(tgt_title), DOCUMENT_EXTENSION));
    relative_path_between(&src, &tgt)
}

/// Relative path from directory `src_dir` to `target`, both given as component lists
///
/// The last component of `target` is the file name. Components are compared verbatim.
pub fn relative_path_between<S: AsRef<str>, T: AsRef<str>>(src_dir: &[S], target: &[T]) -> String {
    let (target_dir, filename) = match target.split_last() {
        Some((filename, dir)) => (dir, filename.as_ref()),
        None => return String::new(),
    };

    let common = src_dir
        .iter()
        .zip(target_dir)
        .take_while(|(a, b)| a.as_ref() == b.as_ref())
        .count();

    let mut parts: Vec<&str> = Vec::new();
    parts.extend(std::iter::repeat("..").take(src_dir.len() - common));
    parts.extend(target_dir[common..].iter().map(AsRef::as_ref));
    parts.push(filename);
    parts.join("/")
}

/// Splits a path under `base` into its string components
///
/// Returns `None` when `path` is not inside `base` or is not valid UTF-8.
pub fn components_under(base: &Path, path: &Path) -> Option<Vec<String>> {
    path.strip_prefix(base)
        .ok()?
        .components()
        .map(|c| c.as_os_str().to_str().map(str::to_string))
        .collect()
}
