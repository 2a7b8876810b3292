use regex::Regex;
use std::sync::LazyLock;

/// Characters that are unsafe in file names on at least one platform
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("valid unsafe-char pattern"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

static DOT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.+").expect("valid dot pattern"));

/// Longest component most filesystems accept, in bytes
const MAX_COMPONENT_BYTES: usize = 255;

/// Makes a string safe to use as a single path component
///
/// Unsafe characters become `_`, whitespace and dot runs collapse to one character, leading
/// and trailing spaces, dots and underscores are trimmed, and the result is capped at 255
/// bytes. An empty result (or one made only of underscores) becomes `untitled`.
///
/// # Examples
///
/// ```
/// use corpus_mirror::paths::sanitize_component;
///
/// assert_eq!(sanitize_component("file:with<bad>chars"), "file_with_bad_chars");
/// assert_eq!(sanitize_component("  file...name  "), "file.name");
/// assert_eq!(sanitize_component("<<<>>>"), "untitled");
/// ```
pub fn sanitize_component(name: &str) -> String {
    let sanitized = UNSAFE_CHARS.replace_all(name, "_");
    let sanitized = WHITESPACE_RUN.replace_all(&sanitized, " ");
    let sanitized = DOT_RUN.replace_all(&sanitized, ".");
    let sanitized = sanitized.trim_matches([' ', '.', '_']);

    if sanitized.is_empty() {
        return "untitled".to_string();
    }

    truncate_on_char_boundary(sanitized, MAX_COMPONENT_BYTES).to_string()
}

fn truncate_on_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Turns a document title into a URL-friendly file stem
///
/// Lowercases, turns spaces into hyphens, keeps only `[a-z0-9-]`, collapses hyphen runs and
/// trims edge hyphens. Dots are dropped like any other punctuation, so version numbers stay
/// part of the name. An empty result becomes `unnamed`. Applying it twice gives the same
/// result as applying it once.
///
/// # Examples
///
/// ```
/// use corpus_mirror::paths::normalize_filename;
///
/// assert_eq!(normalize_filename("API Reference: v2.0!"), "api-reference-v20");
/// assert_eq!(normalize_filename("test_file_name"), "testfilename");
/// assert_eq!(normalize_filename("Release 2.0 Notes"), "release-20-notes");
/// ```
pub fn normalize_filename(title: &str) -> String {
    let mut normalized = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        let c = if c == ' ' { '-' } else { c };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if c == '-' && normalized.ends_with('-') {
            continue;
        }
        normalized.push(c);
    }

    let normalized = normalized.trim_matches('-');
    if normalized.is_empty() {
        "unnamed".to_string()
    } else {
        normalized.to_string()
    }
}
