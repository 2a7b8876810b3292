//! Document header (front matter) codec
//!
//! Every materialized file starts with a flat `key: value` block between `---` lines. The
//! block records where the document came from and the two hashes sync relies on.

use std::collections::BTreeMap;
use thiserror::Error;

/// Marker value of placeholder documents; sync never re-fetches them
pub const STUB_MARKER: &str = "stub";

pub const KEY_DESCRIPTION: &str = "description";
pub const KEY_EDITOR: &str = "editor";
pub const KEY_CONTENT_HASH: &str = "hash-content";
pub const KEY_MARKER: &str = "hash-remote";
pub const KEY_PUBLISHED: &str = "published";
pub const KEY_SOURCE: &str = "source";
pub const KEY_TAGS: &str = "tags";
pub const KEY_TITLE: &str = "title";

const DELIMITER: &str = "---";

/// Characters that force a value to be quoted
const SPECIAL_CHARS: &[char] = &[
    ':', '#', '@', '&', '*', '!', '|', '>', '\'', '"', '%', '[', ']', '{', '}',
];

/// Header parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("File does not start with a header block")]
    Missing,

    #[error("Header block is not terminated")]
    Unterminated,

    #[error("Malformed header line: {0}")]
    MalformedLine(String),
}

/// Parsed or generated document header
///
/// Keys are kept sorted, so rendering is deterministic and unknown keys survive a
/// parse → modify → render cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    fields: BTreeMap<String, String>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the header of a freshly converted document
    ///
    /// # Arguments
    ///
    /// * `title` - Document title (also used as description)
    /// * `source` - Link to the remote document
    /// * `tags` - Tags; the key is omitted when empty
    /// * `content_hash` - Hash of the rewritten body
    /// * `marker` - Remote modification marker, or `STUB_MARKER`
    pub fn for_document(
        title: &str,
        source: &str,
        tags: &[String],
        content_hash: &str,
        marker: &str,
    ) -> Self {
        let mut header = Self::new();
        header.set(KEY_DESCRIPTION, title);
        header.set(KEY_EDITOR, "markdown");
        header.set(KEY_CONTENT_HASH, content_hash);
        header.set(KEY_MARKER, marker);
        header.set(KEY_PUBLISHED, "true");
        header.set(KEY_SOURCE, source);
        if !tags.is_empty() {
            header.set(KEY_TAGS, &tags.join(", "));
        }
        header.set(KEY_TITLE, title);
        header
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Sets a value; line breaks are folded into spaces
    pub fn set(&mut self, key: &str, value: &str) {
        let value = value.replace(['\r', '\n'], " ");
        self.fields.insert(key.to_string(), value);
    }

    pub fn marker(&self) -> Option<&str> {
        self.get(KEY_MARKER)
    }

    pub fn source(&self) -> Option<&str> {
        self.get(KEY_SOURCE)
    }

    pub fn content_hash(&self) -> Option<&str> {
        self.get(KEY_CONTENT_HASH)
    }

    pub fn is_stub(&self) -> bool {
        self.marker() == Some(STUB_MARKER)
    }

    /// Renders the header block, including both delimiter lines
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(DELIMITER);
        out.push('\n');
        for (key, value) in &self.fields {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(&quote_value(value));
            out.push('\n');
        }
        out.push_str(DELIMITER);
        out.push('\n');
        out
    }

    /// Parses a header block from the start of `text`
    ///
    /// # Returns
    ///
    /// * `Ok((Header, &str))` - The header and the body following it
    /// * `Err(HeaderError)` - No header, unterminated header, or a line without a key
    pub fn parse(text: &str) -> Result<(Self, &str), HeaderError> {
        let rest = text
            .strip_prefix("---\n")
            .or_else(|| text.strip_prefix("---\r\n"))
            .ok_or(HeaderError::Missing)?;

        let mut header = Self::new();
        let mut offset = 0;
        for line in rest.split_inclusive('\n') {
            offset += line.len();
            let line = line.trim_end_matches(['\n', '\r']);
            if line == DELIMITER {
                return Ok((header, &rest[offset..]));
            }
            if line.trim().is_empty() {
                continue;
            }

            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| HeaderError::MalformedLine(line.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(HeaderError::MalformedLine(line.to_string()));
            }
            header
                .fields
                .insert(key.to_string(), unquote_value(value.trim()));
        }

        Err(HeaderError::Unterminated)
    }
}

/// Renders a complete document: header, a blank line, then the body
pub fn render_document(header: &Header, body: &str) -> String {
    format!("{}\n{}", header.render(), body)
}

/// Splits a document into its header and body
///
/// The blank separator line written by `render_document` is not part of the body.
pub fn parse_document(text: &str) -> Result<(Header, &str), HeaderError> {
    let (header, rest) = Header::parse(text)?;
    let body = rest
        .strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"))
        .unwrap_or(rest);
    Ok((header, body))
}

/// Quotes a value when it contains special characters or would be misread
fn quote_value(value: &str) -> String {
    let needs_quotes = value.contains(SPECIAL_CHARS)
        || value.starts_with('-')
        || value.trim() != value;
    if needs_quotes {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

fn unquote_value(value: &str) -> String {
    let inner = match value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    {
        Some(inner) => inner,
        None => return value.to_string(),
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped @ ('"' | '\\')) => out.push(escaped),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
