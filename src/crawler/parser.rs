//! Decoding of downloaded document content into text
//!
//! Raw uploads come back from the store as bytes. This module turns them into text that link
//! extraction and conversion can work with:
//! - HTML is reduced to Markdown-flavoured text with anchors kept as `[text](href)` links
//! - PDF text is extracted locally
//! - Plain text and Markdown are decoded as UTF-8 (lossily)

use crate::store::TextFormat;
use scraper::{ElementRef, Html, Selector};

/// Text recovered from an HTML upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHtml {
    /// The page title (from the `<title>` tag)
    pub title: Option<String>,

    /// Body text; anchors are rendered as Markdown links
    pub text: String,
}

/// Elements whose content never contributes text
const SKIPPED_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Elements rendered on lines of their own
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "section", "article", "header", "footer", "nav", "main", "aside", "ul", "ol",
    "table", "tr", "blockquote", "pre", "h1", "h2", "h3", "h4", "h5", "h6", "li",
];

/// Parses HTML and renders its body as text
///
/// # Link Rendering Rules
///
/// **Rendered as `[text](href)`:**
/// - `<a href="...">` with an absolute `http`/`https` target
///
/// **Rendered as plain text:**
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Fragment-only and relative links (there is no base URL to resolve them against)
///
/// # Example
///
/// ```
/// use corpus_mirror::crawler::parse_html;
///
/// let html = r#"<html><head><title>Notes</title></head>
///     <body><p>See <a href="https://docs.example.com/document/d/abc/edit">the guide</a>.</p></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.title.as_deref(), Some("Notes"));
/// assert_eq!(parsed.text, "See [the guide](https://docs.example.com/document/d/abc/edit).");
/// ```
pub fn parse_html(html: &str) -> ParsedHtml {
    let document = Html::parse_document(html);

    let title = extract_title(&document);

    let mut text = String::new();
    match Selector::parse("body")
        .ok()
        .and_then(|body| document.select(&body).next())
    {
        Some(body) => render_element(body, &mut text),
        None => render_element(document.root_element(), &mut text),
    }

    ParsedHtml {
        title,
        text: tidy_lines(&text),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn render_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if SKIPPED_ELEMENTS.contains(&name) {
        return;
    }

    match name {
        "br" => {
            out.push('\n');
            return;
        }
        "a" => {
            let mut label = String::new();
            render_children(element, &mut label);
            let label = collapse_whitespace(&label);
            match element.value().attr("href").and_then(link_target) {
                Some(href) if !label.is_empty() => {
                    out.push_str(&format!("[{}]({})", label, href));
                }
                Some(href) => out.push_str(href),
                None => out.push_str(&label),
            }
            return;
        }
        _ => {}
    }

    let is_block = BLOCK_ELEMENTS.contains(&name);
    if is_block {
        out.push('\n');
        if let Some(level) = heading_level(name) {
            out.push_str(&"#".repeat(level));
            out.push(' ');
        } else if name == "li" {
            out.push_str("- ");
        }
    }

    render_children(element, out);

    if is_block {
        out.push('\n');
    }
}

fn render_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            render_element(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            push_text(out, text);
        }
    }
}

/// Appends a text node, collapsing its whitespace the way a browser would
fn push_text(out: &mut String, text: &str) {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        if text.chars().any(char::is_whitespace) && !out.ends_with([' ', '\n']) && !out.is_empty() {
            out.push(' ');
        }
        return;
    }

    let leading = text.starts_with(char::is_whitespace);
    let trailing = text.ends_with(char::is_whitespace);
    if leading && !out.ends_with([' ', '\n']) && !out.is_empty() {
        out.push(' ');
    }
    out.push_str(&collapsed);
    if trailing {
        out.push(' ');
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn heading_level(name: &str) -> Option<usize> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Returns the href if it is an absolute web link
fn link_target(href: &str) -> Option<&str> {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Some(href)
    } else {
        None
    }
}

/// Trims every line and squeezes runs of blank lines into one
fn tidy_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() && out.last().map_or(true, |last| last.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|last| last.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// Decodes a downloaded text upload
pub fn decode_text(bytes: &[u8], format: TextFormat) -> String {
    let text = String::from_utf8_lossy(bytes);
    match format {
        TextFormat::Html => parse_html(&text).text,
        TextFormat::Plain | TextFormat::Markdown => text.into_owned(),
    }
}

/// Extracts the text layer of a PDF
///
/// Extraction is CPU-bound and runs on the blocking pool. Malformed documents can make the
/// extractor panic; that is reported as an error like any other failure.
pub async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String, String> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| format!("PDF extraction aborted: {}", e))?
        .map_err(|e| format!("PDF extraction failed: {}", e))
}
