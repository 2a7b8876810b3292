//! Content types used by the document store and how the pipeline treats each of them

pub const FOLDER: &str = "application/vnd.google-apps.folder";
pub const DOCUMENT: &str = "application/vnd.google-apps.document";
pub const SPREADSHEET: &str = "application/vnd.google-apps.spreadsheet";
pub const PRESENTATION: &str = "application/vnd.google-apps.presentation";
pub const FORM: &str = "application/vnd.google-apps.form";
pub const DRAWING: &str = "application/vnd.google-apps.drawing";

/// Prefix shared by every store-native type
pub const NATIVE_PREFIX: &str = "application/vnd.google-apps.";

pub const PDF: &str = "application/pdf";
pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_MARKDOWN: &str = "text/markdown";
pub const TEXT_HTML: &str = "text/html";

/// Format of a raw text upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    Markdown,
    Html,
}

/// How a document is read by discovery and conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Container; has children, no content
    Folder,
    /// Native word-processing document; exports as plain text and Markdown
    Document,
    /// Native slide deck; exports as plain text only
    Presentation,
    /// Any other native type (spreadsheets, forms, drawings, ...)
    OtherNative,
    /// Uploaded PDF; readable only through a native clone or local text extraction
    Pdf,
    /// Uploaded text file, read by downloading the raw bytes
    Text(TextFormat),
    /// Images, audio, video, foreign office formats and anything unrecognized
    Unsupported,
}

impl ContentKind {
    /// Classifies a content type
    ///
    /// Parameters such as `; charset=utf-8` are ignored.
    pub fn classify(mime_type: &str) -> Self {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            FOLDER => Self::Folder,
            DOCUMENT => Self::Document,
            PRESENTATION => Self::Presentation,
            PDF => Self::Pdf,
            TEXT_PLAIN => Self::Text(TextFormat::Plain),
            TEXT_MARKDOWN | "text/x-markdown" => Self::Text(TextFormat::Markdown),
            TEXT_HTML => Self::Text(TextFormat::Html),
            other if other.starts_with(NATIVE_PREFIX) => Self::OtherNative,
            _ => Self::Unsupported,
        }
    }

    /// Returns true for store-native types, which cannot be downloaded raw
    pub fn is_native(&self) -> bool {
        matches!(
            self,
            Self::Folder | Self::Document | Self::Presentation | Self::OtherNative
        )
    }

    /// Returns true if the store can export this type as plain text
    pub fn exports_plain_text(&self) -> bool {
        matches!(self, Self::Document | Self::Presentation)
    }
}
