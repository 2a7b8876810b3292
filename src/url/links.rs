use crate::store::mime;

/// Builds the canonical browser link for a document
///
/// Each native content type has its own editor URL; folders get the folder browser URL and
/// everything else (uploaded binaries, PDFs, text files) falls back to the generic file view.
///
/// # Examples
///
/// ```
/// use corpus_mirror::url::build_link;
///
/// assert_eq!(
///     build_link("abc", "application/vnd.google-apps.document"),
///     "https://docs.google.com/document/d/abc/edit"
/// );
/// assert_eq!(
///     build_link("abc", "application/pdf"),
///     "https://drive.google.com/file/d/abc/view"
/// );
/// ```
pub fn build_link(id: &str, mime_type: &str) -> String {
    match mime_type {
        mime::DOCUMENT => format!("https://docs.google.com/document/d/{}/edit", id),
        mime::SPREADSHEET => format!("https://docs.google.com/spreadsheets/d/{}/edit", id),
        mime::PRESENTATION => format!("https://docs.google.com/presentation/d/{}/edit", id),
        mime::FORM => format!("https://docs.google.com/forms/d/e/{}/viewform", id),
        mime::DRAWING => format!("https://docs.google.com/drawings/d/{}/edit", id),
        mime::FOLDER => format!("https://drive.google.com/drive/folders/{}", id),
        _ => format!("https://drive.google.com/file/d/{}/view", id),
    }
}
