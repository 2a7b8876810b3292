use crate::url::is_allowed_host;
use crate::UrlError;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Any run of 25 or more word/hyphen characters; store ids are long and opaque.
static FALLBACK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\w]{25,}").expect("valid id pattern"));

/// Query parameter carrying a document id in legacy share links
const ID_QUERY_PARAM: &str = "id";

/// Extracts the document id from a store URL
///
/// # Strategy
///
/// The host must be one of the allowed store hosts. Then, first match wins:
///
/// 1. Nested path form `.../d/e/<id>/...` (published forms)
/// 2. Path forms `.../d/<id>/...` and `.../folders/<id>`
/// 3. The `id` query parameter
/// 4. Any run of at least 25 word/hyphen characters anywhere in the URL
///
/// # Arguments
///
/// * `url_str` - The URL to resolve
/// * `allowed_hosts` - Host patterns recognized as the store
///
/// # Returns
///
/// * `Ok(String)` - The document id
/// * `Err(UrlError)` - The URL is malformed, foreign, or carries no id
///
/// # Examples
///
/// ```
/// use corpus_mirror::url::extract_id;
///
/// let hosts = vec!["docs.example.com".to_string()];
/// let id = extract_id("https://docs.example.com/document/d/abc123/edit", &hosts).unwrap();
/// assert_eq!(id, "abc123");
///
/// let id = extract_id("https://docs.example.com/forms/d/e/XYZ/viewform", &hosts).unwrap();
/// assert_eq!(id, "XYZ");
///
/// assert!(extract_id("https://other.com/x", &hosts).is_err());
/// ```
pub fn extract_id(url_str: &str, allowed_hosts: &[String]) -> Result<String, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?;

    let host = url
        .host_str()
        .ok_or_else(|| UrlError::UnrecognizedHost(url_str.to_string()))?;
    if !is_allowed_host(allowed_hosts, host) {
        return Err(UrlError::UnrecognizedHost(url_str.to_string()));
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();

    if let Some(id) = nested_path_id(&segments) {
        return Ok(id.to_string());
    }

    if let Some(id) = path_id(&segments) {
        return Ok(id.to_string());
    }

    if let Some((_, id)) = url
        .query_pairs()
        .find(|(key, value)| key == ID_QUERY_PARAM && !value.is_empty())
    {
        return Ok(id.into_owned());
    }

    if let Some(m) = FALLBACK_ID.find(url_str) {
        return Ok(m.as_str().to_string());
    }

    Err(UrlError::NoIdentifier(url_str.to_string()))
}

/// `.../d/e/<id>`
fn nested_path_id<'a>(segments: &[&'a str]) -> Option<&'a str> {
    segments
        .windows(3)
        .find(|w| w[0] == "d" && w[1] == "e" && !w[2].is_empty())
        .map(|w| w[2])
}

/// `.../d/<id>` or `.../folders/<id>`
fn path_id<'a>(segments: &[&'a str]) -> Option<&'a str> {
    segments
        .windows(2)
        .find(|w| (w[0] == "d" || w[0] == "folders") && !w[1].is_empty())
        .map(|w| w[1])
}
