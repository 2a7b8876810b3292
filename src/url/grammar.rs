use crate::url::normalize::{join_wrapped_urls, unescape_urls};
use crate::url::extract_id;
use crate::{ConfigError, UrlError};
use regex::{Captures, Regex};

/// Trailing punctuation that ends a sentence rather than a URL
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"'];

/// Compiled link grammar for one set of allowed store hosts
///
/// Everything that recognizes store URLs inside document text goes through this type, so
/// discovery, conversion and sync agree on what counts as a link.
#[derive(Debug, Clone)]
pub struct LinkGrammar {
    hosts: Vec<String>,
    /// `https://<host>/` prefix of a store URL
    url_start: Regex,
    /// Bare store URL in plain text
    candidate: Regex,
    /// Inline Markdown link whose target is a store URL
    markdown_link: Regex,
    /// Store URL span as written in Markdown, possibly containing escapes
    escaped_span: Regex,
}

impl LinkGrammar {
    /// Compiles the grammar for the given host patterns
    ///
    /// # Arguments
    ///
    /// * `hosts` - Allowed host patterns, exact (`docs.example.com`) or wildcard
    ///   (`*.example.com`)
    ///
    /// # Returns
    ///
    /// * `Ok(LinkGrammar)` - The compiled grammar
    /// * `Err(ConfigError)` - No hosts were given or a pattern does not compile
    pub fn new(hosts: &[String]) -> Result<Self, ConfigError> {
        if hosts.is_empty() {
            return Err(ConfigError::Validation(
                "at least one allowed host is required".to_string(),
            ));
        }

        let alternation = host_alternation(hosts);
        let prefix = format!(r"https?://(?i:{})/", alternation);

        Ok(Self {
            hosts: hosts.to_vec(),
            url_start: compile(&prefix)?,
            candidate: compile(&format!(r#"{}[^\s<>"'()\[\]]*"#, prefix))?,
            markdown_link: compile(&format!(r"\[([^\]]+)\]\(({}[^)\s]*)\)", prefix))?,
            escaped_span: compile(&format!(r"{}[^\s)]*", prefix))?,
        })
    }

    /// Returns the host patterns this grammar was built from
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Extracts the document id from a URL using this grammar's hosts
    pub fn extract_id(&self, url: &str) -> Result<String, UrlError> {
        extract_id(url, &self.hosts)
    }

    /// Returns the byte offset of the last store URL that starts inside `text`
    pub(crate) fn last_url_start(&self, text: &str) -> Option<usize> {
        self.url_start.find_iter(text).last().map(|m| m.start())
    }

    /// Returns true if `text` contains the start of a store URL
    pub(crate) fn contains_url_start(&self, text: &str) -> bool {
        self.url_start.is_match(text)
    }

    pub(crate) fn escaped_span(&self) -> &Regex {
        &self.escaped_span
    }

    /// Repairs store URLs mangled by export
    ///
    /// Joins URLs split across a single soft line break (repeatedly, until nothing changes)
    /// and then removes Markdown escapes from inside URL spans.
    pub fn normalize(&self, text: &str) -> String {
        let joined = join_wrapped_urls(self, text);
        unescape_urls(self, &joined)
    }

    /// Finds every store URL in plain text, in order of appearance
    ///
    /// Trailing sentence punctuation is not part of the URL.
    pub fn find_urls<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.candidate
            .find_iter(text)
            .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION))
            .collect()
    }

    /// Rewrites the targets of inline Markdown links that point into the store
    ///
    /// `resolve` receives each link target; returning `Some(path)` replaces the target,
    /// returning `None` leaves the link exactly as written.
    ///
    /// # Returns
    ///
    /// The rewritten text and the number of links that were replaced
    pub fn rewrite_markdown_links<F>(&self, text: &str, mut resolve: F) -> (String, usize)
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut rewritten = 0;
        let output = self
            .markdown_link
            .replace_all(text, |caps: &Captures| match resolve(&caps[2]) {
                Some(target) => {
                    rewritten += 1;
                    format!("[{}]({})", &caps[1], target)
                }
                None => caps[0].to_string(),
            })
            .into_owned();
        (output, rewritten)
    }
}

/// Builds a regex alternation from host patterns; `*.base` matches `base` and any subdomain
fn host_alternation(hosts: &[String]) -> String {
    hosts
        .iter()
        .map(|host| match host.strip_prefix("*.") {
            Some(base) => format!(r"(?:[a-z0-9-]+\.)*{}", regex::escape(base)),
            None => regex::escape(host),
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern(e.to_string()))
}
