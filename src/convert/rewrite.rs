use crate::convert::ConversionSession;
use crate::paths::relative_path_between;

/// Points the store links of a rendered body at the materialized documents
///
/// Wrapped and escaped URLs are repaired first. Every Markdown link whose target resolves to
/// a document of the run is replaced by the relative path from `source_dir` to that
/// document's file; the link text is kept verbatim. Links that do not resolve are left as
/// they are.
///
/// # Arguments
///
/// * `session` - The run's link map and grammar
/// * `body` - Rendered Markdown
/// * `source_dir` - Directory of the document being rewritten, relative to the output
///   directory
///
/// # Returns
///
/// The rewritten body and the number of links replaced
pub fn rewrite_links(session: &ConversionSession, body: &str, source_dir: &[String]) -> (String, usize) {
    let normalized = session.grammar.normalize(body);
    session
        .grammar
        .rewrite_markdown_links(&normalized, |url| {
            session
                .resolve(url)
                .map(|target| relative_path_between(source_dir, &target.components))
        })
}
