//! Repair of store URLs damaged by document export
//!
//! Markdown exports hard-wrap long URLs and escape `_`, `*`, `-`, `[` and `]` inside them.
//! Both have to be undone before a URL can be matched or rewritten.

use crate::url::LinkGrammar;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Markdown escapes that exports insert inside URLs
static URL_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([_*\-\[\]])").expect("valid escape pattern"));

/// A line that starts a new block (list item, heading, quote) is never a URL continuation
static BLOCK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-+*][ \t]|#{1,6}[ \t]|>|\d+[.)][ \t])").expect("valid block pattern"));

/// Emphasis markers that may wrap either half of a split URL
const EMPHASIS: [char; 2] = ['*', '_'];

/// Characters that terminate a URL fragment
const FRAGMENT_END: [char; 6] = ['(', ')', '[', ']', '<', '>'];

/// Joins store URLs that were split across a single line break
///
/// A URL at the end of a line is glued to the first token of the following line, dropping the
/// line break, any surrounding whitespace and any emphasis markers around either fragment. The
/// merge is retried on the joined line so URLs wrapped several times are fully repaired.
/// Blank lines (paragraph breaks) are never merged across.
pub fn join_wrapped_urls(grammar: &LinkGrammar, text: &str) -> String {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();

    let mut i = 0;
    while i + 1 < lines.len() {
        match join_pair(grammar, &lines[i], &lines[i + 1]) {
            Some(joined) => {
                lines[i] = joined;
                lines.remove(i + 1);
            }
            None => i += 1,
        }
    }

    lines.join("\n")
}

/// Removes Markdown escapes inside store URL spans; text outside URLs is untouched
pub fn unescape_urls(grammar: &LinkGrammar, text: &str) -> String {
    grammar
        .escaped_span()
        .replace_all(text, |caps: &Captures| {
            URL_ESCAPE.replace_all(&caps[0], "$1").into_owned()
        })
        .into_owned()
}

/// Attempts to merge `next` onto `head`, returning the merged line
fn join_pair(grammar: &LinkGrammar, head: &str, next: &str) -> Option<String> {
    let head = trim_trailing_markers(head);

    // The URL must run to the end of the line
    let token_start = head
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(pos, c)| pos + c.len_utf8())
        .unwrap_or(0);
    let token = &head[token_start..];
    let url_start = grammar.last_url_start(token)?;
    if token[url_start..].contains(FRAGMENT_END) {
        return None;
    }

    let next = next.trim_start_matches([' ', '\t']);
    if next.trim().is_empty() || BLOCK_START.is_match(next) {
        return None;
    }
    let next = next.trim_start_matches(EMPHASIS);

    let fragment_len = fragment_length(next);
    if fragment_len == 0 {
        return None;
    }
    let fragment = &next[..fragment_len];
    // A complete URL on the following line is a separate link
    if fragment.contains("://") || grammar.contains_url_start(fragment) {
        return None;
    }
    let rest = next[fragment_len..].trim_start_matches(EMPHASIS);

    Some(format!("{}{}{}", head, fragment, rest))
}

/// Strips trailing whitespace and unescaped emphasis markers
fn trim_trailing_markers(line: &str) -> &str {
    let mut end = line.len();
    loop {
        let trimmed = line[..end].trim_end_matches([' ', '\t', '\r']);
        end = trimmed.len();
        match trimmed.chars().last() {
            Some(c) if EMPHASIS.contains(&c) && !trimmed[..end - 1].ends_with('\\') => {
                end -= 1;
            }
            _ => break,
        }
    }
    &line[..end]
}

/// Byte length of the URL fragment at the start of `text`
///
/// The fragment ends at whitespace, an unescaped emphasis marker, or a bracket.
fn fragment_length(text: &str) -> usize {
    let mut chars = text.char_indices().peekable();
    while let Some((pos, c)) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(&(_, escaped)) if !escaped.is_whitespace() => {
                    chars.next();
                    continue;
                }
                _ => return pos,
            }
        }
        if c.is_whitespace() || EMPHASIS.contains(&c) || FRAGMENT_END.contains(&c) {
            return pos;
        }
    }
    text.len()
}
