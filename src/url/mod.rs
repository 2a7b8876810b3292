//! URL handling module for Corpus-Mirror
//!
//! This module maps store URLs to document ids and back, decides which hosts belong to the
//! store, and repairs URLs that document export has wrapped or escaped.

mod extract;
mod grammar;
mod links;
mod matcher;
mod normalize;

// Re-export main functions
pub use extract::extract_id;
pub use grammar::LinkGrammar;
pub use links::build_link;
pub use matcher::{is_allowed_host, matches_wildcard};
pub use normalize::{join_wrapped_urls, unescape_urls};
