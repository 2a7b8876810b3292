/// Checks if a host matches a wildcard pattern
///
/// This function supports two types of patterns:
/// 1. Exact match: "docs.example.com" matches only "docs.example.com"
/// 2. Wildcard match: "*.example.com" matches:
///    - "example.com" (the bare domain)
///    - "docs.example.com" (single subdomain)
///    - "eu.docs.example.com" (nested subdomains)
///
/// # Examples
///
/// ```
/// use corpus_mirror::url::matches_wildcard;
///
/// assert!(matches_wildcard("docs.example.com", "docs.example.com"));
/// assert!(!matches_wildcard("docs.example.com", "example.com"));
///
/// assert!(matches_wildcard("*.example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "drive.example.com"));
/// assert!(!matches_wildcard("*.example.com", "example.org"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}

/// Returns true if `host` matches any of the allowed host patterns
///
/// The host is compared case-insensitively; patterns are expected to be lowercase
/// (configuration validation enforces this).
pub fn is_allowed_host(patterns: &[String], host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    patterns.iter().any(|p| matches_wildcard(p, &host))
}
