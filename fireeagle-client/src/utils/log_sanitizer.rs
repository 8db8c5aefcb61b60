//! Log sanitization utilities
//!
//! Request URLs and bodies carry OAuth signatures, tokens and verifiers; these
//! must not land in logs verbatim. Response bodies can be large and are
//! truncated.

/// Maximum number of bytes of a body included in log output.
const TRUNCATE_LIMIT: usize = 256;

/// Parameters whose values are masked in logged URLs and bodies.
const SENSITIVE_PARAMS: [&str; 3] = ["oauth_signature", "oauth_token", "oauth_verifier"];

const MASK: &str = "***";

/// Truncate a string for safe logging.
///
/// Returns the original string if it's within the limit, otherwise the first
/// `TRUNCATE_LIMIT` bytes (on a char boundary) with a suffix giving the total length.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        return s.to_string();
    }
    let mut end = TRUNCATE_LIMIT;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated, total {} bytes]", &s[..end], s.len())
}

/// Mask the values of sensitive OAuth parameters in a URL or form body.
///
/// `https://x/api?a=1&oauth_token=abc` → `https://x/api?a=1&oauth_token=***`.
/// Anything before a `?` is left alone; input without a query is treated as a
/// bare form body.
pub fn redact_oauth_params(url_or_body: &str) -> String {
    let (prefix, query) = match url_or_body.split_once('?') {
        Some((base, query)) => (Some(base), query),
        None if url_or_body.contains('=') => (None, url_or_body),
        None => return url_or_body.to_string(),
    };

    let redacted = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if SENSITIVE_PARAMS.contains(&name) => format!("{name}={MASK}"),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");

    match prefix {
        Some(base) => format!("{base}?{redacted}"),
        None => redacted,
    }
}
