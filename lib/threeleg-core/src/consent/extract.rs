use std::sync::LazyLock;

use oauth2::AuthorizationCode;
use percent_encoding::percent_decode_str;
use regex::Regex;

const CODE_MARKER: &str = "code=";

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("a valid regex"));

/// Extracts the authorization code from a redirect location or a page title.
///
/// The marker `code=` only counts at the start of the text or right after
/// `?`, `&`, `#` or whitespace, so parameters such as `error_code=` are
/// ignored. The value ends at the next `&`, `#` or whitespace and is
/// percent-decoded. An empty value yields `None`.
///
/// ```rust
/// use threeleg_core::extract_authorization_code;
///
/// let code = extract_authorization_code("http://localhost/cb?code=ABC123&state=xyz");
/// assert_eq!(code.map(|code| code.secret().clone()).as_deref(), Some("ABC123"));
/// ```
pub fn extract_authorization_code(text: &str) -> Option<AuthorizationCode> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find(CODE_MARKER) {
        let start = search_from + offset;
        let at_boundary = text[..start]
            .chars()
            .next_back()
            .is_none_or(|prev| matches!(prev, '?' | '&' | '#') || prev.is_whitespace());

        if at_boundary {
            let rest = &text[start + CODE_MARKER.len()..];
            let end = rest
                .find(|ch: char| matches!(ch, '&' | '#') || ch.is_whitespace())
                .unwrap_or(rest.len());
            let raw = &rest[..end];
            if raw.is_empty() {
                return None;
            }
            let decoded = percent_decode_str(raw).decode_utf8_lossy();
            return Some(AuthorizationCode::new(decoded.into_owned()));
        }
        search_from = start + CODE_MARKER.len();
    }
    None
}

/// Returns the trimmed text between the first `<title>` and `</title>` tags.
///
/// Matching is case-insensitive and tolerates attributes on the opening tag.
pub fn extract_title(content: &str) -> Option<&str> {
    TITLE
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|title| title.as_str().trim())
}
