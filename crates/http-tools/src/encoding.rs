//! Percent-encoding and URL assembly for outbound requests.

use crate::{HttpToolsError, Result};
use url::Url;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Encode a value for use inside a single path segment.
///
/// Everything outside the RFC 3986 unreserved set is escaped, including `/`, so a caller-supplied
/// value can never introduce extra segments.
#[must_use]
pub fn encode_path_segment(s: &str) -> String {
    encode_with(s, |_| false)
}

/// Encode a query key or value.
///
/// `&`, `=` and `#` are always escaped so the joined query string stays well-formed.
#[must_use]
pub fn encode_query_component(s: &str) -> String {
    encode_with(s, is_reserved_but_safe_in_pairs)
}

fn encode_with(s: &str, keep_extra: impl Fn(u8) -> bool) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if is_unreserved(b) || keep_extra(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}

fn is_unreserved(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~')
}

fn is_reserved_but_safe_in_pairs(b: u8) -> bool {
    matches!(
        b,
        b':' | b'/' | b'@' | b'!' | b'$' | b'\'' | b'(' | b')' | b'*' | b',' | b';'
    )
}

/// Join `base_url` and an already-encoded `path`, then append the query pairs in order.
///
/// Repeated keys are kept as separate pairs.
///
/// # Errors
///
/// Returns an error if the joined string is not a valid URL.
pub fn build_url(base_url: &str, path: &str, query: &[(String, String)]) -> Result<Url> {
    let joined = if path.is_empty() || path.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), path)
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), path)
    };
    let mut url =
        Url::parse(&joined).map_err(|e| HttpToolsError::InvalidUrl(format!("{joined}: {e}")))?;

    if !query.is_empty() {
        let encoded = query
            .iter()
            .map(|(k, v)| {
                format!("{}={}", encode_query_component(k), encode_query_component(v))
            })
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&encoded));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segment_escapes_slashes_and_spaces() {
        assert_eq!(encode_path_segment("42"), "42");
        assert_eq!(encode_path_segment("a b/c"), "a%20b%2Fc");
        assert_eq!(encode_path_segment("caf\u{e9}"), "caf%C3%A9");
    }

    #[test]
    fn query_component_keeps_pair_separators_escaped() {
        assert_eq!(encode_query_component("a&b=c"), "a%26b%3Dc");
        assert_eq!(encode_query_component("x:y/z"), "x:y/z");
        assert_eq!(encode_query_component("a+b"), "a%2Bb");
    }

    #[test]
    fn build_url_trims_trailing_slash_and_repeats_keys() {
        let url = build_url(
            "http://api.local/v1/",
            "/items/42",
            &[
                ("tags".to_string(), "a".to_string()),
                ("tags".to_string(), "b".to_string()),
            ],
        )
        .expect("url");
        assert_eq!(url.as_str(), "http://api.local/v1/items/42?tags=a&tags=b");
    }

    #[test]
    fn build_url_rejects_relative_base() {
        let err = build_url("not a url", "/x", &[]).unwrap_err();
        assert!(matches!(err, HttpToolsError::InvalidUrl(_)));
    }
}
