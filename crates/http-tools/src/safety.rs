//! Outbound HTTP hygiene: base URL validation, response size limits and error redaction.

use crate::{HttpToolsError, Result};
use url::Url;

/// Parse and validate an upstream base URL.
///
/// Only absolute `http(s)` URLs with a host are accepted.
///
/// # Errors
///
/// Returns an error if the URL does not parse, uses another scheme, or has no host.
pub fn validate_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url)
        .map_err(|e| HttpToolsError::InvalidUrl(format!("'{base_url}': {e}")))?;

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(HttpToolsError::InvalidUrl(format!(
            "unsupported URL scheme '{scheme}' in '{}'",
            redact_url(&url)
        )));
    }

    if url.host_str().is_none() {
        return Err(HttpToolsError::InvalidUrl(format!(
            "missing host in '{}'",
            redact_url(&url)
        )));
    }

    Ok(url)
}

/// Read a full response body, failing once it grows past `max_bytes`.
///
/// # Errors
///
/// Returns an error if reading the body fails or the limit is exceeded.
pub async fn read_body_limited(
    mut response: reqwest::Response,
    max_bytes: Option<usize>,
) -> Result<Vec<u8>> {
    let Some(max) = max_bytes else {
        return Ok(response.bytes().await?.to_vec());
    };

    if let Some(len) = response.content_length()
        && len > max as u64
    {
        return Err(HttpToolsError::TooLarge(format!("{len} bytes (limit {max})")));
    }

    let mut out: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if out.len().saturating_add(chunk.len()) > max {
            return Err(HttpToolsError::TooLarge(format!("exceeded {max} bytes")));
        }
        out.extend_from_slice(&chunk);
    }

    Ok(out)
}

#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    // Best-effort: drop credentials + query + fragment.
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}
