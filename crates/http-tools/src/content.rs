//! Response body classification by `Content-Type`.

use mime::Mime;

/// How a response body should be surfaced to a tool caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Text,
    /// Anything that must not be forwarded verbatim (images, archives, octet streams, ...).
    Binary,
}

/// Classify a response body.
///
/// A missing or unparsable content type falls back to sniffing: valid UTF-8 is text, anything
/// else is binary.
#[must_use]
pub fn classify(content_type: Option<&str>, bytes: &[u8]) -> BodyKind {
    let Some(m) = content_type.and_then(|ct| ct.parse::<Mime>().ok()) else {
        return if std::str::from_utf8(bytes).is_ok() {
            BodyKind::Text
        } else {
            BodyKind::Binary
        };
    };

    if is_json(&m) {
        return BodyKind::Json;
    }

    if m.type_() == mime::TEXT
        || m.suffix() == Some(mime::XML)
        || m.subtype() == mime::XML
        || m.subtype() == mime::WWW_FORM_URLENCODED
        || m.subtype() == "javascript"
        || m.subtype() == "yaml"
        || m.subtype() == "x-yaml"
    {
        return BodyKind::Text;
    }

    BodyKind::Binary
}

/// `application/json`, `application/problem+json`, `application/vnd.foo+json`, ...
#[must_use]
pub fn is_json(m: &Mime) -> bool {
    m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON)
}

/// Like [`is_json`], for a raw media-type string taken from a document.
#[must_use]
pub fn is_json_media_type(media_type: &str) -> bool {
    match media_type.parse::<Mime>() {
        Ok(m) => is_json(&m),
        Err(_) => media_type.to_ascii_lowercase().contains("json"),
    }
}
