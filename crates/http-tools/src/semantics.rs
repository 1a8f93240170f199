//! HTTP method semantics → MCP tool hints.

use reqwest::Method;
use rmcp::model::ToolAnnotations;

/// Build MCP tool annotations for an HTTP-backed tool.
///
/// Hints follow RFC 9110 method semantics. `openWorldHint` is always `true` since every tool talks
/// to an external API. Methods without well-defined semantics (`TRACE`, extension methods) only
/// get `openWorldHint`.
#[must_use]
pub fn annotations_for_method(method: &Method, title: Option<&str>) -> ToolAnnotations {
    let (read_only, destructive, idempotent) = match *method {
        Method::GET | Method::HEAD | Method::OPTIONS => (Some(true), Some(false), Some(true)),
        Method::POST => (Some(false), Some(false), Some(false)),
        Method::PUT | Method::DELETE => (Some(false), Some(true), Some(true)),
        // PATCH may or may not be idempotent; do not guess.
        Method::PATCH => (Some(false), Some(true), None),
        _ => (None, None, None),
    };

    ToolAnnotations {
        title: title.map(str::to_string),
        read_only_hint: read_only,
        destructive_hint: destructive,
        idempotent_hint: idempotent,
        open_world_hint: Some(true),
    }
}

#[cfg(test)]
mod tests {
    use super::annotations_for_method;
    use reqwest::Method;

    #[test]
    fn every_method_is_open_world() {
        for m in [
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::HEAD,
            Method::OPTIONS,
            Method::TRACE,
        ] {
            assert_eq!(annotations_for_method(&m, None).open_world_hint, Some(true));
        }
    }

    #[test]
    fn get_is_readonly_and_idempotent() {
        let a = annotations_for_method(&Method::GET, Some("Fetch a widget"));
        assert_eq!(a.title.as_deref(), Some("Fetch a widget"));
        assert_eq!(a.read_only_hint, Some(true));
        assert_eq!(a.destructive_hint, Some(false));
        assert_eq!(a.idempotent_hint, Some(true));
    }

    #[test]
    fn post_is_neither_readonly_nor_idempotent() {
        let a = annotations_for_method(&Method::POST, None);
        assert_eq!(a.read_only_hint, Some(false));
        assert_eq!(a.idempotent_hint, Some(false));
    }

    #[test]
    fn patch_leaves_idempotence_unknown() {
        let a = annotations_for_method(&Method::PATCH, None);
        assert_eq!(a.destructive_hint, Some(true));
        assert_eq!(a.idempotent_hint, None);
    }

    #[test]
    fn trace_only_sets_open_world() {
        let a = annotations_for_method(&Method::TRACE, None);
        assert_eq!(a.read_only_hint, None);
        assert_eq!(a.destructive_hint, None);
        assert_eq!(a.idempotent_hint, None);
    }
}
