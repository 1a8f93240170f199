//! Fetch or read the `OpenAPI` document at startup.

use crate::error::{Result, ServerError};
use restmcp_http_tools::safety::{redact_url, sanitize_reqwest_error};
use restmcp_openapi_tools::document::{parse_document, verify_spec_hash};
use restmcp_openapi_tools::HashPolicy;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use url::Url;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// The raw document plus its parsed form.
#[derive(Debug, Clone)]
pub struct LoadedSpec {
    /// URI the document is exposed under as an MCP resource.
    pub uri: String,
    pub text: String,
    pub document: Value,
}

/// Load the document from a URL or a local path, then check its digest.
///
/// # Errors
///
/// Returns [`ServerError::SpecLoad`] if the document cannot be fetched, read or parsed, or if the
/// digest does not match under [`HashPolicy::Fail`].
pub async fn load_spec(
    location: &str,
    auth: Option<&(String, String)>,
    expected_hash: Option<&str>,
    hash_policy: HashPolicy,
) -> Result<LoadedSpec> {
    let (uri, text) = if location.starts_with("http://") || location.starts_with("https://") {
        let url = Url::parse(location)
            .map_err(|e| ServerError::SpecLoad(format!("invalid spec URL '{location}': {e}")))?;
        let text = fetch(&url, auth).await?;
        (url.to_string(), text)
    } else {
        let path = location.strip_prefix("file://").unwrap_or(location);
        read_file(Path::new(path)).await?
    };

    verify_spec_hash(&text, expected_hash, hash_policy)
        .map_err(|e| ServerError::SpecLoad(e.to_string()))?;
    let document = parse_document(&text).map_err(|e| ServerError::SpecLoad(e.to_string()))?;

    tracing::info!(uri = %uri, bytes = text.len(), "Loaded OpenAPI document");
    Ok(LoadedSpec {
        uri,
        text,
        document,
    })
}

async fn fetch(url: &Url, auth: Option<&(String, String)>) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| ServerError::Startup(format!("failed to build HTTP client: {e}")))?;

    let mut request = client
        .get(url.clone())
        .header(reqwest::header::ACCEPT, "application/json, application/yaml");
    if let Some((name, value)) = auth {
        request = request.header(name, value);
    }

    let response = request.send().await.map_err(|e| {
        ServerError::SpecLoad(format!("failed to fetch spec: {}", sanitize_reqwest_error(&e)))
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ServerError::SpecLoad(format!(
            "fetching {} returned {status}",
            redact_url(url)
        )));
    }

    response
        .text()
        .await
        .map_err(|e| ServerError::SpecLoad(format!("failed to read spec: {}", sanitize_reqwest_error(&e))))
}

async fn read_file(path: &Path) -> Result<(String, String)> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ServerError::SpecLoad(format!("failed to read {}: {e}", path.display())))?;

    let absolute = std::path::absolute(path)?;
    let uri = Url::from_file_path(&absolute)
        .map(|u| u.to_string())
        .unwrap_or_else(|()| format!("file://{}", absolute.display()));
    Ok((uri, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use restmcp_openapi_tools::document::spec_digest;
    use std::io::Write as _;
    use tokio::net::TcpListener;

    const SPEC_YAML: &str = "openapi: 3.0.3\ninfo:\n  title: Files\n  version: '1'\npaths: {}\n";

    #[tokio::test]
    async fn loads_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(SPEC_YAML.as_bytes()).expect("write");

        let location = file.path().to_string_lossy().to_string();
        let spec = load_spec(&location, None, None, HashPolicy::Warn)
            .await
            .expect("spec");
        assert_eq!(spec.document["info"]["title"], "Files");
        assert!(spec.uri.starts_with("file://"));
        assert_eq!(spec.text, SPEC_YAML);
    }

    #[tokio::test]
    async fn hash_mismatch_fails_under_fail_policy() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(SPEC_YAML.as_bytes()).expect("write");
        let location = file.path().to_string_lossy().to_string();

        let good = spec_digest(SPEC_YAML);
        load_spec(&location, None, Some(&good), HashPolicy::Fail)
            .await
            .expect("matching digest");

        let err = load_spec(&location, None, Some("sha256:00"), HashPolicy::Fail)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::SpecLoad(_)));
    }

    #[tokio::test]
    async fn missing_file_and_garbage_are_errors() {
        let err = load_spec("/definitely/not/here.json", None, None, HashPolicy::Warn)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::SpecLoad(_)));

        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"{ not: [valid").expect("write");
        let location = file.path().to_string_lossy().to_string();
        assert!(load_spec(&location, None, None, HashPolicy::Warn).await.is_err());
    }

    #[tokio::test]
    async fn fetches_with_credential_header() {
        let app = Router::new().route(
            "/.well-known/openapi.json",
            get(|headers: HeaderMap| async move {
                if headers.get("x-key").and_then(|v| v.to_str().ok()) == Some("secret") {
                    (
                        StatusCode::OK,
                        r#"{"openapi":"3.0.0","info":{"title":"Remote","version":"1"},"paths":{}}"#,
                    )
                } else {
                    (StatusCode::UNAUTHORIZED, "no")
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        let location = format!("http://{addr}/.well-known/openapi.json");

        let auth = ("X-Key".to_string(), "secret".to_string());
        let spec = load_spec(&location, Some(&auth), None, HashPolicy::Warn)
            .await
            .expect("spec");
        assert_eq!(spec.document["info"]["title"], "Remote");
        assert_eq!(spec.uri, location);

        let err = load_spec(&location, None, None, HashPolicy::Warn)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"), "{err}");
    }
}
