//! Error types for `restmcp-openapi-tools`.

use thiserror::Error;

/// Main error type for `OpenAPI` tooling.
///
/// Upstream 4xx/5xx responses are not represented here; they are ordinary
/// [`crate::result::ToolResult`] failures.
#[derive(Error, Debug)]
pub enum OpenApiToolsError {
    /// The document is not usable `OpenAPI` (fatal to catalog build).
    #[error("OpenAPI error: {0}")]
    SpecParse(String),

    /// The spec integrity hash did not match under `HashPolicy::Fail`.
    #[error("OpenAPI error: spec hash mismatch (expected {expected}, got {actual})")]
    SpecHashMismatch { expected: String, actual: String },

    /// Caller supplied missing, unknown or mistyped arguments.
    #[error("invalid arguments for '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    /// The operation needs a credential and none was supplied.
    #[error("tool '{tool}' requires an API credential but none was provided")]
    AuthRequired { tool: String },

    /// Connection failure, timeout or unreadable response.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unknown tool '{0}'")]
    ToolNotFound(String),

    /// Invalid executor/catalog configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OpenApiToolsError {
    pub(crate) fn invalid_arguments(tool: &str, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}

impl From<restmcp_http_tools::HttpToolsError> for OpenApiToolsError {
    fn from(value: restmcp_http_tools::HttpToolsError) -> Self {
        use restmcp_http_tools::HttpToolsError;
        match value {
            HttpToolsError::InvalidUrl(s) => Self::Config(format!("invalid URL {s}")),
            HttpToolsError::Transport(s) => Self::Transport(s),
            HttpToolsError::TooLarge(s) => Self::Transport(format!("response too large: {s}")),
        }
    }
}

/// Result type alias for `OpenAPI` tooling operations.
pub type Result<T> = std::result::Result<T, OpenApiToolsError>;
