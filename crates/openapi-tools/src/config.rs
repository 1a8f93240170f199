use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options for building a [`crate::catalog::ToolCatalog`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogOptions {
    /// Glob patterns over `"METHOD /path"`; empty means every operation.
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns over `"METHOD /path"`; wins over `include`.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Header that carries the credential, used to reserve it from header parameters even when
    /// the document itself declares no header-carried scheme.
    #[serde(default)]
    pub auth_header: Option<String>,
}

/// When the executor injects the caller's credential.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Only for operations whose security requirements name a header-carried scheme.
    #[default]
    Spec,
    /// For every operation when a credential is available.
    Always,
}

/// Immutable configuration for [`crate::executor::CallExecutor`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorConfig {
    /// Absolute `http(s)` base URL that resolved paths are appended to.
    pub base_url: String,

    /// Per-request timeout (seconds). Must be non-zero.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Overrides the header the credential is written to.
    #[serde(default)]
    pub auth_header: Option<String>,

    /// Overrides the credential prefix (`Bearer`, `Token`, ...). An empty string sends the raw
    /// credential.
    #[serde(default)]
    pub token_prefix: Option<String>,

    #[serde(default)]
    pub auth_mode: AuthMode,

    /// Maximum upstream response body size. `None` = unlimited.
    #[serde(default)]
    pub max_response_bytes: Option<usize>,
}

fn default_timeout_secs() -> u64 {
    30
}

impl ExecutorConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_timeout_secs(),
            auth_header: None,
            token_prefix: None,
            auth_mode: AuthMode::default(),
            max_response_bytes: None,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Hash verification policy for a loaded spec.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HashPolicy {
    /// Log warning if hash doesn't match.
    #[default]
    Warn,
    /// Fail startup if hash doesn't match.
    Fail,
    /// Ignore hash verification.
    Ignore,
}
