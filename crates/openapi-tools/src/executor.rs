//! Request plan → HTTP call → [`ToolResult`].

use crate::catalog::ToolSecurity;
use crate::config::{AuthMode, ExecutorConfig};
use crate::error::{OpenApiToolsError, Result};
use crate::mapper::RequestPlan;
use crate::result::{ResponseBody, ToolError, ToolResult, ToolSuccess};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use restmcp_http_tools::content::{BodyKind, classify};
use restmcp_http_tools::encoding::build_url;
use restmcp_http_tools::safety::{read_body_limited, sanitize_reqwest_error, validate_base_url};
use std::fmt;
use url::Url;

/// An API credential supplied by the caller. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for blank input.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Executes request plans against one upstream API.
#[derive(Debug, Clone)]
pub struct CallExecutor {
    client: reqwest::Client,
    base_url: Url,
    config: ExecutorConfig,
}

impl CallExecutor {
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::Config`] if the base URL is not an absolute `http(s)` URL or
    /// the timeout is zero.
    pub fn new(config: ExecutorConfig) -> Result<Self> {
        let base_url = validate_base_url(&config.base_url)?;
        if config.timeout_secs == 0 {
            return Err(OpenApiToolsError::Config(
                "request timeout must be at least 1 second".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| OpenApiToolsError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Perform the call described by `plan`.
    ///
    /// Never panics and never returns a Rust error: every failure is a [`ToolResult::Failure`].
    /// Dropping the returned future aborts the in-flight request.
    pub async fn execute(&self, plan: &RequestPlan, credential: Option<&Credential>) -> ToolResult {
        match self.try_execute(plan, credential).await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(tool = %plan.tool, error = %e, "Tool call failed");
                e.into()
            }
        }
    }

    async fn try_execute(
        &self,
        plan: &RequestPlan,
        credential: Option<&Credential>,
    ) -> Result<ToolResult> {
        // Decided before anything is sent.
        let auth = self.auth_header(plan, credential)?;

        let url = build_url(self.base_url.as_str(), &plan.path, &plan.query)?;
        tracing::debug!(tool = %plan.tool, method = %plan.method, path = %plan.path, "Calling upstream");

        let mut request = self
            .client
            .request(plan.method.clone(), url)
            .header(ACCEPT, "application/json");
        for (name, value) in &plan.headers {
            request = request.header(name, value);
        }
        if let Some((name, value)) = auth {
            request = request.header(name, value);
        }
        if let Some(body) = &plan.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = read_body_limited(response, self.config.max_response_bytes).await?;
        let body = decode_body(content_type.as_deref(), bytes);

        tracing::debug!(tool = %plan.tool, status = status.as_u16(), "Upstream responded");

        if status.is_success() {
            Ok(ToolResult::Success(ToolSuccess {
                status: status.as_u16(),
                body,
            }))
        } else {
            Ok(ToolError::upstream(status.as_u16(), status.canonical_reason(), body).into())
        }
    }

    /// Header name and value carrying the credential, if one should be sent.
    fn auth_header(
        &self,
        plan: &RequestPlan,
        credential: Option<&Credential>,
    ) -> Result<Option<(String, String)>> {
        let (header_name, default_prefix) = match &plan.security {
            ToolSecurity::Header {
                header_name,
                scheme,
                required,
                ..
            } => {
                if credential.is_none() && *required {
                    return Err(OpenApiToolsError::AuthRequired {
                        tool: plan.tool.clone(),
                    });
                }
                let name = self
                    .config
                    .auth_header
                    .clone()
                    .unwrap_or_else(|| header_name.clone());
                (name, scheme.default_prefix())
            }
            ToolSecurity::None if self.config.auth_mode == AuthMode::Always => {
                let name = self
                    .config
                    .auth_header
                    .clone()
                    .unwrap_or_else(|| "Authorization".to_string());
                (name, Some("Bearer"))
            }
            ToolSecurity::None => return Ok(None),
        };

        let Some(credential) = credential else {
            return Ok(None);
        };

        let prefix = self.config.token_prefix.as_deref().or(default_prefix);
        let value = match prefix.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => format!("{p} {}", credential.expose()),
            None => credential.expose().to_string(),
        };
        Ok(Some((header_name, value)))
    }

    fn transport_error(&self, e: &reqwest::Error) -> OpenApiToolsError {
        if e.is_timeout() {
            self.timeout_error()
        } else {
            OpenApiToolsError::Transport(sanitize_reqwest_error(e))
        }
    }

    fn timeout_error(&self) -> OpenApiToolsError {
        OpenApiToolsError::Transport(format!(
            "request timed out after {}s",
            self.config.timeout_secs
        ))
    }
}

fn decode_body(content_type: Option<&str>, bytes: Vec<u8>) -> ResponseBody {
    if bytes.is_empty() {
        return ResponseBody::Empty;
    }
    match classify(content_type, &bytes) {
        BodyKind::Json => match serde_json::from_slice(&bytes) {
            Ok(v) => ResponseBody::Json(v),
            Err(_) => ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned()),
        },
        BodyKind::Text => match String::from_utf8(bytes) {
            Ok(s) => ResponseBody::Text(s),
            Err(e) => ResponseBody::Opaque {
                content_type: content_type.map(str::to_string),
                len: e.as_bytes().len(),
            },
        },
        BodyKind::Binary => ResponseBody::Opaque {
            content_type: content_type.map(str::to_string),
            len: bytes.len(),
        },
    }
}
