//! Outcome of a tool call, as seen by the MCP client.

use crate::error::OpenApiToolsError;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

/// Upstream response body, decoded by content type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    /// Binary payload that is never forwarded to the client.
    Opaque {
        content_type: Option<String>,
        len: usize,
    },
    Empty,
}

impl ResponseBody {
    /// JSON representation used in tool results.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            ResponseBody::Json(v) => v.clone(),
            ResponseBody::Text(s) => Value::String(s.clone()),
            ResponseBody::Opaque { .. } => Value::String(self.to_string()),
            ResponseBody::Empty => Value::Null,
        }
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Json(v) => write!(f, "{v}"),
            ResponseBody::Text(s) => f.write_str(s),
            ResponseBody::Opaque { content_type, len } => write!(
                f,
                "[binary content omitted: {}, {len} bytes]",
                content_type.as_deref().unwrap_or("unknown type")
            ),
            ResponseBody::Empty => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSuccess {
    pub status: u16,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    UnknownTool,
    InvalidArguments,
    AuthRequired,
    /// Connection failure, timeout, oversized or unreadable response.
    Transport,
    /// The upstream API answered with a non-2xx status.
    Upstream,
    Internal,
}

impl ToolErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ToolErrorKind::UnknownTool => "unknown_tool",
            ToolErrorKind::InvalidArguments => "invalid_arguments",
            ToolErrorKind::AuthRequired => "auth_required",
            ToolErrorKind::Transport => "transport",
            ToolErrorKind::Upstream => "upstream",
            ToolErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call. Upstream failures carry the status and body verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<ResponseBody>,
}

impl ToolError {
    #[must_use]
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            body: None,
        }
    }

    #[must_use]
    pub fn upstream(status: u16, reason: Option<&str>, body: ResponseBody) -> Self {
        let message = match reason {
            Some(r) => format!("API returned {status} {r}"),
            None => format!("API returned {status}"),
        };
        Self {
            kind: ToolErrorKind::Upstream,
            message,
            status: Some(status),
            body: Some(body),
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(status) = self.status {
            write!(f, "\nstatus: {status}")?;
        }
        if let Some(body) = &self.body {
            write!(f, "\nbody: {body}")?;
        }
        Ok(())
    }
}

impl From<OpenApiToolsError> for ToolError {
    fn from(value: OpenApiToolsError) -> Self {
        let kind = match &value {
            OpenApiToolsError::InvalidArguments { .. } => ToolErrorKind::InvalidArguments,
            OpenApiToolsError::AuthRequired { .. } => ToolErrorKind::AuthRequired,
            OpenApiToolsError::Transport(_) => ToolErrorKind::Transport,
            OpenApiToolsError::ToolNotFound(_) => ToolErrorKind::UnknownTool,
            OpenApiToolsError::SpecParse(_)
            | OpenApiToolsError::SpecHashMismatch { .. }
            | OpenApiToolsError::Config(_)
            | OpenApiToolsError::Json(_) => ToolErrorKind::Internal,
        };
        ToolError::new(kind, value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToolResult {
    Success(ToolSuccess),
    Failure(ToolError),
}

impl ToolResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success(_))
    }

    /// HTTP status, when a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ToolResult::Success(s) => Some(s.status),
            ToolResult::Failure(e) => e.status,
        }
    }

    /// Render as an MCP `tools/call` result.
    ///
    /// Successes carry `{status, body}` as structured content (matching the advertised output
    /// schema) plus a text rendering of the body. Failures set `isError` and describe the kind,
    /// status and body in text.
    #[must_use]
    pub fn into_call_tool_result(self) -> CallToolResult {
        match self {
            ToolResult::Success(ToolSuccess { status, body }) => {
                let text = match &body {
                    ResponseBody::Json(v) => {
                        serde_json::to_string(v).unwrap_or_else(|_| v.to_string())
                    }
                    other => other.to_string(),
                };
                let structured = json!({ "status": status, "body": body.to_value() });
                CallToolResult {
                    content: vec![Content::text(text)],
                    structured_content: Some(structured),
                    is_error: Some(false),
                    meta: None,
                }
            }
            ToolResult::Failure(err) => CallToolResult {
                content: vec![Content::text(err.to_string())],
                structured_content: None,
                is_error: Some(true),
                meta: None,
            },
        }
    }
}

impl From<ToolError> for ToolResult {
    fn from(value: ToolError) -> Self {
        ToolResult::Failure(value)
    }
}

impl From<OpenApiToolsError> for ToolResult {
    fn from(value: OpenApiToolsError) -> Self {
        ToolResult::Failure(value.into())
    }
}
