//! MCP handler backed by the tool service.

use crate::spec_loader::LoadedSpec;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use rmcp::ServerHandler;
use rmcp::model::{
    Annotated, CallToolRequestParams, CallToolResult, ErrorData, Implementation, ListResourcesResult,
    ListToolsResult, PaginatedRequestParams, RawResource, ReadResourceRequestParams,
    ReadResourceResult, Resource, ResourceContents, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use restmcp_openapi_tools::result::ToolErrorKind;
use restmcp_openapi_tools::{Credential, ToolError, ToolResult, ToolService};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Where a call's upstream credential comes from.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// The process-level token (stdio).
    Process(Option<Credential>),
    /// The `Authorization` header of the incoming MCP request (HTTP), optionally falling back to
    /// the process-level token.
    RequestHeader { fallback: Option<Credential> },
}

impl CredentialSource {
    #[must_use]
    pub fn resolve(&self, headers: Option<&HeaderMap>) -> Option<Credential> {
        match self {
            CredentialSource::Process(token) => token.clone(),
            CredentialSource::RequestHeader { fallback } => headers
                .and_then(credential_from_headers)
                .or_else(|| fallback.clone()),
        }
    }
}

/// `Authorization: Bearer xyz` → `xyz`; any other value is used as-is.
fn credential_from_headers(headers: &HeaderMap) -> Option<Credential> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match raw.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest,
        _ => raw,
    };
    Credential::new(token)
}

/// Run a tool call until it finishes or `ct` fires.
///
/// Dropping the call future aborts its upstream request.
async fn until_cancelled(
    tool: &str,
    call: impl Future<Output = ToolResult>,
    ct: &CancellationToken,
) -> ToolResult {
    tokio::select! {
        result = call => result,
        () = ct.cancelled() => {
            tracing::info!(tool = %tool, "Tool call cancelled");
            ToolError::new(ToolErrorKind::Transport, "request cancelled").into()
        }
    }
}

#[derive(Clone)]
pub struct RestMcpHandler {
    inner: Arc<Inner>,
}

struct Inner {
    service: ToolService,
    spec: LoadedSpec,
    title: String,
    credentials: CredentialSource,
}

impl RestMcpHandler {
    #[must_use]
    pub fn new(
        service: ToolService,
        spec: LoadedSpec,
        title: String,
        credentials: CredentialSource,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                service,
                spec,
                title,
                credentials,
            }),
        }
    }

    #[must_use]
    pub fn service(&self) -> &ToolService {
        &self.inner.service
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.inner.title
    }

    fn spec_resource(&self) -> Resource {
        let info = self.inner.service.catalog().info();
        let mut raw = RawResource::new(self.inner.spec.uri.clone(), "openapi".to_string());
        raw.description = Some(format!("OpenAPI document for {} {}", info.title, info.version));
        raw.mime_type = Some("application/json".to_string());
        Annotated::new(raw, None)
    }

    fn instructions(&self) -> String {
        let info = self.inner.service.catalog().info();
        let mut text = format!(
            "Tools call the {} API (version {}). Each tool is one HTTP operation; results carry \
             the HTTP status and response body.",
            info.title, info.version
        );
        if let Some(desc) = info.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            text.push_str("\n\n");
            text.push_str(desc);
        }
        text
    }
}

impl ServerHandler for RestMcpHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: self.inner.title.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            instructions: Some(self.instructions()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let tools = self.inner.service.list_tools();
        tracing::debug!(tools = tools.len(), "list_tools");
        Ok(ListToolsResult {
            tools,
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let headers = context
            .extensions
            .get::<axum::http::request::Parts>()
            .map(|parts| &parts.headers);
        let credential = self.inner.credentials.resolve(headers);

        let call = self.inner.service.call_tool(
            &request.name,
            request.arguments.as_ref(),
            credential.as_ref(),
        );
        Ok(until_cancelled(&request.name, call, &context.ct)
            .await
            .into_call_tool_result())
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        Ok(ListResourcesResult {
            resources: vec![self.spec_resource()],
            ..Default::default()
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        if request.uri != self.inner.spec.uri {
            return Err(ErrorData::resource_not_found(
                format!("unknown resource '{}'", request.uri),
                None,
            ));
        }
        // Served as JSON regardless of the source format.
        let text = serde_json::to_string_pretty(&self.inner.spec.document)
            .unwrap_or_else(|_| self.inner.spec.text.clone());
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, request.uri)],
        })
    }
}
