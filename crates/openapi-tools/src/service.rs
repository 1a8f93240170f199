//! Tool listing and invocation over a built catalog.

use crate::catalog::{ToolCatalog, ToolDefinition};
use crate::error::OpenApiToolsError;
use crate::executor::{CallExecutor, Credential};
use crate::mapper::map_arguments;
use crate::result::ToolResult;
use restmcp_http_tools::semantics::annotations_for_method;
use rmcp::model::{JsonObject, Tool};
use serde_json::json;
use std::sync::Arc;

/// Shared, read-only tool service. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct ToolService {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    catalog: ToolCatalog,
    executor: CallExecutor,
    tools: Vec<Tool>,
}

impl ToolService {
    #[must_use]
    pub fn new(catalog: ToolCatalog, executor: CallExecutor) -> Self {
        let tools = catalog.tools().iter().map(mcp_tool).collect();
        Self {
            inner: Arc::new(Inner {
                catalog,
                executor,
                tools,
            }),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &ToolCatalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn executor(&self) -> &CallExecutor {
        &self.inner.executor
    }

    /// MCP tool descriptors in catalog order.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.inner.tools.clone()
    }

    /// Validate, map and execute one call.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<&JsonObject>,
        credential: Option<&Credential>,
    ) -> ToolResult {
        let Some(tool) = self.inner.catalog.get(name) else {
            let available: Vec<&str> = self.inner.catalog.names().collect();
            let mut result: ToolResult = OpenApiToolsError::ToolNotFound(name.to_string()).into();
            if let ToolResult::Failure(err) = &mut result {
                err.message = format!("{}; available tools: {}", err.message, available.join(", "));
            }
            return result;
        };

        let plan = match map_arguments(tool, arguments) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::debug!(tool = %name, error = %e, "Rejected tool arguments");
                return e.into();
            }
        };

        let result = self.inner.executor.execute(&plan, credential).await;
        tracing::info!(
            tool = %name,
            operation = %tool.operation_label(),
            status = ?result.status(),
            success = result.is_success(),
            "Tool call finished"
        );
        result
    }
}

fn mcp_tool(def: &ToolDefinition) -> Tool {
    let mut tool = Tool::new(
        def.name.clone(),
        def.description.clone(),
        Arc::new(def.input_schema_object()),
    );
    tool.annotations = Some(annotations_for_method(
        &def.method,
        def.summary.as_deref(),
    ));
    tool.output_schema = Some(Arc::new(output_schema(def)));
    tool
}

fn output_schema(def: &ToolDefinition) -> JsonObject {
    let body = def.response_schema.clone().unwrap_or_else(|| json!({}));
    let schema = json!({
        "type": "object",
        "properties": {
            "status": {"type": "integer"},
            "body": body,
        },
        "required": ["status", "body"],
    });
    schema.as_object().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CatalogOptions, ExecutorConfig};
    use crate::result::{ResponseBody, ToolErrorKind};
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::Value;
    use tokio::net::TcpListener;

    const WIDGETS: &str = r#"
openapi: "3.0.0"
info: { title: Widgets, version: "1.0.0" }
paths:
  /widgets/{id}:
    get:
      summary: Fetch a widget
      parameters:
        - { name: id, in: path, required: true, schema: { type: string } }
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: object
                properties:
                  id: { type: string }
                  name: { type: string }
"#;

    async fn service() -> ToolService {
        let app = Router::new().route(
            "/widgets/{id}",
            get(|Path(id): Path<String>| async move {
                if id == "abc" {
                    (StatusCode::OK, Json(json!({"id": "abc", "name": "Sprocket"})))
                } else {
                    (StatusCode::NOT_FOUND, Json(json!({"detail": "not found"})))
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        let doc: Value = serde_yaml::from_str(WIDGETS).expect("yaml");
        let catalog = ToolCatalog::build(&doc, &CatalogOptions::default()).expect("catalog");
        let executor =
            CallExecutor::new(ExecutorConfig::new(format!("http://{addr}"))).expect("executor");
        ToolService::new(catalog, executor)
    }

    #[tokio::test]
    async fn widgets_end_to_end() {
        let service = service().await;

        let tools = service.list_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "get_widgets_id");
        let annotations = tools[0].annotations.as_ref().expect("annotations");
        assert_eq!(annotations.read_only_hint, Some(true));
        let output = tools[0].output_schema.as_ref().expect("output schema");
        assert_eq!(output["properties"]["body"]["type"], "object");

        let args = json!({"id": "abc"});
        let result = service
            .call_tool("get_widgets_id", args.as_object(), None)
            .await;
        match result {
            ToolResult::Success(s) => {
                assert_eq!(s.status, 200);
                assert_eq!(
                    s.body,
                    ResponseBody::Json(json!({"id": "abc", "name": "Sprocket"}))
                );
            }
            ToolResult::Failure(e) => panic!("unexpected failure: {e}"),
        }
    }

    #[tokio::test]
    async fn upstream_not_found_is_a_tool_error() {
        let service = service().await;
        let args = json!({"id": "zzz"});
        let result = service
            .call_tool("get_widgets_id", args.as_object(), None)
            .await;
        let ToolResult::Failure(err) = result else {
            panic!("expected failure");
        };
        assert_eq!(err.kind, ToolErrorKind::Upstream);
        assert_eq!(err.status, Some(404));
        assert_eq!(err.body, Some(ResponseBody::Json(json!({"detail": "not found"}))));
    }

    #[tokio::test]
    async fn unknown_tool_lists_available_names() {
        let service = service().await;
        let ToolResult::Failure(err) = service.call_tool("nope", None, None).await else {
            panic!("expected failure");
        };
        assert_eq!(err.kind, ToolErrorKind::UnknownTool);
        assert!(err.message.contains("get_widgets_id"));
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_upstream() {
        let service = service().await;
        let ToolResult::Failure(err) = service.call_tool("get_widgets_id", None, None).await else {
            panic!("expected failure");
        };
        assert_eq!(err.kind, ToolErrorKind::InvalidArguments);
        assert!(err.message.contains("id"));
    }

    #[tokio::test]
    async fn exposes_upstream_and_operation_labels() {
        let service = service().await;
        assert_eq!(service.executor().base_url().scheme(), "http");
        assert_eq!(
            service.executor().base_url().host_str(),
            Some("127.0.0.1")
        );
        let tool = service.catalog().get("get_widgets_id").expect("tool");
        assert_eq!(tool.operation_label(), "GET /widgets/{id}");
    }
}
