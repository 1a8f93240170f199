//! `/.well-known/mcp.json` discovery document.

use restmcp_openapi_tools::ToolService;
use restmcp_openapi_tools::catalog::ToolSecurity;
use serde_json::{Value, json};

const MCP_VERSION: &str = "2024-11-05";

/// Inputs that come from configuration rather than the catalog.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub title: String,
    /// Public base URL of this server, without trailing slash.
    pub public_url: String,
    pub spec_uri: String,
    pub auth_header: String,
    pub token_prefix: Option<String>,
}

#[must_use]
pub fn discovery_document(service: &ToolService, config: &DiscoveryConfig) -> Value {
    let catalog = service.catalog();
    let info = catalog.info();

    let tools: Vec<Value> = catalog
        .tools()
        .iter()
        .map(|tool| {
            let mut entry = json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": tool.input_schema,
            });
            if let Some(schema) = &tool.response_schema {
                entry["responses"] = json!({
                    "200": {"content": {"application/json": {"schema": schema}}}
                });
            }
            if let ToolSecurity::Header { required, .. } = &tool.security {
                entry["security"] = if *required {
                    json!([{"apiToken": []}])
                } else {
                    json!([{"apiToken": []}, {}])
                };
            }
            entry
        })
        .collect();

    let auth_required = catalog.tools().iter().any(|t| t.security.requires_credential());

    // Callers always authenticate with `Authorization: Bearer`; the upstream header and prefix
    // only affect how the token is forwarded.
    let prefix = config.token_prefix.as_deref().unwrap_or("Bearer").trim();
    let forwarded_as = if prefix.is_empty() {
        format!("{} header as-is", config.auth_header)
    } else {
        format!("{} header as '{prefix} <token>'", config.auth_header)
    };
    let scheme = json!({
        "type": "http",
        "scheme": "bearer",
        "description": format!(
            "Send the API token as 'Authorization: Bearer <token>'. It is forwarded to the API in \
             the {forwarded_as}."
        ),
    });

    json!({
        "mcpVersion": MCP_VERSION,
        "server": {
            "name": config.title,
            "version": env!("CARGO_PKG_VERSION"),
            "description": info.description.clone().unwrap_or_else(|| format!("MCP tools for {}", info.title)),
        },
        "capabilities": {
            "tools": {"listChanged": false},
            "resources": {"listChanged": false},
        },
        "tools": tools,
        "resources": [{
            "uri": config.spec_uri,
            "name": "openapi",
            "mimeType": "application/json",
        }],
        "components": {
            "securitySchemes": {"apiToken": scheme},
        },
        "security": if auth_required { json!([{"apiToken": []}]) } else { json!([]) },
        "transport": {
            "type": "http",
            "baseUrl": format!("{}/mcp", config.public_url),
            "authentication": {
                "required": auth_required,
                "methods": ["apiToken"],
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::CredentialSource;
    use axum::http::header::AUTHORIZATION;
    use axum::http::{HeaderMap, HeaderValue};
    use restmcp_openapi_tools::{CallExecutor, CatalogOptions, ExecutorConfig, ToolCatalog};

    fn service() -> ToolService {
        let doc = json!({
            "openapi": "3.0.0",
            "info": {"title": "Widgets", "version": "1"},
            "components": {"securitySchemes": {"bearer": {"type": "http", "scheme": "bearer"}}},
            "paths": {
                "/widgets/{id}": {
                    "get": {
                        "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}],
                        "security": [{"bearer": []}],
                        "responses": {"200": {"description": "ok"}}
                    }
                },
                "/ping": {"get": {"responses": {"200": {"description": "ok"}}}}
            }
        });
        let catalog = ToolCatalog::build(&doc, &CatalogOptions::default()).expect("catalog");
        let executor = CallExecutor::new(ExecutorConfig::new("http://localhost:8000")).expect("executor");
        ToolService::new(catalog, executor)
    }

    fn config() -> DiscoveryConfig {
        DiscoveryConfig {
            title: "My MCP Server".to_string(),
            public_url: "http://localhost:9000".to_string(),
            spec_uri: "http://localhost:8000/.well-known/openapi.json".to_string(),
            auth_header: "Authorization".to_string(),
            token_prefix: None,
        }
    }

    #[test]
    fn describes_tools_and_transport() {
        let doc = discovery_document(&service(), &config());
        assert_eq!(doc["mcpVersion"], "2024-11-05");
        assert_eq!(doc["server"]["name"], "My MCP Server");
        assert_eq!(doc["tools"][0]["name"], "get_widgets_id");
        assert_eq!(doc["tools"][0]["security"], json!([{"apiToken": []}]));
        assert!(doc["tools"][1].get("security").is_none());
        assert_eq!(doc["transport"]["baseUrl"], "http://localhost:9000/mcp");
        assert_eq!(doc["transport"]["authentication"]["required"], true);
        assert_eq!(doc["components"]["securitySchemes"]["apiToken"]["scheme"], "bearer");
    }

    #[test]
    fn custom_upstream_header_still_advertises_bearer() {
        let mut cfg = config();
        cfg.auth_header = "X-API-Key".to_string();
        cfg.token_prefix = Some(String::new());
        let doc = discovery_document(&service(), &cfg);
        let scheme = &doc["components"]["securitySchemes"]["apiToken"];
        assert_eq!(scheme["type"], "http");
        assert_eq!(scheme["scheme"], "bearer");
        assert!(scheme.get("name").is_none());
        let description = scheme["description"].as_str().expect("description");
        assert!(description.contains("X-API-Key header as-is"), "{description}");

        // A client following the advertised scheme gets its token picked up.
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        let source = CredentialSource::RequestHeader { fallback: None };
        let credential = source.resolve(Some(&headers)).expect("credential");
        assert_eq!(credential.expose(), "secret");
    }
}
