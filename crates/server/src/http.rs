//! Stateless streamable HTTP transport.

use crate::discovery::{DiscoveryConfig, discovery_document};
use crate::handler::RestMcpHandler;
use axum::extract::State;
use axum::http::HeaderName;
use axum::routing::get;
use axum::{Json, Router};
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct AppState {
    handler: RestMcpHandler,
    discovery: Arc<DiscoveryConfig>,
}

/// Build the HTTP router: `/mcp`, `/.well-known/mcp.json` and `/health`.
pub fn router(handler: RestMcpHandler, discovery: DiscoveryConfig) -> Router {
    let mcp_handler = handler.clone();
    let mcp = StreamableHttpService::new(
        move || Ok(mcp_handler.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig {
            stateful_mode: false,
            ..Default::default()
        },
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static("mcp-session-id")]);

    Router::new()
        .nest_service("/mcp", mcp)
        .route("/.well-known/mcp.json", get(discovery_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState {
            handler,
            discovery: Arc::new(discovery),
        })
}

async fn discovery_handler(State(state): State<AppState>) -> Json<Value> {
    Json(discovery_document(state.handler.service(), &state.discovery))
}

async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "server": state.handler.title(),
        "tools": state.handler.service().catalog().len(),
    }))
}

/// Bind and serve until Ctrl-C / SIGTERM.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn run(
    handler: RestMcpHandler,
    discovery: DiscoveryConfig,
    addr: SocketAddr,
) -> anyhow::Result<()> {
    let app = router(handler, discovery);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Serving MCP on http://{addr}/mcp");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
