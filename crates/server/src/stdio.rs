use crate::handler::RestMcpHandler;
use rmcp::ServiceExt as _;

/// Serve MCP over stdin/stdout until the client disconnects.
///
/// # Errors
///
/// Returns an error if the MCP handshake fails or the transport breaks.
pub async fn run(handler: RestMcpHandler) -> anyhow::Result<()> {
    tracing::info!(
        tools = handler.service().catalog().len(),
        "Serving MCP on stdio"
    );

    let server = handler.serve(rmcp::transport::stdio()).await?;
    let quit_reason = server.waiting().await?;

    tracing::info!(reason = ?quit_reason, "stdio transport closed");
    Ok(())
}
