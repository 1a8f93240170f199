mod config;
mod discovery;
mod error;
mod handler;
mod http;
mod spec_loader;
mod stdio;

use crate::config::{Cli, LogFormat, TransportKind};
use crate::discovery::DiscoveryConfig;
use crate::handler::{CredentialSource, RestMcpHandler};
use anyhow::Context as _;
use clap::Parser;
use restmcp_http_tools::safety::redact_url;
use restmcp_openapi_tools::{CallExecutor, ToolCatalog, ToolService};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli).await {
        tracing::error!("{e:#}");
        return Err(e);
    }
    Ok(())
}

/// Logs always go to stderr; stdout belongs to the stdio transport.
fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match cli.log_format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    tracing::info!(transport = ?cli.transport, "Starting restmcp-server");

    let executor = CallExecutor::new(cli.executor_config())
        .map_err(error::ServerError::from)
        .context("invalid upstream configuration")?;

    let location = cli.spec_location();
    let fetch_auth = cli.spec_fetch_auth();
    let spec = spec_loader::load_spec(
        &location,
        fetch_auth.as_ref(),
        cli.spec_hash.as_deref(),
        cli.spec_hash_policy,
    )
    .await
    .with_context(|| format!("loading OpenAPI document from {location}"))?;

    let catalog = ToolCatalog::build(&spec.document, &cli.catalog_options())
        .map_err(error::ServerError::from)
        .context("building tool catalog")?;
    if catalog.is_empty() {
        tracing::warn!("The OpenAPI document produced no tools");
    }
    let service = ToolService::new(catalog, executor);
    tracing::info!(
        tools = service.catalog().len(),
        upstream = %redact_url(service.executor().base_url()),
        "Tool catalog ready"
    );

    match cli.transport {
        TransportKind::Stdio => {
            let handler = RestMcpHandler::new(
                service,
                spec,
                cli.server_title.clone(),
                CredentialSource::Process(cli.process_credential()),
            );
            stdio::run(handler).await
        }
        TransportKind::Http => {
            let fallback = if cli.forward_process_token {
                cli.process_credential()
            } else {
                None
            };
            let discovery = DiscoveryConfig {
                title: cli.server_title.clone(),
                public_url: cli.public_url(),
                spec_uri: spec.uri.clone(),
                auth_header: cli
                    .auth_header
                    .clone()
                    .unwrap_or_else(|| "Authorization".to_string()),
                token_prefix: cli.token_prefix.clone(),
            };
            let handler = RestMcpHandler::new(
                service,
                spec,
                cli.server_title.clone(),
                CredentialSource::RequestHeader { fallback },
            );
            http::run(handler, discovery, cli.bind_addr()?).await
        }
    }
}
