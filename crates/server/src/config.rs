//! Command line / environment configuration.
//!
//! Everything is read once at startup and turned into the immutable library configs
//! ([`ExecutorConfig`], [`CatalogOptions`]).

use crate::error::{Result, ServerError};
use clap::{Parser, ValueEnum};
use restmcp_openapi_tools::{AuthMode, CatalogOptions, Credential, ExecutorConfig, HashPolicy};
use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// MCP over stdin/stdout.
    Stdio,
    /// Stateless streamable HTTP at `/mcp`.
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "restmcp-server", version, about)]
/// Expose a REST API described by an `OpenAPI` document as MCP tools
pub struct Cli {
    #[arg(long, env = "MCP_TRANSPORT", value_enum, default_value_t = TransportKind::Stdio)]
    pub transport: TransportKind,

    /// Base URL of the upstream API
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:8000")]
    pub base_url: String,

    /// URL or file path of the `OpenAPI` document (defaults to `<base-url>/<openapi-path>`)
    #[arg(long, env = "OPENAPI_SPEC")]
    pub spec: Option<String>,

    /// Path of the document relative to the base URL, used when `--spec` is not given
    #[arg(long, env = "OPENAPI_JSON", default_value = ".well-known/openapi.json")]
    pub openapi_path: String,

    /// Expected `sha256:<hex>` digest of the document
    #[arg(long, env = "OPENAPI_SPEC_HASH")]
    pub spec_hash: Option<String>,

    /// What to do when the digest does not match: warn, fail or ignore
    #[arg(long, env = "OPENAPI_SPEC_HASH_POLICY", default_value = "warn", value_parser = parse_hash_policy)]
    pub spec_hash_policy: HashPolicy,

    /// Credential for the upstream API
    #[arg(long, env = "API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Prefix placed before the credential (`Bearer`, `Token`, ...); empty sends it raw
    #[arg(long, env = "API_TOKEN_PREFIX")]
    pub token_prefix: Option<String>,

    /// Header that carries the credential (defaults to what the document declares)
    #[arg(long, env = "AUTH_HEADER_NAME")]
    pub auth_header: Option<String>,

    /// `spec`: only where the document declares header auth; `always`: on every call
    #[arg(long, env = "AUTH_MODE", default_value = "spec", value_parser = parse_auth_mode)]
    pub auth_mode: AuthMode,

    /// HTTP transport: use `API_TOKEN` when the MCP request carries no `Authorization` header
    #[arg(long, env = "FORWARD_PROCESS_TOKEN")]
    pub forward_process_token: bool,

    #[arg(long, env = "SERVER_TITLE", default_value = "My MCP Server")]
    pub server_title: String,

    #[arg(long, env = "HTTP_MCP_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "HTTP_MCP_SERVER_PORT", default_value_t = 9000)]
    pub port: u16,

    /// Public URL of this server, advertised in the discovery document
    #[arg(long, env = "MCP_PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Upstream responses larger than this are rejected
    #[arg(long, env = "MAX_RESPONSE_BYTES")]
    pub max_response_bytes: Option<usize>,

    /// Only expose operations matching these `"METHOD /path"` globs
    #[arg(long, env = "INCLUDE_OPERATIONS", value_delimiter = ',')]
    pub include: Vec<String>,

    /// Never expose operations matching these `"METHOD /path"` globs
    #[arg(long, env = "EXCLUDE_OPERATIONS", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

fn parse_hash_policy(s: &str) -> std::result::Result<HashPolicy, String> {
    match s.to_ascii_lowercase().as_str() {
        "warn" => Ok(HashPolicy::Warn),
        "fail" => Ok(HashPolicy::Fail),
        "ignore" => Ok(HashPolicy::Ignore),
        other => Err(format!("unknown hash policy '{other}' (expected warn, fail or ignore)")),
    }
}

fn parse_auth_mode(s: &str) -> std::result::Result<AuthMode, String> {
    match s.to_ascii_lowercase().as_str() {
        "spec" => Ok(AuthMode::Spec),
        "always" => Ok(AuthMode::Always),
        other => Err(format!("unknown auth mode '{other}' (expected spec or always)")),
    }
}

impl Cli {
    /// Where to load the document from.
    #[must_use]
    pub fn spec_location(&self) -> String {
        match &self.spec {
            Some(spec) => spec.clone(),
            None => format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                self.openapi_path.trim_start_matches('/')
            ),
        }
    }

    #[must_use]
    pub fn process_credential(&self) -> Option<Credential> {
        self.api_token.clone().and_then(Credential::new)
    }

    #[must_use]
    pub fn executor_config(&self) -> ExecutorConfig {
        let mut cfg = ExecutorConfig::new(self.base_url.clone());
        cfg.timeout_secs = self.timeout_secs;
        cfg.auth_header.clone_from(&self.auth_header);
        cfg.token_prefix.clone_from(&self.token_prefix);
        cfg.auth_mode = self.auth_mode;
        cfg.max_response_bytes = self.max_response_bytes;
        cfg
    }

    #[must_use]
    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            auth_header: self.auth_header.clone(),
        }
    }

    /// Header used when fetching the document itself, if a token is configured.
    #[must_use]
    pub fn spec_fetch_auth(&self) -> Option<(String, String)> {
        let credential = self.process_credential()?;
        let name = self
            .auth_header
            .clone()
            .unwrap_or_else(|| "Authorization".to_string());
        let value = match self.token_prefix.as_deref().unwrap_or("Bearer").trim() {
            "" => credential.expose().to_string(),
            prefix => format!("{prefix} {}", credential.expose()),
        };
        Some((name, value))
    }

    /// Public base URL of this server (no trailing slash).
    #[must_use]
    pub fn public_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }

    /// # Errors
    ///
    /// Returns an error if host and port do not form a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ServerError::Config(format!("invalid listen address: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["restmcp-server"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("parse")
    }

    #[test]
    fn defaults_derive_spec_location_from_base_url() {
        let cli = parse(&["--base-url", "http://api.local:8000/"]);
        assert_eq!(
            cli.spec_location(),
            "http://api.local:8000/.well-known/openapi.json"
        );
        assert_eq!(cli.transport, TransportKind::Stdio);
        assert_eq!(cli.executor_config().timeout_secs, 30);
    }

    #[test]
    fn explicit_spec_and_filters() {
        let cli = parse(&[
            "--spec",
            "./openapi.yaml",
            "--include",
            "GET *,POST /items",
            "--auth-mode",
            "always",
            "--spec-hash-policy",
            "fail",
        ]);
        assert_eq!(cli.spec_location(), "./openapi.yaml");
        assert_eq!(cli.catalog_options().include, ["GET *", "POST /items"]);
        assert_eq!(cli.executor_config().auth_mode, AuthMode::Always);
        assert_eq!(cli.spec_hash_policy, HashPolicy::Fail);
    }

    #[test]
    fn spec_fetch_auth_uses_prefix() {
        let cli = parse(&["--api-token", "abc"]);
        assert_eq!(
            cli.spec_fetch_auth(),
            Some(("Authorization".to_string(), "Bearer abc".to_string()))
        );

        let cli = parse(&[
            "--api-token",
            "abc",
            "--token-prefix",
            "",
            "--auth-header",
            "X-Key",
        ]);
        assert_eq!(
            cli.spec_fetch_auth(),
            Some(("X-Key".to_string(), "abc".to_string()))
        );

        assert!(parse(&[]).spec_fetch_auth().is_none());
    }

    #[test]
    fn rejects_unknown_policies() {
        assert!(Cli::try_parse_from(["restmcp-server", "--auth-mode", "sometimes"]).is_err());
    }
}
