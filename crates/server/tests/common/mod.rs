#![allow(dead_code)]

use anyhow::Context as _;
use futures::StreamExt as _;
use serde_json::{Value, json};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tokio::io::AsyncBufReadExt as _;
use tokio_util::io::StreamReader;

pub use restmcp_test_support::{ServerProcess, pick_unused_port};

/// Environment variables the binary reads that must not leak in from the test runner.
const SERVER_ENV: &[&str] = &[
    "MCP_TRANSPORT",
    "API_BASE_URL",
    "OPENAPI_SPEC",
    "OPENAPI_JSON",
    "OPENAPI_SPEC_HASH",
    "OPENAPI_SPEC_HASH_POLICY",
    "API_TOKEN",
    "API_TOKEN_PREFIX",
    "AUTH_HEADER_NAME",
    "AUTH_MODE",
    "FORWARD_PROCESS_TOKEN",
    "SERVER_TITLE",
    "HTTP_MCP_SERVER_HOST",
    "HTTP_MCP_SERVER_PORT",
    "MCP_PUBLIC_URL",
    "INCLUDE_OPERATIONS",
    "EXCLUDE_OPERATIONS",
];

fn server_command(spec_path: &Path, api_base: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_restmcp-server"));
    for key in SERVER_ENV {
        cmd.env_remove(key);
    }
    cmd.arg("--spec")
        .arg(spec_path)
        .arg("--base-url")
        .arg(api_base)
        .arg("--log-level")
        .arg("info");
    cmd
}

/// Spawn the HTTP transport and wait until `/health` answers.
pub async fn start_http_server(
    spec_path: &Path,
    api_base: &str,
    extra_args: &[&str],
) -> anyhow::Result<ServerProcess> {
    let port = pick_unused_port()?;
    let child = server_command(spec_path, api_base)
        .arg("--transport")
        .arg("http")
        .arg("--port")
        .arg(port.to_string())
        .args(extra_args)
        .spawn()
        .context("spawn restmcp-server (http)")?;
    let mut server = ServerProcess::new(child, Some(port));
    server.wait_healthy(Duration::from_secs(20)).await?;
    Ok(server)
}

pub fn spawn_stdio_server(spec_path: &Path, api_base: &str) -> anyhow::Result<ServerProcess> {
    let child = server_command(spec_path, api_base)
        .arg("--transport")
        .arg("stdio")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .context("spawn restmcp-server (stdio)")?;
    Ok(ServerProcess::new(child, None))
}

/// Bind an ephemeral port and serve `app` on it, returning the base URL.
pub async fn serve_upstream(app: axum::Router) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind upstream")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

/// One JSON-RPC request against the stateless `/mcp` endpoint.
pub async fn mcp_request(
    base_url: &str,
    authorization: Option<&str>,
    id: u64,
    method: &str,
    params: Value,
) -> anyhow::Result<Value> {
    let client = reqwest::Client::new();
    let mut req = client
        .post(format!("{}/mcp", base_url.trim_end_matches('/')))
        .header("Accept", "application/json, text/event-stream")
        .header("Content-Type", "application/json")
        .json(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }));
    if let Some(value) = authorization {
        req = req.header("Authorization", value);
    }

    let resp = req
        .send()
        .await
        .context("POST /mcp")?
        .error_for_status()
        .context("POST /mcp status")?;

    let is_json = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    if is_json {
        return resp.json().await.context("parse JSON response");
    }

    tokio::time::timeout(Duration::from_secs(20), read_event_stream_response(resp))
        .await
        .context("timeout waiting for event-stream response")?
}

/// First event-stream message that is a JSON-RPC response (priming events are skipped).
async fn read_event_stream_response(resp: reqwest::Response) -> anyhow::Result<Value> {
    let mut stream = resp.bytes_stream();
    let byte_stream = futures::stream::poll_fn(move |cx| stream.poll_next_unpin(cx))
        .map(|r| r.map_err(std::io::Error::other));
    let reader = StreamReader::new(byte_stream);
    let mut lines = tokio::io::BufReader::new(reader).lines();

    let mut data_lines: Vec<String> = Vec::new();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim_end().to_string();

        if line.is_empty() {
            if data_lines.is_empty() {
                continue;
            }
            let data = data_lines.join("\n");
            data_lines.clear();
            if let Ok(msg) = serde_json::from_str::<Value>(&data)
                && (msg.get("result").is_some() || msg.get("error").is_some())
            {
                return Ok(msg);
            }
            continue;
        }

        if let Some(v) = line.strip_prefix("data:") {
            let v = v.trim();
            if !v.is_empty() {
                data_lines.push(v.to_string());
            }
        }
    }

    anyhow::bail!("event-stream ended without a JSON-RPC response")
}

pub fn widgets_spec() -> &'static str {
    r"openapi: 3.0.3
info:
  title: Widgets
  version: 1.0.0
  description: Widget inventory
components:
  securitySchemes:
    bearer:
      type: http
      scheme: bearer
paths:
  /widgets/{id}:
    get:
      summary: Fetch a widget
      parameters:
        - name: id
          in: path
          required: true
          schema:
            type: string
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema:
                type: object
                properties:
                  id:
                    type: string
  /secure:
    get:
      operationId: readSecret
      security:
        - bearer: []
      responses:
        '200':
          description: ok
"
}

pub fn write_spec(dir: &tempfile::TempDir, text: &str) -> anyhow::Result<std::path::PathBuf> {
    let path = dir.path().join("openapi.yaml");
    std::fs::write(&path, text).context("write spec")?;
    Ok(path)
}
