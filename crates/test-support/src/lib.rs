//! Helpers shared by the `restmcp-server` integration tests.

use anyhow::Context as _;
use serde_json::Value;
use std::net::TcpListener;
use std::process::Child;
use std::time::{Duration, Instant};

/// A spawned server process, killed when the test scope ends.
pub struct ServerProcess {
    child: Child,
    base_url: String,
}

impl ServerProcess {
    /// Wrap a server listening on `127.0.0.1:port`. Stdio servers pass `None`.
    #[must_use]
    pub fn new(child: Child, port: Option<u16>) -> Self {
        Self {
            child,
            base_url: port.map_or_else(String::new, |p| format!("http://127.0.0.1:{p}")),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn child_mut(&mut self) -> &mut Child {
        &mut self.child
    }

    /// Poll `/health` until it reports `"status": "ok"`, returning the health document.
    ///
    /// # Errors
    ///
    /// Returns an error if the process exits first or the timeout elapses.
    pub async fn wait_healthy(&mut self, timeout_dur: Duration) -> anyhow::Result<Value> {
        let url = format!("{}/health", self.base_url);
        let client = reqwest::Client::new();
        let start = Instant::now();
        loop {
            if let Some(status) = self.child.try_wait().context("poll server process")? {
                anyhow::bail!("server exited before becoming healthy: {status}");
            }
            if start.elapsed() > timeout_dur {
                anyhow::bail!("timed out waiting for {url}");
            }

            if let Ok(resp) = client.get(&url).send().await
                && resp.status().is_success()
                && let Ok(health) = resp.json::<Value>().await
                && health["status"] == "ok"
            {
                return Ok(health);
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Pick an unused TCP port on localhost.
///
/// The port is not reserved; another process may still bind it first.
///
/// # Errors
///
/// Returns an error if binding an ephemeral localhost port fails.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    Ok(listener.local_addr()?.port())
}
