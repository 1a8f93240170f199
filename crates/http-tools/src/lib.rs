//! Shared outbound HTTP helpers.
//!
//! Used by `restmcp-openapi-tools` when turning tool calls into upstream requests. Nothing in here
//! knows about `OpenAPI`; it only deals with URLs, bodies and MCP tool hints.

pub mod content;
pub mod encoding;
pub mod safety;
pub mod semantics;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpToolsError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http transport error: {0}")]
    Transport(String),
    #[error("response too large: {0}")]
    TooLarge(String),
}

pub type Result<T> = std::result::Result<T, HttpToolsError>;

impl From<reqwest::Error> for HttpToolsError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(safety::sanitize_reqwest_error(&value))
    }
}
