//! Error types for the server binary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid command line / environment configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The `OpenAPI` document could not be fetched, read or parsed
    #[error("Spec load error: {0}")]
    SpecLoad(String),

    /// Startup errors (catalog build, bind failures)
    #[error("Startup error: {0}")]
    Startup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<restmcp_openapi_tools::OpenApiToolsError> for ServerError {
    fn from(value: restmcp_openapi_tools::OpenApiToolsError) -> Self {
        use restmcp_openapi_tools::OpenApiToolsError;
        match value {
            OpenApiToolsError::Config(msg) => Self::Config(msg),
            e @ (OpenApiToolsError::SpecParse(_) | OpenApiToolsError::SpecHashMismatch { .. }) => {
                Self::SpecLoad(e.to_string())
            }
            other => Self::Startup(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
