//! `OpenAPI` → MCP tools.
//!
//! - [`catalog`] turns an `OpenAPI` 3.x document into an ordered set of tool definitions.
//! - [`mapper`] validates tool arguments and resolves them into an HTTP request plan.
//! - [`executor`] performs the request and classifies the response.
//! - [`service`] ties the three together behind a cheap-to-clone handle.
//!
//! Nothing here knows about MCP transports; the server crate wires the service into one.

pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod executor;
pub mod mapper;
pub mod resolver;
pub mod result;
pub mod schema;
pub mod service;

pub use catalog::{ToolCatalog, ToolDefinition};
pub use config::{AuthMode, CatalogOptions, ExecutorConfig, HashPolicy};
pub use error::{OpenApiToolsError, Result};
pub use executor::{CallExecutor, Credential};
pub use mapper::{RequestPlan, map_arguments};
pub use result::{ToolError, ToolErrorKind, ToolResult};
pub use service::ToolService;
