//! MCP tool server
//!
//! Exposes the search operations as MCP tools over stdio or HTTP.

mod handler;
mod http;
pub mod protocol;
mod stdio;
mod tools;

pub use handler::McpHandler;
pub use http::{create_router, serve_http};
pub use stdio::{serve, serve_stdio};
pub use tools::{tool_definitions, Tool, ToolDispatcher};
