//! Perplexity-RS: Perplexity Sonar search as MCP tools
//!
//! Exposes general, academic, financial and filtered search plus lookups of
//! previously cached results to a tool-calling client. Each search is one
//! call to the Perplexity chat completions API, rendered as markdown and
//! optionally stored in an on-disk cache.

pub mod cache;
pub mod config;
pub mod network;
pub mod query;
pub mod search;
pub mod server;

pub use cache::{CacheError, ResultCache};
pub use config::Settings;
pub use network::{ApiError, PerplexityClient};
pub use query::{Recency, SearchKind};
pub use search::{Search, SearchError, SearchParams, SearchReply};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name reported to MCP clients
pub const SERVER_NAME: &str = "perplexity";
