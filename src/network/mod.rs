//! HTTP networking module
//!
//! Provides the client for the Perplexity chat completions API, its wire
//! types and error kinds.

mod client;
mod error;
mod models;

pub use client::PerplexityClient;
pub use error::ApiError;
pub use models::*;
