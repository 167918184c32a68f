//! Search orchestration module
//!
//! Turns typed search parameters into a single completions request, applies
//! per-operation defaults, and renders the reply as text.

mod arguments;
mod error;
mod executor;
mod models;
mod reply;

pub use arguments::Arguments;
pub use error::SearchError;
pub use executor::Search;
pub use models::*;
pub use reply::{SearchReply, EMPTY_ANSWER};
