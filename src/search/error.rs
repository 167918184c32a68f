//! Search error kinds

use crate::cache::CacheError;
use crate::network::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Rejected locally, before any network call
    #[error("invalid parameters: {0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("failed to format query list: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SearchError {
    pub fn validation(message: impl Into<String>) -> Self {
        SearchError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SearchError::Validation(_) | SearchError::Cache(CacheError::InvalidId(_))
        )
    }
}
