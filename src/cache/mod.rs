//! Caching module for Perplexity-RS
//!
//! Stores formatted search results on disk, one directory per result:
//!
//! ```text
//! <root>/<ID>/metadata.yaml
//! <root>/<ID>/result.md
//! ```
//!
//! Entries are written once under a fresh random ID and never updated.

use crate::query::SearchKind;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

/// Length of a result ID
pub const ID_LENGTH: usize = 10;
/// Characters an ID is drawn from
pub const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Attempts before ID generation gives up
pub const MAX_ID_ATTEMPTS: usize = 100;

const METADATA_FILE: &str = "metadata.yaml";
const RESULT_FILE: &str = "result.md";

/// Result cache failures
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("results caching is not enabled. Set PERPLEXITY_RESULTS_ROOT_FOLDER environment variable to enable caching")]
    Disabled,

    #[error("invalid unique ID format '{0}': must be {} characters from A-Z and 0-9", ID_LENGTH)]
    InvalidId(String),

    #[error("result with ID '{0}' not found")]
    NotFound(String),

    #[error("failed to generate unique ID after {0} attempts")]
    IdExhausted(usize),

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode metadata: {0}")]
    Metadata(#[from] serde_yaml::Error),
}

/// Metadata stored next to each cached result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMetadata {
    pub query: String,
    pub search_type: SearchKind,
    pub timestamp: DateTime<Utc>,
    pub model: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub parameters: serde_json::Value,
}

/// Listing projection of a cached entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheIndexItem {
    pub unique_id: String,
    pub query: String,
    #[serde(rename = "datetime")]
    pub timestamp: DateTime<Utc>,
    pub search_type: SearchKind,
}

/// Filesystem-backed cache of search results
#[derive(Debug, Clone, Default)]
pub struct ResultCache {
    root: Option<PathBuf>,
}

impl ResultCache {
    /// Create a cache rooted at `root`; `None` or an empty path disables it
    pub fn new(root: Option<PathBuf>) -> Self {
        let root = root.filter(|p| !p.as_os_str().is_empty());
        Self { root }
    }

    /// Cache with no root folder
    pub fn disabled() -> Self {
        Self { root: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.root.is_some()
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Generate an ID that does not yet name a directory under the root
    pub async fn generate_id(&self) -> Result<String, CacheError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = random_id();
            let taken = match &self.root {
                Some(root) => fs::try_exists(root.join(&id)).await?,
                None => false,
            };
            if !taken {
                return Ok(id);
            }
            debug!("Result ID {} already taken, retrying", id);
        }
        Err(CacheError::IdExhausted(MAX_ID_ATTEMPTS))
    }

    /// Persist a result and return its ID, or `None` when caching is disabled.
    ///
    /// A failure after the entry directory was created leaves that directory
    /// behind; listing skips entries without readable metadata.
    pub async fn save(
        &self,
        query: &str,
        kind: SearchKind,
        model: &str,
        result: &str,
        parameters: serde_json::Value,
    ) -> Result<Option<String>, CacheError> {
        let Some(root) = &self.root else {
            return Ok(None);
        };

        fs::create_dir_all(root).await?;
        let id = self.generate_id().await?;
        let folder = root.join(&id);
        // create_dir rather than create_dir_all so a concurrent claim of the same ID fails loudly
        fs::create_dir(&folder).await?;

        let metadata = QueryMetadata {
            query: query.to_string(),
            search_type: kind,
            timestamp: Utc::now(),
            model: model.to_string(),
            parameters,
        };
        let encoded = serde_yaml::to_string(&metadata)?;
        fs::write(folder.join(METADATA_FILE), encoded).await?;
        fs::write(folder.join(RESULT_FILE), result).await?;

        debug!("Cached {} result under {}", kind, id);
        Ok(Some(id))
    }

    /// List cached entries, most recent first
    pub async fn list(&self) -> Result<Vec<CacheIndexItem>, CacheError> {
        let Some(root) = &self.root else {
            return Ok(Vec::new());
        };

        let mut entries = match fs::read_dir(root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut items = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let unique_id = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path().join(METADATA_FILE);

            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    debug!("Skipping cache entry {}: {}", unique_id, e);
                    continue;
                }
            };
            let metadata: QueryMetadata = match serde_yaml::from_str(&content) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Skipping cache entry {} with unreadable metadata: {}", unique_id, e);
                    continue;
                }
            };

            items.push(CacheIndexItem {
                unique_id,
                query: metadata.query,
                timestamp: metadata.timestamp,
                search_type: metadata.search_type,
            });
        }

        items.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.unique_id.cmp(&b.unique_id))
        });
        Ok(items)
    }

    /// Read back a cached result
    pub async fn get(&self, id: &str) -> Result<String, CacheError> {
        let Some(root) = &self.root else {
            return Err(CacheError::Disabled);
        };
        if !is_valid_id(id) {
            return Err(CacheError::InvalidId(id.to_string()));
        }

        match fs::read_to_string(root.join(id).join(RESULT_FILE)).await {
            Ok(result) => Ok(result),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::NotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

/// Check the length and alphabet of an ID
pub fn is_valid_id(id: &str) -> bool {
    id.len() == ID_LENGTH && id.bytes().all(|b| ID_ALPHABET.contains(&b))
}

fn random_id() -> String {
    let mut rng = OsRng;
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}
