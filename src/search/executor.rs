//! Search execution and orchestration

use super::error::SearchError;
use super::models::SearchParams;
use super::reply::SearchReply;
use crate::cache::{CacheError, ResultCache};
use crate::config::Settings;
use crate::network::{ChatRequest, PerplexityClient};
use crate::query::SearchKind;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Context size requested for academic searches unless the caller sets one
const ACADEMIC_CONTEXT_SIZE: u32 = 10;

/// Search executor: one remote call per search, optional result caching
pub struct Search {
    /// HTTP client for the completions API
    client: PerplexityClient,
    /// Defaults applied to each request
    settings: Arc<Settings>,
    /// On-disk result cache
    cache: ResultCache,
}

impl Search {
    /// Create a new search executor
    pub fn new(client: PerplexityClient, settings: Arc<Settings>) -> Self {
        let cache = ResultCache::new(settings.results_root().map(|p| p.to_path_buf()));
        Self {
            client,
            settings,
            cache,
        }
    }

    /// Replace the result cache
    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// General web search
    pub async fn search(&self, params: SearchParams) -> Result<String, SearchError> {
        self.execute(params.with_kind(SearchKind::General)).await
    }

    /// Scholarly search: academic search mode and a wider context window
    pub async fn academic_search(&self, params: SearchParams) -> Result<String, SearchError> {
        self.execute(params.with_kind(SearchKind::Academic)).await
    }

    /// Financial and filings search
    pub async fn financial_search(&self, params: SearchParams) -> Result<String, SearchError> {
        self.execute(params.with_kind(SearchKind::Financial)).await
    }

    /// Search with content, file type, language, country and custom filters
    pub async fn filtered_search(&self, params: SearchParams) -> Result<String, SearchError> {
        self.execute(params.with_kind(SearchKind::Filtered)).await
    }

    /// Run a search of `params.kind` and return the formatted reply
    pub async fn execute(&self, params: SearchParams) -> Result<String, SearchError> {
        if params.is_empty() {
            return Err(SearchError::validation("query parameter is required"));
        }

        let request = self.build_request(&params);
        let start = Instant::now();
        info!(
            "Executing {} search '{}' with model {}",
            params.kind, params.query, request.model
        );

        let response = self.client.complete(&request).await?;
        let reply = SearchReply::from(response);
        debug!(
            "{} search returned {} citations, {} sources in {:?}",
            params.kind,
            reply.citations.len(),
            reply.sources.len(),
            start.elapsed()
        );

        let mut text = reply.render();
        if let Some(id) = self.record(&params, &request.model, &text).await {
            text.push_str(&format!("\n\n**Result ID:** {}", id));
        }
        Ok(text)
    }

    /// Model used when the caller does not pick one
    pub fn default_model(&self, kind: SearchKind) -> &str {
        if kind.prefers_pro_model() {
            &self.settings.search.pro_model
        } else {
            &self.settings.search.default_model
        }
    }

    /// Build the wire request for `params`.
    ///
    /// Citations are always requested, whatever the caller asked for.
    pub fn build_request(&self, params: &SearchParams) -> ChatRequest {
        let defaults = &self.settings.search;
        let model = params
            .model
            .clone()
            .unwrap_or_else(|| self.default_model(params.kind).to_string());

        let mut request = ChatRequest::new(model, params.message_content());
        request.max_tokens = Some(params.max_tokens.unwrap_or(defaults.max_tokens));
        request.temperature = Some(params.temperature.unwrap_or(defaults.temperature));
        request.top_p = Some(params.top_p.unwrap_or(defaults.top_p));
        request.top_k = params.top_k.or(Some(defaults.top_k)).filter(|k| *k > 0);
        request.search_domain_filter = params.search_domain_filter.clone();
        request.search_exclude_domains = params.search_exclude_domains.clone();
        request.search_recency_filter = params.search_recency_filter;
        request.return_citations = true;
        request.return_images = params.return_images.unwrap_or(defaults.return_images);
        request.return_related_questions = params
            .return_related_questions
            .unwrap_or(defaults.return_related);
        request.date_range_start = params.date_range_start.clone();
        request.date_range_end = params.date_range_end.clone();
        request.location = params.location.clone();
        request.search_context_size = params.search_context_size;

        match params.kind {
            SearchKind::Academic => {
                request.search_mode = Some("academic".to_string());
                request.search_context_size =
                    request.search_context_size.or(Some(ACADEMIC_CONTEXT_SIZE));
            }
            SearchKind::Filtered => {
                // An explicit location wins over the country filter
                if request.location.is_none() {
                    request.location = params.country.clone();
                }
            }
            SearchKind::General | SearchKind::Financial => {}
        }

        request
    }

    /// Cache a formatted result; failures are logged and dropped
    async fn record(&self, params: &SearchParams, model: &str, text: &str) -> Option<String> {
        if !self.cache.is_enabled() {
            return None;
        }

        match self
            .cache
            .save(&params.query, params.kind, model, text, params.snapshot())
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to cache {} search result: {}", params.kind, e);
                None
            }
        }
    }

    /// List cached queries as a JSON array, most recent first
    pub async fn list_previous(&self) -> Result<String, SearchError> {
        if !self.cache.is_enabled() {
            return Err(CacheError::Disabled.into());
        }
        let items = self.cache.list().await?;
        debug!("Listing {} cached results", items.len());
        Ok(serde_json::to_string_pretty(&items)?)
    }

    /// Fetch a cached result by ID
    pub async fn get_previous_result(&self, unique_id: &str) -> Result<String, SearchError> {
        if !self.cache.is_enabled() {
            return Err(CacheError::Disabled.into());
        }
        Ok(self.cache.get(unique_id.trim()).await?)
    }
}
