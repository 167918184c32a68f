//! Search parameters and related data models

use crate::query::{QueryPrefix, Recency, SearchKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Strongly typed parameters for one search call.
///
/// `None` always means "use the configured default", never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(rename = "search_type")]
    pub kind: SearchKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_domain_filter: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_exclude_domains: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_recency_filter: Option<Recency>,
    /// Accepted for compatibility; citations are always requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_citations: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_images: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_related_questions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_context_size: Option<u32>,

    // Academic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_area: Option<String>,

    // Financial
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_type: Option<String>,

    // Filtered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_filters: BTreeMap<String, Value>,
}

impl SearchParams {
    /// Create parameters for a plain query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set the search kind
    pub fn with_kind(mut self, kind: SearchKind) -> Self {
        self.kind = kind;
        self
    }

    /// Override the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the recency filter
    pub fn with_recency(mut self, recency: Recency) -> Self {
        self.search_recency_filter = Some(recency);
        self
    }

    /// Check if query is empty
    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty()
    }

    /// Text sent as the user message: the raw query, prefixed with the
    /// type-specific context for academic, financial and filtered searches.
    pub fn message_content(&self) -> String {
        match self.kind {
            SearchKind::General => self.query.clone(),
            SearchKind::Academic => QueryPrefix::labeled("Subject")
                .field_value(self.subject_area.as_deref())
                .apply(&self.query),
            SearchKind::Financial => QueryPrefix::new()
                .field("Ticker", self.ticker.as_deref())
                .field("Company", self.company_name.as_deref())
                .field("Report Type", self.report_type.as_deref())
                .apply(&self.query),
            SearchKind::Filtered => {
                let filtered = QueryPrefix::labeled("Filters")
                    .field("Content Type", self.content_type.as_deref())
                    .field("File Type", self.file_type.as_deref())
                    .field("Language", self.language.as_deref())
                    .field("Country", self.country.as_deref())
                    .apply(&self.query);

                self.custom_filters
                    .iter()
                    .fold(QueryPrefix::labeled("Custom Filters"), |prefix, (key, value)| {
                        prefix.entry(key, display_value(value))
                    })
                    .apply(&filtered)
            }
        }
    }

    /// Snapshot stored with cached results
    pub fn snapshot(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Render a JSON value the way a person would write it: strings unquoted
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
