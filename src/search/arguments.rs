//! Conversion of loosely typed tool arguments into [`SearchParams`]
//!
//! All presence checks, type coercion and range checks for tool input live
//! here so every search operation validates its arguments the same way.

use super::error::SearchError;
use super::models::SearchParams;
use crate::query::{Recency, SearchKind};
use serde_json::{Map, Value};

type Result<T> = std::result::Result<T, SearchError>;

/// Typed reader over a JSON argument object
pub struct Arguments<'a> {
    args: &'a Map<String, Value>,
}

impl<'a> Arguments<'a> {
    pub fn new(args: &'a Map<String, Value>) -> Self {
        Self { args }
    }

    fn present(&self, key: &str) -> Option<&'a Value> {
        self.args.get(key).filter(|v| !v.is_null())
    }

    /// Optional string; blank strings count as absent
    pub fn string(&self, key: &str) -> Result<Option<String>> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(type_error(key, "a string")),
        }
    }

    /// Required non-blank string
    pub fn required_string(&self, key: &str) -> Result<String> {
        self.string(key)?
            .ok_or_else(|| SearchError::validation(format!("{} parameter is required", key)))
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(type_error(key, "a boolean")),
        }
    }

    /// Non-negative integer; integral floats such as `1024.0` are accepted
    pub fn u32(&self, key: &str) -> Result<Option<u32>> {
        let Some(value) = self.present(key) else {
            return Ok(None);
        };
        let number = value
            .as_u64()
            .or_else(|| {
                value
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .map(|f| f as u64)
            })
            .ok_or_else(|| type_error(key, "a non-negative integer"))?;
        u32::try_from(number)
            .map(Some)
            .map_err(|_| SearchError::validation(format!("{} is too large", key)))
    }

    pub fn f64(&self, key: &str) -> Result<Option<f64>> {
        match self.present(key) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| type_error(key, "a number")),
        }
    }

    /// List of strings; a single string is accepted as a one-element list
    pub fn string_list(&self, key: &str) -> Result<Vec<String>> {
        match self.present(key) {
            None => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(vec![s.clone()]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| type_error(key, "a list of strings"))
                })
                .filter(|item| !matches!(item, Ok(s) if s.trim().is_empty()))
                .collect(),
            Some(_) => Err(type_error(key, "a list of strings")),
        }
    }

    pub fn object(&self, key: &str) -> Result<Option<&'a Map<String, Value>>> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(type_error(key, "an object")),
        }
    }
}

impl SearchParams {
    /// Build parameters for `kind` from a tool argument object.
    ///
    /// Fields that do not belong to `kind` are ignored. Unknown enum values
    /// and out-of-range numbers are rejected here, before any network call.
    pub fn from_arguments(kind: SearchKind, args: &Map<String, Value>) -> Result<Self> {
        let args = Arguments::new(args);

        let query = args.required_string("query")?;

        let search_recency_filter = args
            .string("search_recency_filter")?
            .map(|s| s.parse::<Recency>())
            .transpose()
            .map_err(SearchError::Validation)?;

        let temperature = args.f64("temperature")?;
        if let Some(t) = temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(SearchError::validation("temperature must be between 0 and 2"));
            }
        }
        let top_p = args.f64("top_p")?;
        if let Some(p) = top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(SearchError::validation("top_p must be between 0 and 1"));
            }
        }
        let max_tokens = args.u32("max_tokens")?;
        if max_tokens == Some(0) {
            return Err(SearchError::validation("max_tokens must be positive"));
        }

        let mut params = SearchParams {
            query,
            kind,
            model: args.string("model")?,
            search_domain_filter: args.string_list("search_domain_filter")?,
            search_exclude_domains: args.string_list("search_exclude_domains")?,
            search_recency_filter,
            return_citations: args.bool("return_citations")?,
            return_images: args.bool("return_images")?,
            return_related_questions: args.bool("return_related_questions")?,
            max_tokens,
            temperature,
            top_p,
            top_k: args.u32("top_k")?,
            date_range_start: args.string("date_range_start")?,
            date_range_end: args.string("date_range_end")?,
            location: args.string("location")?,
            search_context_size: args.u32("search_context_size")?,
            ..Default::default()
        };

        match kind {
            SearchKind::General => {}
            SearchKind::Academic => {
                params.subject_area = args.string("subject_area")?;
            }
            SearchKind::Financial => {
                params.ticker = args.string("ticker")?;
                params.company_name = args.string("company_name")?;
                params.report_type = args.string("report_type")?;
            }
            SearchKind::Filtered => {
                params.content_type = args.string("content_type")?;
                params.file_type = args.string("file_type")?;
                params.language = args.string("language")?;
                params.country = args.string("country")?;
                if let Some(filters) = args.object("custom_filters")? {
                    params.custom_filters = filters
                        .iter()
                        .filter(|(_, v)| !v.is_null())
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                }
            }
        }

        Ok(params)
    }
}

fn type_error(key: &str, expected: &str) -> SearchError {
    SearchError::validation(format!("{} must be {}", key, expected))
}
