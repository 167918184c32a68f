//! Query module
//!
//! Holds the closed vocabularies a search call is described with and the
//! bracketed context prefix that carries structured fields into the free-text
//! query sent upstream:
//! - `[Subject: Physics] ...` for academic search
//! - `[Ticker: AAPL, Report Type: 10-K] ...` for financial search
//! - `[Filters: Language: de] ...` and `[Custom Filters: k: v] ...` for filtered search

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of search operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    #[default]
    General,
    Academic,
    Financial,
    Filtered,
}

impl SearchKind {
    pub const ALL: [SearchKind; 4] = [
        SearchKind::General,
        SearchKind::Academic,
        SearchKind::Financial,
        SearchKind::Filtered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::General => "general",
            SearchKind::Academic => "academic",
            SearchKind::Financial => "financial",
            SearchKind::Filtered => "filtered",
        }
    }

    /// Specialized searches default to the higher capability model
    pub fn prefers_pro_model(&self) -> bool {
        !matches!(self, SearchKind::General)
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SearchKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown search type '{}'", s))
    }
}

/// Recency filter understood by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recency {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Recency {
    pub const ALL: [Recency; 5] = [
        Recency::Hour,
        Recency::Day,
        Recency::Week,
        Recency::Month,
        Recency::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Recency::Hour => "hour",
            Recency::Day => "day",
            Recency::Week => "week",
            Recency::Month => "month",
            Recency::Year => "year",
        }
    }
}

impl fmt::Display for Recency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Recency::ALL
            .into_iter()
            .find(|r| r.as_str() == lowered)
            .ok_or_else(|| {
                format!(
                    "invalid search_recency_filter '{}': expected one of hour, day, week, month, year",
                    s
                )
            })
    }
}

/// Bracketed context prefix prepended to the query text
#[derive(Debug, Clone, Default)]
pub struct QueryPrefix {
    label: Option<&'static str>,
    parts: Vec<String>,
}

impl QueryPrefix {
    /// Prefix without a label: `[a, b] query`
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix with a label: `[Label: a, b] query`
    pub fn labeled(label: &'static str) -> Self {
        Self {
            label: Some(label),
            parts: Vec::new(),
        }
    }

    /// Add `name: value` when the value is present and non-blank
    pub fn field(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.parts.push(format!("{}: {}", name, value));
        }
        self
    }

    /// Add a bare value when present and non-blank
    pub fn field_value(mut self, value: Option<&str>) -> Self {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.parts.push(value.to_string());
        }
        self
    }

    /// Add `name: value` unconditionally
    pub fn entry(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.parts.push(format!("{}: {}", name, value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Prepend the prefix to `text`; an empty prefix leaves it untouched
    pub fn apply(&self, text: &str) -> String {
        if self.parts.is_empty() {
            return text.to_string();
        }
        let body = self.parts.join(", ");
        match self.label {
            Some(label) => format!("[{}: {}] {}", label, body, text),
            None => format!("[{}] {}", body, text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_kind_round_trip_names() {
        for kind in SearchKind::ALL {
            assert_eq!(kind.as_str().parse::<SearchKind>().unwrap(), kind);
        }
        assert!("news".parse::<SearchKind>().is_err());
        assert!(!SearchKind::General.prefers_pro_model());
        assert!(SearchKind::Filtered.prefers_pro_model());
    }

    #[test]
    fn test_recency_parsing() {
        assert_eq!("week".parse::<Recency>().unwrap(), Recency::Week);
        assert_eq!(" Day ".parse::<Recency>().unwrap(), Recency::Day);

        let err = "fortnight".parse::<Recency>().unwrap_err();
        assert!(err.contains("fortnight"));
    }

    #[test]
    fn test_recency_serializes_lowercase() {
        let json = serde_json::to_string(&Recency::Month).unwrap();
        assert_eq!(json, "\"month\"");
    }

    #[test]
    fn test_prefix_unlabeled() {
        let prefix = QueryPrefix::new()
            .field("Ticker", Some("AAPL"))
            .field("Company", None)
            .field("Report Type", Some("10-K"));
        assert_eq!(prefix.apply("earnings"), "[Ticker: AAPL, Report Type: 10-K] earnings");
    }

    #[test]
    fn test_prefix_labeled() {
        let prefix = QueryPrefix::labeled("Filters").field("Language", Some("German"));
        assert_eq!(prefix.apply("news"), "[Filters: Language: German] news");
    }

    #[test]
    fn test_prefix_bare_value() {
        let prefix = QueryPrefix::labeled("Subject").field_value(Some("Physics"));
        assert_eq!(prefix.apply("dark matter"), "[Subject: Physics] dark matter");
    }

    #[test]
    fn test_empty_prefix_is_identity() {
        let prefix = QueryPrefix::labeled("Filters").field("Language", Some("  "));
        assert!(prefix.is_empty());
        assert_eq!(prefix.apply("plain query"), "plain query");
    }
}
