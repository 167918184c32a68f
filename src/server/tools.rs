//! Tool catalogue and dispatch

use super::protocol::ToolDefinition;
use crate::query::SearchKind;
use crate::search::{Arguments, Search, SearchError, SearchParams};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Tools exposed to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Search,
    AcademicSearch,
    FinancialSearch,
    FilteredSearch,
    ListPrevious,
    GetPreviousResult,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::Search,
        Tool::AcademicSearch,
        Tool::FinancialSearch,
        Tool::FilteredSearch,
        Tool::ListPrevious,
        Tool::GetPreviousResult,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Search => "search",
            Tool::AcademicSearch => "academic_search",
            Tool::FinancialSearch => "financial_search",
            Tool::FilteredSearch => "filtered_search",
            Tool::ListPrevious => "list_previous",
            Tool::GetPreviousResult => "get_previous_result",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Search kind for the four search tools
    pub fn search_kind(&self) -> Option<SearchKind> {
        match self {
            Tool::Search => Some(SearchKind::General),
            Tool::AcademicSearch => Some(SearchKind::Academic),
            Tool::FinancialSearch => Some(SearchKind::Financial),
            Tool::FilteredSearch => Some(SearchKind::Filtered),
            Tool::ListPrevious | Tool::GetPreviousResult => None,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Tool::Search => {
                "Search the web with Perplexity and return an answer with source URLs. \
                 Uses the fast default model unless a model is given."
            }
            Tool::AcademicSearch => {
                "Search scholarly sources (papers, journals, academic sites) with Perplexity's \
                 academic search mode. Optionally focus on a subject area."
            }
            Tool::FinancialSearch => {
                "Search financial data, SEC filings and market news. Optionally focus on a \
                 ticker, company or report type such as 10-K or 10-Q."
            }
            Tool::FilteredSearch => {
                "Search with content type, file type, language, country and custom filters."
            }
            Tool::ListPrevious => {
                "List previously cached search results (most recent first) with their IDs. \
                 Requires PERPLEXITY_RESULTS_ROOT_FOLDER."
            }
            Tool::GetPreviousResult => {
                "Fetch the full text of a previously cached search result by its ID."
            }
        }
    }

    fn input_schema(&self) -> Value {
        let mut properties = match self.search_kind() {
            Some(_) => common_search_properties(),
            None => Map::new(),
        };
        let mut required: Vec<&str> = Vec::new();

        match self {
            Tool::Search => {}
            Tool::AcademicSearch => {
                properties.insert(
                    "subject_area".into(),
                    string_property("Subject area to focus on, e.g. 'Computer Science'"),
                );
            }
            Tool::FinancialSearch => {
                properties.insert("ticker".into(), string_property("Stock ticker symbol, e.g. 'AAPL'"));
                properties.insert("company_name".into(), string_property("Company name"));
                properties.insert(
                    "report_type".into(),
                    string_property("Report type, e.g. '10-K', '10-Q', 'earnings'"),
                );
            }
            Tool::FilteredSearch => {
                properties.insert(
                    "content_type".into(),
                    string_property("Kind of content, e.g. 'news', 'academic papers'"),
                );
                properties.insert("file_type".into(), string_property("File type, e.g. 'pdf'"));
                properties.insert("language".into(), string_property("Content language"));
                properties.insert(
                    "country".into(),
                    string_property("Country to focus on; used as location when none is given"),
                );
                properties.insert(
                    "custom_filters".into(),
                    json!({
                        "type": "object",
                        "description": "Additional free-form filters as key/value pairs",
                        "additionalProperties": true
                    }),
                );
            }
            Tool::ListPrevious => {}
            Tool::GetPreviousResult => {
                properties.insert(
                    "unique_id".into(),
                    string_property("10-character result ID returned with a cached search"),
                );
                required.push("unique_id");
            }
        }

        if self.search_kind().is_some() {
            required.push("query");
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// All tool definitions, in a stable order
pub fn tool_definitions() -> Vec<ToolDefinition> {
    Tool::ALL.iter().map(Tool::definition).collect()
}

fn string_property(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

fn common_search_properties() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("query".into(), string_property("The search query or question"));
    properties.insert(
        "model".into(),
        string_property("Model override, e.g. 'sonar', 'sonar-pro', 'sonar-reasoning'"),
    );
    properties.insert(
        "search_domain_filter".into(),
        json!({"type": "array", "items": {"type": "string"}, "description": "Only search these domains"}),
    );
    properties.insert(
        "search_exclude_domains".into(),
        json!({"type": "array", "items": {"type": "string"}, "description": "Never search these domains"}),
    );
    properties.insert(
        "search_recency_filter".into(),
        json!({
            "type": "string",
            "enum": ["hour", "day", "week", "month", "year"],
            "description": "Only use sources published within this period"
        }),
    );
    properties.insert(
        "return_images".into(),
        json!({"type": "boolean", "description": "Include images in the response"}),
    );
    properties.insert(
        "return_related_questions".into(),
        json!({"type": "boolean", "description": "Include related questions"}),
    );
    properties.insert(
        "max_tokens".into(),
        json!({"type": "integer", "minimum": 1, "description": "Maximum tokens in the answer"}),
    );
    properties.insert(
        "temperature".into(),
        json!({"type": "number", "minimum": 0, "maximum": 2, "description": "Sampling temperature"}),
    );
    properties.insert(
        "top_p".into(),
        json!({"type": "number", "minimum": 0, "maximum": 1, "description": "Nucleus sampling threshold"}),
    );
    properties.insert(
        "top_k".into(),
        json!({"type": "integer", "minimum": 0, "description": "Top-k sampling; 0 disables it"}),
    );
    properties.insert(
        "return_citations".into(),
        json!({"type": "boolean", "description": "Citations are always returned; accepted for compatibility"}),
    );
    properties.insert(
        "search_context_size".into(),
        json!({"type": "integer", "minimum": 1, "description": "Amount of search context to retrieve"}),
    );
    properties.insert(
        "date_range_start".into(),
        string_property("Only sources published after this date (MM/DD/YYYY)"),
    );
    properties.insert(
        "date_range_end".into(),
        string_property("Only sources published before this date (MM/DD/YYYY)"),
    );
    properties.insert("location".into(), string_property("Location to bias results towards"));
    properties
}

/// Routes tool calls to the search executor
#[derive(Clone)]
pub struct ToolDispatcher {
    search: Arc<Search>,
}

impl ToolDispatcher {
    pub fn new(search: Arc<Search>) -> Self {
        Self { search }
    }

    pub fn search(&self) -> &Search {
        &self.search
    }

    /// Run the named tool with its raw arguments
    pub async fn call(&self, name: &str, args: &Map<String, Value>) -> Result<String, SearchError> {
        let tool = Tool::from_name(name).ok_or_else(|| SearchError::UnknownTool(name.to_string()))?;

        match tool {
            Tool::Search => {
                let params = SearchParams::from_arguments(SearchKind::General, args)?;
                self.search.search(params).await
            }
            Tool::AcademicSearch => {
                let params = SearchParams::from_arguments(SearchKind::Academic, args)?;
                self.search.academic_search(params).await
            }
            Tool::FinancialSearch => {
                let params = SearchParams::from_arguments(SearchKind::Financial, args)?;
                self.search.financial_search(params).await
            }
            Tool::FilteredSearch => {
                let params = SearchParams::from_arguments(SearchKind::Filtered, args)?;
                self.search.filtered_search(params).await
            }
            Tool::ListPrevious => self.search.list_previous().await,
            Tool::GetPreviousResult => {
                let unique_id = Arguments::new(args).required_string("unique_id")?;
                self.search.get_previous_result(&unique_id).await
            }
        }
    }
}
