/// Tool for keyword news search
///
/// This module implements the search_news MCP tool.

use std::collections::HashMap;

use serde_json::Value;

use crate::domain::{ParametersUsed, ResultEnvelope, SearchParams};
use crate::gnews::Dispatch;
use crate::tools::{input_schema, parse_arguments};
use crate::GNewsServer;

pub const SEARCH_TOOL: &str = "search_news";

pub const SEARCH_DESCRIPTION: &str = "Search news articles by keywords. The query supports exact phrases in quotes \
and AND / OR / NOT operators with parentheses. Filter by language, country, date range, fields to search in, \
and sort by publication date or relevance.";

/// Input schema of the search_news tool; `q` is required
pub fn search_input_schema() -> Value {
    let mut schema = input_schema::<SearchParams>();
    schema["required"] = serde_json::json!(["q"]);
    schema
}

/// Run search_news from raw tool arguments
pub async fn call_search_news<D: Dispatch>(
    server: &GNewsServer<D>,
    args: HashMap<String, Value>,
) -> ResultEnvelope {
    let raw_query = args
        .get("q")
        .and_then(Value::as_str)
        .map(|q| q.trim().to_string())
        .unwrap_or_default();

    match parse_arguments::<SearchParams>(args) {
        Ok(params) => server.search_news(params).await,
        Err(e) => ResultEnvelope::failure(e, raw_query, ParametersUsed::default()),
    }
}
