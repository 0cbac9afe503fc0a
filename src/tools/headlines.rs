/// Tool for top headlines by category
///
/// This module implements the get_top_headlines MCP tool.

use std::collections::HashMap;

use serde_json::Value;

use crate::domain::{HeadlinesParams, ParametersUsed, ResultEnvelope};
use crate::gnews::Dispatch;
use crate::tools::{input_schema, parse_arguments};
use crate::GNewsServer;

pub const HEADLINES_TOOL: &str = "get_top_headlines";

pub const HEADLINES_DESCRIPTION: &str = "Get current top headlines for a category (general, world, nation, \
business, technology, entertainment, sports, science, health), optionally narrowed by keywords, language, \
country and date range.";

pub fn headlines_input_schema() -> Value {
    input_schema::<HeadlinesParams>()
}

/// Run get_top_headlines from raw tool arguments
pub async fn call_get_top_headlines<D: Dispatch>(
    server: &GNewsServer<D>,
    args: HashMap<String, Value>,
) -> ResultEnvelope {
    let raw_query = args
        .get("q")
        .and_then(Value::as_str)
        .map(|q| q.trim().to_string())
        .unwrap_or_default();

    match parse_arguments::<HeadlinesParams>(args) {
        Ok(params) => server.get_top_headlines(params).await,
        Err(e) => ResultEnvelope::failure(e, raw_query, ParametersUsed::default()),
    }
}
