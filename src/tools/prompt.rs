/// Research prompt builder
///
/// Renders a templated prompt that walks an assistant through researching a
/// topic with the news tools.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use thiserror::Error;

pub const RESEARCH_PROMPT: &str = "news_research";

pub const RESEARCH_DESCRIPTION: &str = "Research recent news coverage of a topic and summarize the key developments";

pub const DEFAULT_DAYS: u32 = 7;
pub const MAX_DAYS: u32 = 365;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("Missing required argument 'topic'")]
    MissingTopic,

    #[error("Argument 'days' must be an integer between 1 and 365, got '{0}'")]
    InvalidDays(String),
}

/// Render the research prompt for a topic over the last `days` days
pub fn research_prompt(topic: &str, days: u32, today: NaiveDate) -> String {
    let since = today - Duration::days(i64::from(days));
    let plural = if days == 1 { "" } else { "s" };

    format!(
        "Research the latest news about \"{topic}\" from the past {days} day{plural} \
(since {since}).\n\n\
1. Call search_news with q=\"{topic}\", from=\"{since}T00:00:00Z\" and sortby=\"publishedAt\" \
to collect recent coverage. Use max up to 100 if the topic is broad.\n\
2. If the topic fits a headline category, call get_top_headlines for that category to see \
how prominent it is.\n\
3. Summarize the key developments in chronological order, citing each article's source and \
publication date.\n\
4. Point out where sources disagree and what remains uncertain.\n\
5. Finish with a short list of the most important articles and their URLs.",
        since = since.format("%Y-%m-%d"),
    )
}

/// Build the prompt from prompts/get arguments
pub fn research_prompt_from_args(
    args: &HashMap<String, String>,
    today: NaiveDate,
) -> Result<String, PromptError> {
    let topic = args
        .get("topic")
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .ok_or(PromptError::MissingTopic)?;

    let days = match args.get("days").map(|d| d.trim()).filter(|d| !d.is_empty()) {
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|d| (1..=MAX_DAYS).contains(d))
            .ok_or_else(|| PromptError::InvalidDays(raw.to_string()))?,
        None => DEFAULT_DAYS,
    };

    Ok(research_prompt(topic, days, today))
}
