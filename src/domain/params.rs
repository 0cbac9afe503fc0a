/// Raw and canonical request parameters
///
/// Raw parameters are what an MCP client sends: every field optional and
/// loosely typed. Canonical parameters are what the validator produces: all
/// codes checked, all defaults applied, ready to be sent to GNews and echoed
/// back to the caller as `parameters_used`.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::Category;

/// Format GNews expects for `from` and `to`
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Render an instant the way GNews expects it
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.format(WIRE_DATE_FORMAT).to_string()
}

/// Which GNews endpoint a call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Search,
    Headlines,
}

impl Operation {
    /// Path segment of the GNews endpoint, relative to the API base URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            Operation::Search => "search",
            Operation::Headlines => "top-headlines",
        }
    }

    /// MCP tool that exposes this operation
    pub fn tool_name(&self) -> &'static str {
        match self {
            Operation::Search => "search_news",
            Operation::Headlines => "get_top_headlines",
        }
    }
}

/// A number as clients actually send it: integer, float, or numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum NumberLike {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl NumberLike {
    /// Coerce to an integer, rejecting fractions and non-numeric text
    ///
    /// Whole numbers beyond the `i64` range saturate to `i64::MIN`/`i64::MAX`
    /// so range checks still see them as out of range.
    pub fn coerce(&self) -> Option<i64> {
        match self {
            NumberLike::Integer(n) => Some(*n),
            NumberLike::Float(f) => float_to_integer(*f),
            NumberLike::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| saturate_digits(s))
                    .or_else(|| s.parse::<f64>().ok().and_then(float_to_integer))
            }
        }
    }
}

fn float_to_integer(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 {
        // `as` saturates at the i64 bounds
        Some(f as i64)
    } else {
        None
    }
}

/// A signed run of digits that did not fit in an i64
fn saturate_digits(s: &str) -> Option<i64> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i64::MIN } else { i64::MAX })
}

impl fmt::Display for NumberLike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberLike::Integer(n) => write!(f, "{}", n),
            NumberLike::Float(x) => write!(f, "{}", x),
            NumberLike::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for NumberLike {
    fn from(n: i64) -> Self {
        NumberLike::Integer(n)
    }
}

/// A comma-separated token list, sent either as one string or as an array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum TokenList {
    Text(String),
    List(Vec<String>),
}

impl TokenList {
    /// Split, trim, drop empties and remove duplicates (first occurrence wins)
    pub fn normalize(&self) -> Vec<String> {
        let pieces: Vec<&str> = match self {
            TokenList::Text(s) => s.split(',').collect(),
            TokenList::List(items) => items.iter().flat_map(|s| s.split(',')).collect(),
        };

        let mut tokens: Vec<String> = Vec::new();
        for piece in pieces {
            let token = piece.trim();
            if !token.is_empty() && !tokens.iter().any(|t| t == token) {
                tokens.push(token.to_string());
            }
        }
        tokens
    }
}

/// Arguments of the `search_news` tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Search keywords. Supports phrases in quotes and AND / OR / NOT operators with parentheses
    pub q: Option<String>,
    /// Two-letter language code, e.g. 'en' (see gnews://languages)
    pub lang: Option<String>,
    /// Two-letter country code, e.g. 'us' (see gnews://countries)
    pub country: Option<String>,
    /// Number of articles to return, 1-100 (default 10)
    #[serde(alias = "max_articles")]
    pub max: Option<NumberLike>,
    /// Fields to search in, comma-separated: title, description, content
    #[serde(rename = "in")]
    pub search_in: Option<TokenList>,
    /// Fields allowed to be null, comma-separated: description, content, image
    pub nullable: Option<TokenList>,
    /// Oldest publication date, ISO-8601 (e.g. 2024-01-01T00:00:00Z)
    pub from: Option<String>,
    /// Newest publication date, ISO-8601 (e.g. 2024-01-31T23:59:59Z)
    pub to: Option<String>,
    /// Sort order: 'publishedAt' (default) or 'relevance'
    pub sortby: Option<String>,
    /// Page number, starting at 1 (default 1)
    pub page: Option<NumberLike>,
}

/// Arguments of the `get_top_headlines` tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HeadlinesParams {
    /// Headline category (default 'general'): general, world, nation, business, technology, entertainment, sports, science, health
    pub category: Option<String>,
    /// Optional keywords to narrow the headlines
    pub q: Option<String>,
    /// Two-letter language code, e.g. 'en' (see gnews://languages)
    pub lang: Option<String>,
    /// Two-letter country code, e.g. 'us' (see gnews://countries)
    pub country: Option<String>,
    /// Number of articles to return, 1-100 (default 10)
    #[serde(alias = "max_articles")]
    pub max: Option<NumberLike>,
    /// Fields to search keywords in, comma-separated: title, description, content. Checked but not sent
    #[serde(rename = "in")]
    pub search_in: Option<TokenList>,
    /// Fields allowed to be null, comma-separated: description, content, image
    pub nullable: Option<TokenList>,
    /// Oldest publication date, ISO-8601
    pub from: Option<String>,
    /// Newest publication date, ISO-8601
    pub to: Option<String>,
    /// Sort order: 'publishedAt' or 'relevance'. Checked but not sent; headlines are always newest first
    pub sortby: Option<String>,
    /// Page number, starting at 1 (default 1)
    pub page: Option<NumberLike>,
}

/// The untyped input of one call, tagged by operation
#[derive(Debug, Clone, PartialEq)]
pub enum RawParameters {
    Search(SearchParams),
    Headlines(HeadlinesParams),
}

impl RawParameters {
    pub fn operation(&self) -> Operation {
        match self {
            RawParameters::Search(_) => Operation::Search,
            RawParameters::Headlines(_) => Operation::Headlines,
        }
    }

    /// Query text as the client sent it, used to label failures
    pub fn raw_query(&self) -> String {
        let q = match self {
            RawParameters::Search(p) => p.q.as_deref(),
            RawParameters::Headlines(p) => p.q.as_deref(),
        };
        q.map(|s| s.trim().to_string()).unwrap_or_default()
    }
}

/// Sort order for the search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortBy {
    #[default]
    #[serde(rename = "publishedAt")]
    PublishedAt,
    #[serde(rename = "relevance")]
    Relevance,
}

impl SortBy {
    pub const ALLOWED: &'static str = "publishedAt, relevance";

    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::PublishedAt => "publishedAt",
            SortBy::Relevance => "relevance",
        }
    }

    /// Parse a sort mode, ignoring case
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "publishedat" => Some(SortBy::PublishedAt),
            "relevance" => Some(SortBy::Relevance),
            _ => None,
        }
    }
}

/// Validated, defaulted parameters for one call
///
/// Only the validator constructs these, so every instance satisfies the
/// range, vocabulary and ordering rules. Fields are read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalParameters {
    pub(crate) operation: Operation,
    pub(crate) query: Option<String>,
    pub(crate) lang: Option<String>,
    pub(crate) country: Option<String>,
    pub(crate) category: Option<Category>,
    pub(crate) max: u32,
    pub(crate) page: u32,
    pub(crate) search_in: Vec<String>,
    pub(crate) nullable: Vec<String>,
    pub(crate) from: Option<DateTime<Utc>>,
    pub(crate) to: Option<DateTime<Utc>>,
    pub(crate) sortby: Option<SortBy>,
}

impl CanonicalParameters {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn search_in(&self) -> &[String] {
        &self.search_in
    }

    pub fn nullable(&self) -> &[String] {
        &self.nullable
    }

    pub fn from_date(&self) -> Option<DateTime<Utc>> {
        self.from
    }

    pub fn to_date(&self) -> Option<DateTime<Utc>> {
        self.to
    }

    pub fn sortby(&self) -> Option<SortBy> {
        self.sortby
    }

    /// Label reported as `query` in the result envelope
    ///
    /// Headlines without keywords are labelled by their category, except for
    /// the general category which has no label.
    pub fn query_label(&self) -> String {
        match (&self.query, self.category) {
            (Some(q), _) => q.clone(),
            (None, Some(category)) if category != Category::General => {
                format!("category:{}", category)
            }
            _ => String::new(),
        }
    }

    /// Every set field as a GNews query-string pair, credential excluded
    ///
    /// Unset optional fields are left out entirely so GNews applies its own
    /// defaults for them. The top-headlines endpoint takes neither `in` nor
    /// `sortby`, so those stay off its query.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let searching = self.operation == Operation::Search;
        let mut pairs = Vec::new();
        if let Some(q) = &self.query {
            pairs.push(("q", q.clone()));
        }
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        if let Some(lang) = &self.lang {
            pairs.push(("lang", lang.clone()));
        }
        if let Some(country) = &self.country {
            pairs.push(("country", country.clone()));
        }
        pairs.push(("max", self.max.to_string()));
        if searching && !self.search_in.is_empty() {
            pairs.push(("in", self.search_in.join(",")));
        }
        if !self.nullable.is_empty() {
            pairs.push(("nullable", self.nullable.join(",")));
        }
        if let Some(from) = &self.from {
            pairs.push(("from", format_instant(from)));
        }
        if let Some(to) = &self.to {
            pairs.push(("to", format_instant(to)));
        }
        if let Some(sortby) = self.sortby.filter(|_| searching) {
            pairs.push(("sortby", sortby.as_str().to_string()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs
    }

    /// Re-express these parameters as raw client input
    pub fn to_raw(&self) -> RawParameters {
        let tokens = |list: &[String]| {
            if list.is_empty() {
                None
            } else {
                Some(TokenList::Text(list.join(",")))
            }
        };
        let max = Some(NumberLike::from(i64::from(self.max)));
        let page = Some(NumberLike::from(i64::from(self.page)));
        let from = self.from.as_ref().map(format_instant);
        let to = self.to.as_ref().map(format_instant);

        match self.operation {
            Operation::Search => RawParameters::Search(SearchParams {
                q: self.query.clone(),
                lang: self.lang.clone(),
                country: self.country.clone(),
                max,
                search_in: tokens(&self.search_in),
                nullable: tokens(&self.nullable),
                from,
                to,
                sortby: self.sortby.map(|s| s.as_str().to_string()),
                page,
            }),
            Operation::Headlines => RawParameters::Headlines(HeadlinesParams {
                category: self.category.map(|c| c.to_string()),
                q: self.query.clone(),
                lang: self.lang.clone(),
                country: self.country.clone(),
                max,
                search_in: tokens(&self.search_in),
                nullable: tokens(&self.nullable),
                from,
                to,
                sortby: self.sortby.map(|s| s.as_str().to_string()),
                page,
            }),
        }
    }
}

/// Parameters echoed back to the caller as `parameters_used`
///
/// Unset fields are omitted. On validation failure only the fields
/// normalized before the failing step are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParametersUsed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub search_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sortby: Option<SortBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl From<&CanonicalParameters> for ParametersUsed {
    fn from(params: &CanonicalParameters) -> Self {
        let joined = |list: &[String]| {
            if list.is_empty() {
                None
            } else {
                Some(list.join(","))
            }
        };
        Self {
            q: params.query.clone(),
            category: params.category,
            lang: params.lang.clone(),
            country: params.country.clone(),
            max: Some(params.max),
            search_in: joined(&params.search_in),
            nullable: joined(&params.nullable),
            from: params.from.as_ref().map(format_instant),
            to: params.to.as_ref().map(format_instant),
            sortby: params.sortby,
            page: Some(params.page),
        }
    }
}
