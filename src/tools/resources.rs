/// Read-only advisory resources
///
/// Dumps of the supported language and country tables plus documentation of
/// the query syntax GNews accepts. Pure formatting over static data.

use crate::domain::ReferenceData;

pub const LANGUAGES_URI: &str = "gnews://languages";
pub const COUNTRIES_URI: &str = "gnews://countries";
pub const QUERY_SYNTAX_URI: &str = "gnews://query-syntax";

/// A resource advertised by resources/list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewsResource {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
}

pub const RESOURCES: [NewsResource; 3] = [
    NewsResource {
        uri: LANGUAGES_URI,
        name: "Supported languages",
        description: "Language codes accepted by the 'lang' parameter, mapped to their names",
        mime_type: "application/json",
    },
    NewsResource {
        uri: COUNTRIES_URI,
        name: "Supported countries",
        description: "Country codes accepted by the 'country' parameter, mapped to their names",
        mime_type: "application/json",
    },
    NewsResource {
        uri: QUERY_SYNTAX_URI,
        name: "Query syntax",
        description: "How to write search queries: phrases, logical operators and search fields",
        mime_type: "text/markdown",
    },
];

pub const QUERY_SYNTAX_DOC: &str = r#"# GNews query syntax

The `q` parameter is sent to GNews exactly as written.

## Keywords
- `Apple iPhone` matches articles containing both words (a space acts as AND).
- Queries cannot start with an operator and should stay under 200 characters.

## Exact phrases
- `"Apple iPhone"` matches the phrase exactly. Use double quotes.
- Special characters such as `!`, `?` or `-` must be inside a quoted phrase.

## Logical operators
Operators must be written in upper case.
- `Apple AND iPhone` requires both terms.
- `Apple OR Microsoft` accepts either term.
- `Apple NOT iPhone` excludes articles containing `iPhone`.

Precedence: `NOT` binds tightest, then `AND`, then `OR`.
Use parentheses to group: `(Windows 7) AND (Windows 10)`.

## Search fields
The `in` parameter limits where keywords are looked for. It takes a
comma-separated list of `title`, `description` and `content`, for example
`in=title,description`. By default GNews searches title and description.

## Related parameters
- `from` / `to`: ISO-8601 dates such as `2024-01-31T00:00:00Z`.
- `sortby`: `publishedAt` (newest first, default) or `relevance`.
- `nullable`: fields allowed to be null, from `description`, `content`, `image`.
"#;

pub fn list_resources() -> &'static [NewsResource] {
    &RESOURCES
}

/// Render a resource as (mime type, text), or None for an unknown URI
pub fn read_resource(reference: &ReferenceData, uri: &str) -> Option<(&'static str, String)> {
    match uri {
        LANGUAGES_URI => Some(("application/json", pretty(&reference.languages.to_json()))),
        COUNTRIES_URI => Some(("application/json", pretty(&reference.countries.to_json()))),
        QUERY_SYNTAX_URI => Some(("text/markdown", QUERY_SYNTAX_DOC.to_string())),
        _ => None,
    }
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
