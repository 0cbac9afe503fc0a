/// Mapping of GNews responses into result envelopes

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{Article, GatewayError, ParametersUsed, ResultEnvelope};
use crate::gnews::Outcome;

/// Success payload as GNews sends it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPayload {
    total_articles: u64,
    articles: Vec<ExternalArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExternalArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    source: Option<ExternalSource>,
}

#[derive(Debug, Deserialize)]
struct ExternalSource {
    #[serde(default)]
    name: Option<String>,
}

impl From<ExternalArticle> for Article {
    fn from(article: ExternalArticle) -> Self {
        Article {
            title: article.title,
            description: article.description,
            url: article.url,
            source: article.source.and_then(|s| s.name),
            published_at: article.published_at,
            image: article.image,
        }
    }
}

/// Shape a dispatch outcome into the envelope returned to the client
pub fn normalize(outcome: Outcome, parameters_used: ParametersUsed, query: String) -> ResultEnvelope {
    match outcome {
        Outcome::Ok { body, .. } => match serde_json::from_str::<SearchPayload>(&body) {
            Ok(payload) => {
                tracing::info!(
                    total = payload.total_articles,
                    returned = payload.articles.len(),
                    "GNews request succeeded"
                );
                ResultEnvelope::Success {
                    query,
                    total_articles: payload.total_articles,
                    articles: payload.articles.into_iter().map(Article::from).collect(),
                    parameters_used,
                }
            }
            Err(e) => {
                tracing::warn!("Unexpected GNews payload: {}", e);
                ResultEnvelope::failure(
                    GatewayError::MalformedResponse { detail: e.to_string() },
                    query,
                    parameters_used,
                )
            }
        },
        Outcome::ExternalError { status, body } => {
            let error = external_error(status, &body);
            tracing::warn!(status, kind = error.kind(), "GNews returned an error: {}", error);
            ResultEnvelope::failure(error, query, parameters_used)
        }
        Outcome::TransportError { cause } => {
            ResultEnvelope::failure(GatewayError::Transport { cause }, query, parameters_used)
        }
    }
}

/// Build the error for a non-2xx response
fn external_error(status: u16, body: &str) -> GatewayError {
    let message = extract_message(body);

    if status == 429 {
        let message = match message {
            Some(m) => format!("Rate limit exceeded: {}", m),
            None => "Rate limit exceeded: the GNews request quota has been reached, try again later".to_string(),
        };
        return GatewayError::RateLimited { message };
    }

    let message = message.unwrap_or_else(|| {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown Status");
        format!("News service returned HTTP {} ({})", status, reason)
    });
    GatewayError::External { status, message }
}

/// Pull the error text out of a GNews error body
///
/// GNews reports `{"errors": [...]}` or `{"errors": {"field": "..."}}`;
/// a top-level `error` or `message` string is accepted as well.
fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    let from_errors = match value.get("errors") {
        Some(Value::Array(items)) => join_strings(items.iter()),
        Some(Value::Object(map)) => join_strings(map.values()),
        Some(Value::String(s)) => non_empty(s),
        _ => None,
    };

    from_errors
        .or_else(|| value.get("error").and_then(Value::as_str).and_then(non_empty))
        .or_else(|| value.get("message").and_then(Value::as_str).and_then(non_empty))
}

fn join_strings<'a>(values: impl Iterator<Item = &'a Value>) -> Option<String> {
    let parts: Vec<&str> = values
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
