/// The uniform result returned for every tool call
///
/// Errors stay typed inside the envelope and are only flattened to text when
/// the envelope is serialized for the client.

use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ParametersUsed, ValidationError};

/// One normalized news article
///
/// Every field is serialized, as `null` when GNews did not provide it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub source: Option<String>,
    pub published_at: Option<String>,
    pub image: Option<String>,
}

/// Why a call ended in a failure envelope
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("GNews API key is not configured; set GNEWS_API_KEY")]
    MissingCredential,

    #[error("Unable to reach news service: {cause}")]
    Transport { cause: String },

    #[error("{message}")]
    External { status: u16, message: String },

    #[error("{message}")]
    RateLimited { message: String },

    #[error("Malformed response from news service: {detail}")]
    MalformedResponse { detail: String },
}

impl GatewayError {
    /// Stable machine-readable name for this error
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Validation(e) => e.kind(),
            GatewayError::MissingCredential => "missing_credential",
            GatewayError::Transport { .. } => "transport_error",
            GatewayError::External { .. } => "external_error",
            GatewayError::RateLimited { .. } => "rate_limited",
            GatewayError::MalformedResponse { .. } => "malformed_response",
        }
    }

    /// Whether the failure was detected before any request was sent
    pub fn is_local(&self) -> bool {
        matches!(self, GatewayError::Validation(_) | GatewayError::MissingCredential)
    }
}

/// Result of one tool call: exactly one of success or failure
#[derive(Debug, Clone, PartialEq)]
pub enum ResultEnvelope {
    Success {
        query: String,
        total_articles: u64,
        articles: Vec<Article>,
        parameters_used: ParametersUsed,
    },
    Failure {
        error: GatewayError,
        query: String,
        parameters_used: ParametersUsed,
    },
}

impl ResultEnvelope {
    pub fn failure(error: impl Into<GatewayError>, query: String, parameters_used: ParametersUsed) -> Self {
        ResultEnvelope::Failure {
            error: error.into(),
            query,
            parameters_used,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResultEnvelope::Success { .. })
    }

    pub fn query(&self) -> &str {
        match self {
            ResultEnvelope::Success { query, .. } | ResultEnvelope::Failure { query, .. } => query,
        }
    }

    pub fn parameters_used(&self) -> &ParametersUsed {
        match self {
            ResultEnvelope::Success { parameters_used, .. }
            | ResultEnvelope::Failure { parameters_used, .. } => parameters_used,
        }
    }

    /// The typed error, if this is a failure
    pub fn error(&self) -> Option<&GatewayError> {
        match self {
            ResultEnvelope::Failure { error, .. } => Some(error),
            ResultEnvelope::Success { .. } => None,
        }
    }

    pub fn articles(&self) -> &[Article] {
        match self {
            ResultEnvelope::Success { articles, .. } => articles,
            ResultEnvelope::Failure { .. } => &[],
        }
    }
}

impl Serialize for ResultEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResultEnvelope::Success {
                query,
                total_articles,
                articles,
                parameters_used,
            } => {
                let mut s = serializer.serialize_struct("ResultEnvelope", 5)?;
                s.serialize_field("success", &true)?;
                s.serialize_field("query", query)?;
                s.serialize_field("totalArticles", total_articles)?;
                s.serialize_field("articles", articles)?;
                s.serialize_field("parameters_used", parameters_used)?;
                s.end()
            }
            ResultEnvelope::Failure {
                error,
                query,
                parameters_used,
            } => {
                let mut s = serializer.serialize_struct("ResultEnvelope", 4)?;
                s.serialize_field("success", &false)?;
                s.serialize_field("error", &error.to_string())?;
                s.serialize_field("query", query)?;
                s.serialize_field("parameters_used", parameters_used)?;
                s.end()
            }
        }
    }
}
