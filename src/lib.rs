/// Public library interface for the GNews MCP server
///
/// This module exports the gateway server and the public types used by the
/// binary and by tests.

use std::sync::Arc;
use thiserror::Error;

// Internal modules
mod domain;
mod gnews;
mod tools;
mod mcp;
pub mod config;

// Re-export public modules and types
pub use domain::*;
pub use gnews::{normalize, Dispatch, DispatchError, HttpDispatcher, Outcome};
pub use tools::{research_prompt, QUERY_SYNTAX_DOC};
pub use config::{ConfigError, GNewsConfig};
pub use mcp::McpServer;

/// Errors that can occur during server startup or operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Domain error: {0}")]
    Domain(#[from] domain::DomainError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Gateway server that validates tool calls and forwards them to GNews
///
/// Holds only read-only state, so one instance can serve many calls
/// concurrently.
pub struct GNewsServer<D: Dispatch = HttpDispatcher> {
    validator: Validator,
    dispatcher: D,
}

impl GNewsServer<HttpDispatcher> {
    /// Create a server that talks to the GNews API over HTTP
    ///
    /// Fails if the reference tables cannot be loaded; the server must not
    /// start with degraded validation.
    pub fn new(config: GNewsConfig) -> Result<Self, ServerError> {
        tracing::info!("Initializing GNews server with {:?}", config);

        if !config.has_credential() {
            tracing::warn!("GNEWS_API_KEY is not set; every news call will fail until it is configured");
        }

        let dispatcher = HttpDispatcher::new(config)?;
        Self::with_dispatcher(dispatcher)
    }
}

impl<D: Dispatch> GNewsServer<D> {
    /// Create a server with a custom dispatcher (useful for testing)
    pub fn with_dispatcher(dispatcher: D) -> Result<Self, ServerError> {
        let reference = Arc::new(ReferenceData::load()?);
        Ok(Self {
            validator: Validator::new(reference),
            dispatcher,
        })
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn reference(&self) -> &ReferenceData {
        self.validator.reference()
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Run one call end to end and produce its envelope
    ///
    /// Every failure, local or remote, becomes a failure envelope.
    pub async fn execute(&self, raw: RawParameters) -> ResultEnvelope {
        let tool = raw.operation().tool_name();

        let params = match self.validator.validate(&raw) {
            Ok(params) => params,
            Err(rejected) => {
                tracing::info!(tool, kind = rejected.error.kind(), "Rejected parameters: {}", rejected.error);
                return ResultEnvelope::failure(rejected.error, raw.raw_query(), rejected.parameters_used);
            }
        };

        let parameters_used = ParametersUsed::from(&params);
        let query = params.query_label();

        match self.dispatcher.dispatch(&params).await {
            Ok(outcome) => gnews::normalize(outcome, parameters_used, query),
            Err(DispatchError::MissingCredential) => {
                tracing::warn!(tool, "Refusing to call GNews without an API key");
                ResultEnvelope::failure(GatewayError::MissingCredential, query, parameters_used)
            }
        }
    }

    /// Search GNews articles by keywords
    pub async fn search_news(&self, params: SearchParams) -> ResultEnvelope {
        self.execute(RawParameters::Search(params)).await
    }

    /// Fetch top headlines for a category
    pub async fn get_top_headlines(&self, params: HeadlinesParams) -> ResultEnvelope {
        self.execute(RawParameters::Headlines(params)).await
    }
}

impl<D: Dispatch + 'static> GNewsServer<D> {
    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// This method will block until stdin is closed or an error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(
            languages = self.reference().languages.len(),
            countries = self.reference().countries.len(),
            "Starting MCP server..."
        );

        let mcp_server = McpServer::new(Arc::new(self));
        mcp_server.run().await
    }
}
