/// reqwest-backed dispatcher for the GNews API

use async_trait::async_trait;
use reqwest::Client;

use crate::config::GNewsConfig;
use crate::domain::CanonicalParameters;
use crate::gnews::{Dispatch, DispatchError, Outcome};

/// Sends one GET request per call to the configured GNews endpoint
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    config: GNewsConfig,
    client: Client,
}

impl HttpDispatcher {
    pub fn new(config: GNewsConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("gnews-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GNewsConfig {
        &self.config
    }
}

#[async_trait]
impl Dispatch for HttpDispatcher {
    async fn dispatch(&self, params: &CanonicalParameters) -> Result<Outcome, DispatchError> {
        let api_key = self.config.api_key().ok_or(DispatchError::MissingCredential)?;

        let url = self.config.endpoint_url(params.operation());
        let mut query = params.query_pairs();

        tracing::debug!(
            url = %url,
            params = ?query,
            "Making GNews request"
        );

        query.push(("apikey", api_key.to_string()));

        let response = match self.client.get(&url).query(&query).send().await {
            Ok(response) => response,
            Err(e) => {
                let cause = transport_cause(&e);
                tracing::warn!(url = %url, timeout = e.is_timeout(), "GNews request failed: {}", cause);
                return Ok(Outcome::TransportError { cause });
            }
        };

        let status = response.status().as_u16();
        tracing::debug!(status, "GNews response status");

        match response.text().await {
            Ok(body) => Ok(Outcome::from_status(status, body)),
            Err(e) => Ok(Outcome::TransportError { cause: transport_cause(&e) }),
        }
    }
}

/// Describe a reqwest failure without echoing the request URL
///
/// The URL carries the API key as a query parameter.
fn transport_cause(error: &reqwest::Error) -> String {
    let kind = if error.is_timeout() {
        "request timed out"
    } else if error.is_connect() {
        "connection failed"
    } else if error.is_body() || error.is_decode() {
        "failed to read response body"
    } else if error.is_request() {
        "request could not be sent"
    } else {
        "transport error"
    };

    match std::error::Error::source(error) {
        Some(source) => format!("{} ({})", kind, source),
        None => kind.to_string(),
    }
}
