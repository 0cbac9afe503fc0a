/// Access layer for the GNews REST API
///
/// This module sends canonical parameters to GNews and turns whatever comes
/// back into a result envelope. The transport itself sits behind the
/// `Dispatch` trait so the rest of the server can run against a fake.

pub mod http;
pub mod response;

// Re-export the main client types
pub use http::*;
pub use response::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::CanonicalParameters;

/// Errors that stop a call before any request is sent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("GNews API key is not configured")]
    MissingCredential,
}

/// Transport-level outcome of one request
///
/// The body is passed through untouched; interpreting it is the
/// normalizer's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 2xx response
    Ok { status: u16, body: String },
    /// Non-2xx response, rate limiting included
    ExternalError { status: u16, body: String },
    /// DNS, connection, timeout or body-read failure
    TransportError { cause: String },
}

impl Outcome {
    /// Classify a status code and body
    pub fn from_status(status: u16, body: String) -> Self {
        if (200..300).contains(&status) {
            Outcome::Ok { status, body }
        } else {
            Outcome::ExternalError { status, body }
        }
    }
}

/// Trait defining how canonical parameters reach GNews
///
/// Implementations issue at most one request per call and never retry.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(&self, params: &CanonicalParameters) -> Result<Outcome, DispatchError>;
}
