/// Domain module containing the request model and its validation rules
///
/// This module defines the reference tables, the raw and canonical parameter
/// types, the validator that turns one into the other, and the result
/// envelope handed back to MCP clients.

pub mod reference;
pub mod params;
pub mod validate;
pub mod envelope;

// Re-export public types for easy access
pub use reference::*;
pub use params::*;
pub use validate::*;
pub use envelope::*;

use thiserror::Error;

/// Errors that can occur while loading domain data at startup
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Reference data error: {0}")]
    ReferenceData(String),
}

/// A request parameter failed validation
///
/// These never reach the network: the validator stops at the first one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter '{field}'")]
    MissingRequiredField { field: &'static str },

    #[error("Invalid {} code '{value}' for parameter '{field}'", code_kind(.field))]
    InvalidCode { field: &'static str, value: String },

    #[error("Invalid category '{value}'. Valid options: general, world, nation, business, technology, entertainment, sports, science, health")]
    InvalidCategory { value: String },

    #[error("Parameter '{field}' must be {}, got {value}", range_text(.min, .max))]
    OutOfRange { field: &'static str, value: i64, min: i64, max: Option<i64> },

    #[error("Parameter '{field}' must be an integer, got '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid date '{value}' for parameter '{field}'; expected ISO-8601 such as 2024-01-31T00:00:00Z")]
    InvalidDate { field: &'static str, value: String },

    #[error("Invalid date range: 'from' ({from}) is after 'to' ({to})")]
    InvalidRange { from: String, to: String },

    #[error("Invalid value '{value}' for parameter '{field}'. Valid options: {allowed}")]
    InvalidEnum { field: &'static str, value: String, allowed: &'static str },

    #[error("Malformed arguments: {detail}")]
    MalformedArguments { detail: String },
}

impl ValidationError {
    /// Stable machine-readable name for this error
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::MissingRequiredField { .. } => "missing_required_field",
            ValidationError::InvalidCode { .. } => "invalid_code",
            ValidationError::InvalidCategory { .. } => "invalid_category",
            ValidationError::OutOfRange { .. } => "out_of_range",
            ValidationError::InvalidNumber { .. } => "invalid_number",
            ValidationError::InvalidDate { .. } => "invalid_date",
            ValidationError::InvalidRange { .. } => "invalid_range",
            ValidationError::InvalidEnum { .. } => "invalid_enum",
            ValidationError::MalformedArguments { .. } => "malformed_arguments",
        }
    }
}

fn code_kind(field: &str) -> &'static str {
    match field {
        "lang" => "language",
        "country" => "country",
        _ => "reference",
    }
}

fn range_text(min: &i64, max: &Option<i64>) -> String {
    match max {
        Some(max) => format!("between {} and {}", min, max),
        None => format!("at least {}", min),
    }
}
