/// Parameter validation and normalization
///
/// The validator applies the rules in a fixed order and stops at the first
/// failure. Whatever was normalized before that point is reported back with
/// the error so callers can see which combination was rejected.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use thiserror::Error;

use crate::domain::{
    format_instant, CanonicalParameters, Category, NumberLike, Operation, ParametersUsed,
    RawParameters, ReferenceData, SortBy, TokenList, ValidationError,
};

pub const DEFAULT_MAX: u32 = 10;
pub const MAX_LIMIT: u32 = 100;
pub const DEFAULT_PAGE: u32 = 1;

/// Validation failure together with the parameters normalized so far
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct Rejected {
    pub error: ValidationError,
    pub parameters_used: ParametersUsed,
}

/// Borrowed view over either raw parameter struct
struct RawView<'a> {
    q: Option<&'a str>,
    category: Option<&'a str>,
    lang: Option<&'a str>,
    country: Option<&'a str>,
    max: Option<&'a NumberLike>,
    page: Option<&'a NumberLike>,
    from: Option<&'a str>,
    to: Option<&'a str>,
    sortby: Option<&'a str>,
    search_in: Option<&'a TokenList>,
    nullable: Option<&'a TokenList>,
}

impl<'a> RawView<'a> {
    fn of(raw: &'a RawParameters) -> Self {
        match raw {
            RawParameters::Search(p) => Self {
                q: non_blank(&p.q),
                category: None,
                lang: non_blank(&p.lang),
                country: non_blank(&p.country),
                max: p.max.as_ref(),
                page: p.page.as_ref(),
                from: non_blank(&p.from),
                to: non_blank(&p.to),
                sortby: non_blank(&p.sortby),
                search_in: p.search_in.as_ref(),
                nullable: p.nullable.as_ref(),
            },
            RawParameters::Headlines(p) => Self {
                q: non_blank(&p.q),
                category: non_blank(&p.category),
                lang: non_blank(&p.lang),
                country: non_blank(&p.country),
                max: p.max.as_ref(),
                page: p.page.as_ref(),
                from: non_blank(&p.from),
                to: non_blank(&p.to),
                sortby: non_blank(&p.sortby),
                search_in: p.search_in.as_ref(),
                nullable: p.nullable.as_ref(),
            },
        }
    }
}

/// Blank strings count as "not given"
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Validates raw client input against the GNews vocabulary
#[derive(Debug, Clone)]
pub struct Validator {
    reference: Arc<ReferenceData>,
}

impl Validator {
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Validate and default one call's parameters
    pub fn validate(&self, raw: &RawParameters) -> Result<CanonicalParameters, Rejected> {
        let operation = raw.operation();
        let view = RawView::of(raw);
        let mut used = ParametersUsed::default();

        let reject = |error: ValidationError, used: &ParametersUsed| Rejected {
            error,
            parameters_used: used.clone(),
        };

        // 1. presence
        let query = view.q.map(str::to_string);
        if operation == Operation::Search && query.is_none() {
            return Err(reject(ValidationError::MissingRequiredField { field: "q" }, &used));
        }
        used.q = query.clone();

        // 2. reference codes
        let lang = match view.lang {
            Some(value) => match self.reference.languages.canonical_code(value) {
                Some(code) => Some(code.to_string()),
                None => {
                    return Err(reject(
                        ValidationError::InvalidCode { field: "lang", value: value.to_string() },
                        &used,
                    ))
                }
            },
            None => None,
        };
        used.lang = lang.clone();

        let country = match view.country {
            Some(value) => match self.reference.countries.canonical_code(value) {
                Some(code) => Some(code.to_string()),
                None => {
                    return Err(reject(
                        ValidationError::InvalidCode { field: "country", value: value.to_string() },
                        &used,
                    ))
                }
            },
            None => None,
        };
        used.country = country.clone();

        // 3. category (headlines only)
        let category = match operation {
            Operation::Headlines => match view.category {
                Some(value) => match value.parse::<Category>() {
                    Ok(category) => Some(category),
                    Err(()) => {
                        return Err(reject(
                            ValidationError::InvalidCategory { value: value.to_string() },
                            &used,
                        ))
                    }
                },
                None => Some(Category::General),
            },
            Operation::Search => None,
        };
        used.category = category;

        // 4. max
        let max = match view.max {
            Some(raw_max) => {
                let value = coerce(raw_max, "max").map_err(|e| reject(e, &used))?;
                if !(1..=i64::from(MAX_LIMIT)).contains(&value) {
                    return Err(reject(
                        ValidationError::OutOfRange {
                            field: "max",
                            value,
                            min: 1,
                            max: Some(i64::from(MAX_LIMIT)),
                        },
                        &used,
                    ));
                }
                value as u32
            }
            None => DEFAULT_MAX,
        };
        used.max = Some(max);

        // 5. page
        let page = match view.page {
            Some(raw_page) => {
                let value = coerce(raw_page, "page").map_err(|e| reject(e, &used))?;
                if value < 1 || value > i64::from(u32::MAX) {
                    return Err(reject(
                        ValidationError::OutOfRange { field: "page", value, min: 1, max: None },
                        &used,
                    ));
                }
                value as u32
            }
            None => DEFAULT_PAGE,
        };
        used.page = Some(page);

        // 6. dates
        let from = match view.from {
            Some(value) => Some(
                parse_instant(value).ok_or_else(|| {
                    reject(ValidationError::InvalidDate { field: "from", value: value.to_string() }, &used)
                })?,
            ),
            None => None,
        };
        used.from = from.as_ref().map(format_instant);

        let to = match view.to {
            Some(value) => Some(
                parse_instant(value).ok_or_else(|| {
                    reject(ValidationError::InvalidDate { field: "to", value: value.to_string() }, &used)
                })?,
            ),
            None => None,
        };
        used.to = to.as_ref().map(format_instant);

        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(reject(
                    ValidationError::InvalidRange {
                        from: format_instant(&from),
                        to: format_instant(&to),
                    },
                    &used,
                ));
            }
        }

        // 7. sort mode, defaulted for search only
        let sortby = match view.sortby {
            Some(value) => match SortBy::parse(value) {
                Some(sortby) => Some(sortby),
                None => {
                    return Err(reject(
                        ValidationError::InvalidEnum {
                            field: "sortby",
                            value: value.to_string(),
                            allowed: SortBy::ALLOWED,
                        },
                        &used,
                    ))
                }
            },
            None if operation == Operation::Search => Some(SortBy::PublishedAt),
            None => None,
        };

        // 8. pass-through token lists
        let search_in = view.search_in.map(TokenList::normalize).unwrap_or_default();
        let nullable = view.nullable.map(TokenList::normalize).unwrap_or_default();

        let params = CanonicalParameters {
            operation,
            query,
            lang,
            country,
            category,
            max,
            page,
            search_in,
            nullable,
            from,
            to,
            sortby,
        };

        tracing::debug!(
            tool = operation.tool_name(),
            max = params.max,
            page = params.page,
            "Validated parameters"
        );

        Ok(params)
    }
}

fn coerce(value: &NumberLike, field: &'static str) -> Result<i64, ValidationError> {
    value.coerce().ok_or_else(|| ValidationError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Parse an ISO-8601 instant, truncated to whole seconds
///
/// Accepts RFC 3339 with any offset, a naive date-time taken as UTC, or a
/// bare date meaning midnight UTC.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    let parsed = DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive))
        })?;

    parsed.with_nanosecond(0)
}
