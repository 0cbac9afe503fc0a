/// Static reference data used to validate request parameters
///
/// This module holds the language and country tables accepted by the GNews
/// API together with the fixed set of headline categories. The tables are
/// built once at startup and shared read-only between all calls.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Languages supported by the GNews API (ISO 639-1)
const LANGUAGES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("zh", "Chinese"),
    ("nl", "Dutch"),
    ("en", "English"),
    ("fr", "French"),
    ("de", "German"),
    ("el", "Greek"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ml", "Malayalam"),
    ("mr", "Marathi"),
    ("no", "Norwegian"),
    ("pt", "Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("es", "Spanish"),
    ("sv", "Swedish"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("uk", "Ukrainian"),
];

/// Countries supported by the GNews API (ISO 3166-1 alpha-2)
const COUNTRIES: &[(&str, &str)] = &[
    ("au", "Australia"),
    ("br", "Brazil"),
    ("ca", "Canada"),
    ("cn", "China"),
    ("eg", "Egypt"),
    ("fr", "France"),
    ("de", "Germany"),
    ("gr", "Greece"),
    ("hk", "Hong Kong"),
    ("in", "India"),
    ("ie", "Ireland"),
    ("il", "Israel"),
    ("it", "Italy"),
    ("jp", "Japan"),
    ("nl", "Netherlands"),
    ("no", "Norway"),
    ("pk", "Pakistan"),
    ("pe", "Peru"),
    ("ph", "Philippines"),
    ("pt", "Portugal"),
    ("ro", "Romania"),
    ("ru", "Russian Federation"),
    ("sg", "Singapore"),
    ("es", "Spain"),
    ("se", "Sweden"),
    ("ch", "Switzerland"),
    ("tw", "Taiwan"),
    ("ua", "Ukraine"),
    ("gb", "United Kingdom"),
    ("us", "United States"),
];

/// Immutable lookup from a two-letter code to its display name
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    name: &'static str,
    entries: BTreeMap<&'static str, &'static str>,
}

impl ReferenceTable {
    /// Build a table from static rows, rejecting malformed or duplicate codes
    fn build(name: &'static str, rows: &[(&'static str, &'static str)]) -> Result<Self, DomainError> {
        if rows.is_empty() {
            return Err(DomainError::ReferenceData(format!("{} table is empty", name)));
        }

        let mut entries = BTreeMap::new();
        for &(code, display) in rows {
            let well_formed = code.len() == 2 && code.bytes().all(|b| b.is_ascii_lowercase());
            if !well_formed {
                return Err(DomainError::ReferenceData(format!(
                    "{} table contains malformed code '{}'",
                    name, code
                )));
            }
            if entries.insert(code, display).is_some() {
                return Err(DomainError::ReferenceData(format!(
                    "{} table contains duplicate code '{}'",
                    name, code
                )));
            }
        }

        Ok(Self { name, entries })
    }

    /// Name of the table ("languages" or "countries")
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Look up a code, ignoring case and surrounding whitespace
    ///
    /// Returns the canonical (lower-case) code on a match.
    pub fn canonical_code(&self, code: &str) -> Option<&'static str> {
        let wanted = code.trim().to_ascii_lowercase();
        self.entries.get_key_value(wanted.as_str()).map(|(k, _)| *k)
    }

    /// Display name for a code, if present
    pub fn display_name(&self, code: &str) -> Option<&'static str> {
        self.canonical_code(code).and_then(|k| self.entries.get(k).copied())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries sorted by code
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }

    /// Dump the table as a JSON object of code to name
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(code, display)| (code.to_string(), serde_json::Value::from(display)))
            .collect();
        serde_json::Value::Object(map)
    }
}

/// Headline categories accepted by the top-headlines endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    World,
    Nation,
    Business,
    Technology,
    Entertainment,
    Sports,
    Science,
    Health,
}

impl Category {
    /// Every category, in the order the GNews documentation lists them
    pub const ALL: [Category; 9] = [
        Category::General,
        Category::World,
        Category::Nation,
        Category::Business,
        Category::Technology,
        Category::Entertainment,
        Category::Sports,
        Category::Science,
        Category::Health,
    ];

    /// Wire token for this category
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "general",
            Category::World => "world",
            Category::Nation => "nation",
            Category::Business => "business",
            Category::Technology => "technology",
            Category::Entertainment => "entertainment",
            Category::Sports => "sports",
            Category::Science => "science",
            Category::Health => "health",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or(())
    }
}

/// All reference data needed by the validator
///
/// Loaded once at startup. A failure here is fatal: the server must not run
/// with degraded validation.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub languages: ReferenceTable,
    pub countries: ReferenceTable,
}

impl ReferenceData {
    pub fn load() -> Result<Self, DomainError> {
        let data = Self {
            languages: ReferenceTable::build("languages", LANGUAGES)?,
            countries: ReferenceTable::build("countries", COUNTRIES)?,
        };
        tracing::debug!(
            languages = data.languages.len(),
            countries = data.countries.len(),
            categories = Category::ALL.len(),
            "Loaded reference data"
        );
        Ok(data)
    }
}
