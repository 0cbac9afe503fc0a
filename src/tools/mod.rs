/// MCP tools, resources and prompts for news search
///
/// This module contains everything external clients (like Claude) can call
/// or read: the two news tools, the advisory reference resources and the
/// research prompt builder.

use std::collections::HashMap;

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::ValidationError;

// Tool implementations live in separate files
pub mod search;
pub mod headlines;
pub mod resources;
pub mod prompt;

// Re-export tool functions for easy access
pub use search::*;
pub use headlines::*;
pub use resources::*;
pub use prompt::*;

/// Deserialize tool arguments into an operation's parameter struct
///
/// Type mismatches (for example a numeric `lang`) are reported as malformed
/// arguments rather than protocol errors.
pub fn parse_arguments<T: DeserializeOwned>(args: HashMap<String, Value>) -> Result<T, ValidationError> {
    let object: serde_json::Map<String, Value> = args.into_iter().collect();
    serde_json::from_value(Value::Object(object)).map_err(|e| ValidationError::MalformedArguments {
        detail: e.to_string(),
    })
}

/// JSON schema for a parameter struct, with subschemas inlined
pub fn input_schema<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|s| s.inline_subschemas = true)
        .into_generator();
    let root = generator.into_root_schema_for::<T>();

    let mut schema = serde_json::to_value(root).unwrap_or_else(|_| serde_json::json!({"type": "object"}));
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }
    schema
}
