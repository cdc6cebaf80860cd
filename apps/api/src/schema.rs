//! Shared vocabulary for checking structured-completion output against its contract.
//!
//! Each engine owns its own output schema and a pure validator that turns a raw
//! `serde_json::Value` into a typed record or a list of every violation found.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A single way in which a collaborator's output broke its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    #[error("`{path}` is missing")]
    Missing { path: String },

    #[error("`{path}` must be {expected}, got {found}")]
    WrongType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("`{path}` must be an integer between {min} and {max}, got {value}")]
    OutOfRange {
        path: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("`{path}` must not be blank")]
    Blank { path: String },

    #[error("`{path}` is not part of the schema")]
    Unexpected { path: String },

    #[error("`{path}` must contain exactly {expected} items, got {found}")]
    WrongCount {
        path: String,
        expected: usize,
        found: usize,
    },

    #[error("`{path}` duplicates an earlier item")]
    Duplicate { path: String },
}

/// Human-readable JSON type name, used in violation messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "an integer",
        Value::Number(_) => "a fractional number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Joins violations into one diagnostic line for logs and stored error messages.
pub fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
