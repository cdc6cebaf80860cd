//! Output contract for question generation.

use std::collections::HashSet;

use serde_json::{json, Value};

use crate::llm_client::OutputSchema;
use crate::schema::{type_name, Violation};

pub const QUESTIONS_TOOL: &str = "record_questions";

/// Every generation produces exactly this many questions.
pub const QUESTION_COUNT: usize = 5;

pub fn questions_schema() -> OutputSchema {
    OutputSchema {
        name: QUESTIONS_TOOL,
        description: "Record the behavioral interview questions for this role.",
        schema: json!({
            "type": "object",
            "properties": {
                "questions": {
                    "type": "array",
                    "items": { "type": "string", "minLength": 1 },
                    "minItems": QUESTION_COUNT,
                    "maxItems": QUESTION_COUNT,
                    "description": "Distinct behavioral questions, in the order they should be asked.",
                }
            },
            "required": ["questions"],
        }),
    }
}

/// Validates a raw collaborator object into exactly [`QUESTION_COUNT`] trimmed,
/// non-blank, mutually distinct questions (compared case-insensitively).
pub fn validate_questions(value: &Value) -> Result<Vec<String>, Vec<Violation>> {
    let Some(root) = value.as_object() else {
        return Err(vec![Violation::WrongType {
            path: "$".to_string(),
            expected: "an object",
            found: type_name(value),
        }]);
    };

    let items = match root.get("questions") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(vec![Violation::WrongType {
                path: "questions".to_string(),
                expected: "an array",
                found: type_name(other),
            }])
        }
        None => {
            return Err(vec![Violation::Missing {
                path: "questions".to_string(),
            }])
        }
    };

    let mut violations = Vec::new();
    if items.len() != QUESTION_COUNT {
        violations.push(Violation::WrongCount {
            path: "questions".to_string(),
            expected: QUESTION_COUNT,
            found: items.len(),
        });
    }

    let mut seen = HashSet::new();
    let mut questions = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let path = format!("questions[{i}]");
        let Some(text) = item.as_str() else {
            violations.push(Violation::WrongType {
                path,
                expected: "a string",
                found: type_name(item),
            });
            continue;
        };

        let text = text.trim();
        if text.is_empty() {
            violations.push(Violation::Blank { path });
            continue;
        }
        if !seen.insert(text.to_lowercase()) {
            violations.push(Violation::Duplicate { path });
            continue;
        }
        questions.push(text.to_string());
    }

    if violations.is_empty() {
        Ok(questions)
    } else {
        Err(violations)
    }
}
