//! Output contract for response evaluation, and the pure check that enforces it.
//!
//! The validator never clamps: an out-of-range score is a contract violation
//! and the whole object is rejected.

use serde_json::{json, Map, Value};

use crate::evaluation::criteria::{Criterion, Evaluation, PerCriterion, Score};
use crate::llm_client::OutputSchema;
use crate::schema::{type_name, Violation};

pub const EVALUATION_TOOL: &str = "record_evaluation";

/// JSON schema sent to the structured-completion collaborator.
pub fn evaluation_schema() -> OutputSchema {
    let criterion_keys: Vec<&str> = Criterion::ALL.iter().map(|c| c.key()).collect();

    let mut score_properties = Map::new();
    let mut feedback_properties = Map::new();
    for criterion in Criterion::ALL {
        score_properties.insert(
            criterion.key().to_string(),
            json!({
                "type": "integer",
                "minimum": Score::MIN,
                "maximum": Score::MAX,
                "description": criterion.rubric(),
            }),
        );
        feedback_properties.insert(
            criterion.key().to_string(),
            json!({
                "type": "string",
                "description": format!("Concise, actionable feedback (2-3 sentences) on {criterion}."),
            }),
        );
    }

    OutputSchema {
        name: EVALUATION_TOOL,
        description: "Record the scores and feedback for one interview answer.",
        schema: json!({
            "type": "object",
            "properties": {
                "scores": {
                    "type": "object",
                    "properties": score_properties,
                    "required": criterion_keys,
                    "additionalProperties": false,
                },
                "feedback": {
                    "type": "object",
                    "properties": feedback_properties,
                    "required": criterion_keys,
                    "additionalProperties": false,
                },
                "overall_comment": {
                    "type": "string",
                    "description": "Overall assessment and key areas for improvement.",
                },
            },
            "required": ["scores", "feedback"],
        }),
    }
}

/// Validates a raw collaborator object into an [`Evaluation`], collecting every violation.
pub fn validate_evaluation(value: &Value) -> Result<Evaluation, Vec<Violation>> {
    let mut violations = Vec::new();

    let Some(root) = value.as_object() else {
        return Err(vec![Violation::WrongType {
            path: "$".to_string(),
            expected: "an object",
            found: type_name(value),
        }]);
    };

    let scores = object_field(root, "scores", &mut violations);
    let feedback = object_field(root, "feedback", &mut violations);

    for (section, object) in [("scores", scores), ("feedback", feedback)] {
        if let Some(object) = object {
            for key in object.keys() {
                if Criterion::from_key(key).is_none() {
                    violations.push(Violation::Unexpected {
                        path: format!("{section}.{key}"),
                    });
                }
            }
        }
    }

    let parsed_scores =
        PerCriterion::from_fn(|criterion| scores.and_then(|s| parse_score(s, criterion, &mut violations)));

    let parsed_feedback = PerCriterion::from_fn(|criterion| {
        // A missing scores object is already reported; don't pile five more on top.
        let score_present = scores.map_or(false, |s| s.contains_key(criterion.key()));
        feedback.and_then(|f| parse_feedback(f, criterion, score_present, &mut violations))
    });

    let overall_comment = match root.get("overall_comment") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(other) => {
            violations.push(Violation::WrongType {
                path: "overall_comment".to_string(),
                expected: "a string",
                found: type_name(other),
            });
            None
        }
    };

    if !violations.is_empty() {
        return Err(violations);
    }

    match (parsed_scores.transpose(), parsed_feedback.transpose()) {
        (Some(scores), Some(feedback)) => Ok(Evaluation {
            scores,
            feedback,
            overall_comment,
        }),
        // Every `None` above records a violation, so this arm is unreachable in practice.
        _ => Err(vec![Violation::Missing {
            path: "scores".to_string(),
        }]),
    }
}

fn object_field<'a>(
    root: &'a Map<String, Value>,
    key: &str,
    violations: &mut Vec<Violation>,
) -> Option<&'a Map<String, Value>> {
    match root.get(key) {
        Some(Value::Object(object)) => Some(object),
        Some(other) => {
            violations.push(Violation::WrongType {
                path: key.to_string(),
                expected: "an object",
                found: type_name(other),
            });
            None
        }
        None => {
            violations.push(Violation::Missing {
                path: key.to_string(),
            });
            None
        }
    }
}

fn parse_score(
    scores: &Map<String, Value>,
    criterion: Criterion,
    violations: &mut Vec<Violation>,
) -> Option<Score> {
    let path = format!("scores.{criterion}");
    let Some(raw) = scores.get(criterion.key()) else {
        violations.push(Violation::Missing { path });
        return None;
    };

    let Some(value) = raw.as_i64() else {
        violations.push(Violation::WrongType {
            path,
            expected: "an integer",
            found: type_name(raw),
        });
        return None;
    };

    match Score::try_from(value) {
        Ok(score) => Some(score),
        Err(_) => {
            violations.push(Violation::OutOfRange {
                path,
                value,
                min: Score::MIN,
                max: Score::MAX,
            });
            None
        }
    }
}

fn parse_feedback(
    feedback: &Map<String, Value>,
    criterion: Criterion,
    score_present: bool,
    violations: &mut Vec<Violation>,
) -> Option<String> {
    let path = format!("feedback.{criterion}");
    match feedback.get(criterion.key()) {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Some(Value::String(_)) => {
            violations.push(Violation::Blank { path });
            None
        }
        Some(other) => {
            violations.push(Violation::WrongType {
                path,
                expected: "a string",
                found: type_name(other),
            });
            None
        }
        None => {
            if score_present {
                violations.push(Violation::Missing { path });
            }
            None
        }
    }
}
