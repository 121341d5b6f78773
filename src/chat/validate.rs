//! Declarative field validation for chat payloads.
//!
//! Rules run against the raw JSON body before any sanitization. Every rule
//! is evaluated so the caller sees the full list of violations at once.

use serde_json::{Map, Value};

/// Constraint attached to a single field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    /// String whose trimmed length (in characters) lies in `[min, max]`.
    TrimmedLength { min: usize, max: usize },
    /// Number, or numeric string, inside `[min, max]`.
    FloatRange { min: f64, max: f64 },
}

/// A validation rule for one top-level field of the payload.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub required: bool,
    pub constraint: Constraint,
    pub message: &'static str,
}

impl FieldRule {
    /// Returns the violation message if `body` breaks this rule.
    pub fn check(&self, body: &Map<String, Value>) -> Option<&'static str> {
        match body.get(self.field) {
            None if !self.required => None,
            None => Some(self.message),
            Some(value) if self.constraint.accepts(value) => None,
            Some(_) => Some(self.message),
        }
    }
}

impl Constraint {
    fn accepts(&self, value: &Value) -> bool {
        match *self {
            Constraint::TrimmedLength { min, max } => value
                .as_str()
                .map(|s| s.trim().chars().count())
                .is_some_and(|len| len >= min && len <= max),
            Constraint::FloatRange { min, max } => {
                as_float(value).is_some_and(|f| f >= min && f <= max)
            }
        }
    }
}

/// Read a JSON number or a numeric string as `f64`.
pub fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

pub const MESSAGE_MAX_CHARS: usize = 2000;

/// Rules for `POST /api/chat`.
pub const CHAT_RULES: &[FieldRule] = &[
    FieldRule {
        field: "message",
        required: true,
        constraint: Constraint::TrimmedLength { min: 1, max: MESSAGE_MAX_CHARS },
        message: "Message must be between 1 and 2000 characters",
    },
    FieldRule {
        field: "temperature",
        required: false,
        constraint: Constraint::FloatRange { min: 0.0, max: 1.0 },
        message: "Temperature must be between 0 and 1",
    },
];

/// Evaluate every rule, returning all violation messages in rule order.
pub fn validate(body: &Map<String, Value>, rules: &[FieldRule]) -> Vec<String> {
    rules
        .iter()
        .filter_map(|rule| rule.check(body))
        .map(String::from)
        .collect()
}

/// Fields extracted from a chat payload that passed [`CHAT_RULES`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChatFields {
    /// Trimmed, not yet sanitized.
    pub message: String,
    pub temperature: f64,
}

/// Validate a chat payload and pull out its fields.
///
/// `default_temperature` applies only when the field is absent; an invalid
/// temperature is a violation, never silently replaced.
pub fn validate_chat(
    body: &Map<String, Value>,
    default_temperature: f64,
) -> Result<ChatFields, Vec<String>> {
    let violations = validate(body, CHAT_RULES);
    if !violations.is_empty() {
        return Err(violations);
    }

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    let temperature = body
        .get("temperature")
        .and_then(as_float)
        .unwrap_or(default_temperature);

    Ok(ChatFields { message, temperature })
}
