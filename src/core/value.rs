//! The dynamically-typed item that flows through pipeline queues.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value travelling between stages.
///
/// Only text and whole numbers are processed. Anything else is carried as
/// `Unsupported` so the drop policy is an explicit match arm in every stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// A text value, processed as-is
    Text(String),
    /// A whole number, processed as its decimal text form
    Number(i64),
    /// Any other representation; stages skip it silently
    Unsupported(String),
}

impl Value {
    /// Parse raw text: canonical whole numbers become `Number`, everything
    /// else stays `Text` byte for byte.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(number) if number.to_string() == raw => Value::Number(number),
            _ => Value::Text(raw.to_string()),
        }
    }

    /// The text a stage should process, or `None` if the value must be skipped
    pub fn into_text(self) -> Option<String> {
        match self {
            Value::Text(text) => Some(text),
            Value::Number(number) => Some(number.to_string()),
            Value::Unsupported(_) => None,
        }
    }

    /// Short label for the representation, used in logs
    pub fn kind(&self) -> &str {
        match self {
            Value::Text(_) => "text",
            Value::Number(_) => "number",
            Value::Unsupported(kind) => kind,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Value::Unsupported(_))
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Value::Number(number)
    }
}

impl From<i32> for Value {
    fn from(number: i32) -> Self {
        Value::Number(i64::from(number))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::String(text) => Value::Text(text),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(whole) => Value::Number(whole),
                None if number.is_f64() => Value::Unsupported("float".to_string()),
                None => Value::Unsupported("large integer".to_string()),
            },
            serde_json::Value::Null => Value::Unsupported("null".to_string()),
            serde_json::Value::Bool(_) => Value::Unsupported("bool".to_string()),
            serde_json::Value::Array(_) => Value::Unsupported("array".to_string()),
            serde_json::Value::Object(_) => Value::Unsupported("object".to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => write!(f, "{}", text),
            Value::Number(number) => write!(f, "{}", number),
            Value::Unsupported(kind) => write!(f, "<unsupported {}>", kind),
        }
    }
}
