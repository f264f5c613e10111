//! Reading producer input from JSON documents or plain text lines.

use super::value::Value;
use crate::error::InputError;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Read a JSON array of values.
///
/// Strings become `Text`, integers become `Number`, and every other JSON
/// kind is kept as `Unsupported` so the pipeline can drop it.
pub fn values_from_json<R: Read>(reader: R) -> Result<Vec<Value>, InputError> {
    let document: serde_json::Value = serde_json::from_reader(reader)?;
    match document {
        serde_json::Value::Array(items) => Ok(items.into_iter().map(Value::from).collect()),
        other => Err(InputError::NotAnArray {
            found: json_kind(&other).to_string(),
        }),
    }
}

/// Read one value per non-empty line.
pub fn values_from_lines<R: BufRead>(reader: R) -> Result<Vec<Value>, InputError> {
    let mut values = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            values.push(Value::parse(trimmed));
        }
    }
    Ok(values)
}

/// Read values from a file, as JSON if the extension is `.json`, else as lines.
pub fn values_from_path(path: &Path) -> Result<Vec<Value>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        values_from_json(BufReader::new(file))
    } else {
        values_from_lines(BufReader::new(file))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
