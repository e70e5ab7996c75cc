use serde_json::Value;

/// Render a scalar JSON value as plain text.
///
/// Strings come back verbatim, numbers and booleans via `to_string`, null as
/// an empty string. Nested values are kept as compact JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
