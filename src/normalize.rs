//! Tool result normalization
//!
//! Turns a [`ToolResult`] of any shape into printable text. Normalization
//! never fails: when no text can be extracted it falls back to compact JSON
//! and then to the default display form.

use serde_json::{Map, Value};

use crate::mcp::ToolResult;

/// Hard cap on rendered result length, in characters
pub const MAX_CHARS: usize = 3000;

/// Fields searched for content parts, in priority order
const CONTENT_FIELDS: [&str; 3] = ["content", "outputs", "data"];

/// Convert a tool result into display text.
///
/// Plain strings are returned verbatim; callers apply [`truncate_chars`]
/// before display.
pub fn to_text(result: &ToolResult) -> String {
    let data = match result {
        ToolResult::Text(text) => return text.clone(),
        ToolResult::Structured(map) if !map.is_empty() => map,
        other => return other.to_string(),
    };

    if let Some(Value::Array(parts)) = content_field(data) {
        let texts: Vec<String> = parts.iter().filter_map(part_text).collect();
        let out = texts
            .iter()
            .filter(|t| !t.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        let out = out.trim();
        if !out.is_empty() {
            return out.to_string();
        }
    }

    match serde_json::to_string(data) {
        Ok(json) => truncate_chars(&json, MAX_CHARS),
        Err(_) => result.to_string(),
    }
}

/// Truncate to at most `max` characters
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// First content field holding a non-empty value
fn content_field(data: &Map<String, Value>) -> Option<&Value> {
    CONTENT_FIELDS
        .iter()
        .filter_map(|field| data.get(*field))
        .find(|value| is_present(value))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn part_text(part: &Value) -> Option<String> {
    let part = part.as_object()?;

    if part.get("type").and_then(Value::as_str) == Some("text") {
        return Some(part.get("text").map(stringify).unwrap_or_default());
    }
    if let Some(text) = part.get("text") {
        return Some(stringify(text));
    }
    part.get("content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
