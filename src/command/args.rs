//! `key=value` argument parsing for direct tool calls
//!
//! Parsing is permissive: anything that is not a `key=value` token is
//! dropped, so a free-text tail never produces an error.

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// A single typed argument value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

/// Arguments for one tool call, keyed by name
pub type ParsedArgs = BTreeMap<String, ArgValue>;

fn kv_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(\w+)=("([^"]*)"|[^\s]+)"#).expect("key=value pattern is valid")
    })
}

/// Parse `key=value` pairs from the tail of a direct-call line.
///
/// Supports `key="value with spaces"`, `key=123` and `key=true`/`key=false`.
/// Quoted values are always strings. Later occurrences of a key win.
pub fn parse_kv_pairs(tail: &str) -> ParsedArgs {
    let mut pairs = ParsedArgs::new();

    for caps in kv_pattern().captures_iter(tail) {
        let key = caps[1].to_string();
        let value = match caps.get(3) {
            Some(quoted) => ArgValue::Str(quoted.as_str().to_string()),
            None => coerce(&caps[2]),
        };
        pairs.insert(key, value);
    }

    pairs
}

fn coerce(raw: &str) -> ArgValue {
    // A lone `"` (from `k="`) counts as an empty quoted value
    if raw.starts_with('"') && raw.ends_with('"') {
        let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default();
        return ArgValue::Str(inner.to_string());
    }

    match raw.to_lowercase().as_str() {
        "true" => return ArgValue::Bool(true),
        "false" => return ArgValue::Bool(false),
        _ => {}
    }

    match raw.parse::<i64>() {
        Ok(n) => ArgValue::Int(n),
        Err(_) => ArgValue::Str(raw.to_string()),
    }
}

/// JSON object form of the arguments, as sent in `tools/call`
pub fn to_json(args: &ParsedArgs) -> Value {
    Value::Object(
        args.iter()
            .map(|(k, v)| {
                let value = match v {
                    ArgValue::Bool(b) => Value::Bool(*b),
                    ArgValue::Int(n) => Value::from(*n),
                    ArgValue::Str(s) => Value::String(s.clone()),
                };
                (k.clone(), value)
            })
            .collect(),
    )
}
