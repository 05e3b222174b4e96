//! JSON-RPC 2.0 message types used on the stdio transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An outgoing request with a numeric id
#[derive(Debug, Serialize)]
pub struct Request<'a> {
    jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl<'a> Request<'a> {
    pub fn new(id: u64, method: &'a str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// An outgoing notification; the server never replies to these
#[derive(Debug, Serialize)]
pub struct Notification<'a> {
    jsonrpc: &'static str,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl<'a> Notification<'a> {
    pub fn new(method: &'a str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
        }
    }
}

/// An incoming response. Exactly one of `result`/`error` is set.
#[derive(Debug, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub id: Value,
    /// Present only on server-initiated messages
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ErrorObject>,
}

impl Response {
    /// Servers may echo a numeric id back as a string
    pub fn id_matches(&self, expected: u64) -> bool {
        match &self.id {
            Value::Number(n) => n.as_u64() == Some(expected),
            Value::String(s) => s.parse::<u64>().ok() == Some(expected),
            _ => false,
        }
    }

    /// Notifications and server-to-client requests carry a method
    pub fn is_answer(&self) -> bool {
        self.method.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub data: Option<Value>,
}
