//! MCP client and session capabilities
//!
//! Client and session implementations differ in which operations they
//! offer. Optional operations are exposed as explicit probes
//! ([`Client::supports`], [`Session::supports_listing`]) next to the
//! operation itself, so callers try them in a fixed order instead of
//! assuming one API shape.

pub mod bootstrap;
pub mod catalog;
pub mod client;
pub mod jsonrpc;
pub mod stdio;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::error::{ChatError, Result};

pub use client::McpClient;
pub use stdio::StdioSession;

/// Connect-like operations a client may offer, tried after `create_session`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOp {
    Connect,
    ConnectAll,
    OpenAllSessions,
    EnsureSessions,
    Initialize,
}

impl ConnectOp {
    /// Order in which the bootstrapper tries the fallbacks
    pub const FALLBACK_ORDER: [ConnectOp; 5] = [
        ConnectOp::Connect,
        ConnectOp::ConnectAll,
        ConnectOp::OpenAllSessions,
        ConnectOp::EnsureSessions,
        ConnectOp::Initialize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectOp::Connect => "connect",
            ConnectOp::ConnectAll => "connect_all",
            ConnectOp::OpenAllSessions => "open_all_sessions",
            ConnectOp::EnsureSessions => "ensure_sessions",
            ConnectOp::Initialize => "initialize",
        }
    }
}

/// Ways a session may enumerate its tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingOp {
    ListTools,
    GetTools,
    Tools,
}

impl ListingOp {
    pub const ORDER: [ListingOp; 3] = [ListingOp::ListTools, ListingOp::GetTools, ListingOp::Tools];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingOp::ListTools => "list_tools",
            ListingOp::GetTools => "get_tools",
            ListingOp::Tools => "tools",
        }
    }
}

/// Metadata for one callable tool, as the server described it
pub type ToolDescriptor = Value;

/// A tool-call result, classified once at the transport edge
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    /// The server answered with a bare string
    Text(String),
    /// The server answered with an object (usually `{content: [...]}`)
    Structured(Map<String, Value>),
    /// Anything else, kept as its display form
    Unknown(String),
}

impl ToolResult {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => ToolResult::Text(s),
            Value::Object(map) => ToolResult::Structured(map),
            other => ToolResult::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ToolResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolResult::Text(s) | ToolResult::Unknown(s) => f.write_str(s),
            ToolResult::Structured(map) => write!(f, "{}", Value::Object(map.clone())),
        }
    }
}

/// A live connection to one tool endpoint
#[async_trait]
pub trait Session: Send + Sync {
    /// Identifier used in log output
    fn id(&self) -> &str;

    /// Invoke a tool by name with a JSON object of arguments
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult>;

    /// Whether the given listing operation exists on this session
    fn supports_listing(&self, _op: ListingOp) -> bool {
        false
    }

    /// Enumerate tool descriptors through the given listing operation
    async fn list(&self, op: ListingOp) -> Result<Vec<ToolDescriptor>> {
        Err(ChatError::unsupported(op.as_str()))
    }

    /// Release the underlying connection
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Owner of zero or more sessions
#[async_trait]
pub trait Client: Send {
    /// Currently open sessions, in creation order
    fn sessions(&self) -> Vec<Arc<dyn Session>>;

    fn supports_create_session(&self) -> bool {
        false
    }

    /// Open a session to the named service
    async fn create_session(&mut self, name: &str) -> Result<Arc<dyn Session>> {
        let _ = name;
        Err(ChatError::unsupported("create_session"))
    }

    fn supports(&self, _op: ConnectOp) -> bool {
        false
    }

    /// Run a connect-like operation; may populate [`Client::sessions`]
    async fn connect(&mut self, op: ConnectOp) -> Result<()> {
        Err(ChatError::unsupported(op.as_str()))
    }

    /// Close every open session
    async fn close_all_sessions(&mut self) -> Result<()>;
}
