//! Error types for the chat router
//!
//! Only `NoSession` is fatal. Everything else is caught at the loop boundary
//! and shown inline so the interactive session survives.

use thiserror::Error;

/// Main result type for the chat router
pub type Result<T> = std::result::Result<T, ChatError>;

/// Router errors with structured data
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("No MCP sessions available and unable to create one: {message}")]
    NoSession { message: String },

    #[error("Error calling tool '{tool}': {message}")]
    ToolCall { tool: String, message: String },

    #[error("Agent error: {message}")]
    Agent { message: String },

    #[error("Tool catalog unavailable: {message}")]
    CatalogUnavailable { message: String },

    #[error("Operation not supported: {capability}")]
    Unsupported { capability: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc { code: i64, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ChatError {
    /// Create a new NoSession error
    pub fn no_session(message: impl Into<String>) -> Self {
        Self::NoSession {
            message: message.into(),
        }
    }

    /// Wrap a failed direct tool invocation
    pub fn tool_call(tool: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::ToolCall {
            tool: tool.into(),
            message: source.to_string(),
        }
    }

    pub fn agent(message: impl Into<String>) -> Self {
        Self::Agent {
            message: message.into(),
        }
    }

    pub fn catalog_unavailable(message: impl Into<String>) -> Self {
        Self::CatalogUnavailable {
            message: message.into(),
        }
    }

    pub fn unsupported(capability: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: capability.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Stable name of the variant, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoSession { .. } => "NoSession",
            Self::ToolCall { .. } => "ToolCall",
            Self::Agent { .. } => "Agent",
            Self::CatalogUnavailable { .. } => "CatalogUnavailable",
            Self::Unsupported { .. } => "Unsupported",
            Self::Transport(_) => "Transport",
            Self::Protocol(_) => "Protocol",
            Self::JsonRpc { .. } => "JsonRpc",
            Self::Config { .. } => "Config",
            Self::Io(_) => "IO",
            Self::Json(_) => "JSON",
            Self::Http(_) => "HTTP",
        }
    }
}
