//! mcp-chat: an interactive command router for MCP tool servers
//!
//! Input lines are either direct tool invocations (`@server.tool k=v ...`),
//! sent straight to the MCP session, or free text for the LLM agent.
//! Tool results of any shape are normalized into bounded text.

pub mod agent;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod id;
pub mod mcp;
pub mod normalize;
pub mod repl;

pub use error::{ChatError, Result};
