//! CLI module
//!
//! Handles command-line argument parsing and startup: load the server file,
//! build the agent, and hand stdin/stdout to the dispatch loop.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;

use crate::agent::{Agent, EchoAgent, GroqAgent};
use crate::config::{AgentConfig, DEFAULT_CONFIG_FILE, DEFAULT_SERVICE};
use crate::error::{ChatError, Result};
use crate::mcp::{McpClient, Session};
use crate::repl::{self, Outcome};

/// Interactive router between you, an LLM agent and an MCP weather-alert server
#[derive(Parser, Debug)]
#[command(name = "mcp-chat")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// MCP server configuration file
    #[arg(long, env = "MCP_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Server to open a session with
    #[arg(long, env = "MCP_SERVER", default_value = DEFAULT_SERVICE)]
    pub server: String,

    /// Chat model used for free-text input
    #[arg(long, env = "GROQ_MODEL", default_value = AgentConfig::DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "GROQ_API_BASE", default_value = AgentConfig::DEFAULT_API_BASE)]
    pub api_base: String,

    /// API key for the chat model
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Planning steps the agent may spend on tool calls
    #[arg(long, default_value_t = 1)]
    pub max_steps: usize,

    /// Keep conversation history between turns
    #[arg(long, default_value = "false")]
    pub memory: bool,

    /// Echo free-text input instead of calling the model
    #[arg(long, default_value = "false")]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,
}

impl Args {
    /// Agent settings, or a config error when no API key is available
    pub fn agent_config(&self) -> Result<AgentConfig> {
        let api_key = self
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ChatError::config("GROQ_API_KEY is not set (use --dry-run to chat without a model)"))?;

        let mut config = AgentConfig::new(api_key);
        config.model = self.model.clone();
        config.api_base = self.api_base.clone();
        config.max_steps = self.max_steps;
        config.memory_enabled = self.memory;
        Ok(config)
    }
}

/// Run the chat with parsed arguments
pub async fn run(args: Args) -> Result<Outcome> {
    println!("Initializing chat...");

    let agent_config = if args.dry_run {
        None
    } else {
        Some(args.agent_config()?)
    };

    let mut client = McpClient::from_config_file(&args.config)?;

    let make_agent = |session: Arc<dyn Session>| async move {
        let agent: Box<dyn Agent> = match agent_config {
            Some(config) => Box::new(GroqAgent::new(config, session)),
            None => Box::new(EchoAgent::new()),
        };
        Ok::<_, ChatError>(agent)
    };

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    repl::serve(
        &mut client,
        &args.server,
        make_agent,
        stdin,
        &mut stdout,
        interrupt_signal(),
    )
    .await
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn interrupt_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
