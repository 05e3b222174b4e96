//! mcp-chat - interactive router between an operator, an LLM agent and an
//! MCP weather-alert server.

use clap::Parser;
use mcp_chat::cli::{self, Args};
use mcp_chat::repl::Outcome;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must be loaded before clap reads env fallbacks
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("MCP_LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let outcome = cli::run(args).await?;
    tracing::debug!(?outcome, "chat finished");

    if outcome == Outcome::Interrupted {
        // A stdin read is still pending and would block runtime shutdown
        std::process::exit(0);
    }
    Ok(())
}
