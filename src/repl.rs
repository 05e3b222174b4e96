//! Interactive dispatch loop
//!
//! Reads one line at a time, classifies it and routes it either straight to
//! the MCP session or to the agent. Per-line failures are printed inline;
//! only I/O errors on the terminal itself end the loop early.

use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::agent::Agent;
use crate::command::{classify, Command, ToolInvocation};
use crate::error::{ChatError, Result};
use crate::mcp::{bootstrap, catalog, Client, Session};
use crate::normalize::{self, MAX_CHARS};

const BANNER: &str = "\n===== Interactive MCP Chat =====
Type 'help' for usage examples
Type 'exit' or 'quit' to end the conversation
Type 'clear' to clear conversation history
==================================";

const USAGE: &str = "Commands:
  @weather.ping
  @weather.get_alerts state=\"CA\" [event_filter=\"heat\"] [limit=5] [include_expires=true]

Examples:
  @weather.get_alerts state=\"CA\"
  @weather.get_alerts state=\"CA\" event_filter=\"heat\" limit=5 include_expires=true
  @weather.get_alerts state=\"WA\" limit=8";

/// How the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `exit` or `quit`
    Exit,
    EndOfInput,
    /// Ctrl-C while waiting for input
    Interrupted,
}

/// The dispatcher: exclusive owner of the session handle and the agent
pub struct Repl {
    session: Arc<dyn Session>,
    agent: Box<dyn Agent>,
    tools_line: String,
}

impl Repl {
    pub fn new(session: Arc<dyn Session>, agent: Box<dyn Agent>, tools_line: String) -> Self {
        Self {
            session,
            agent,
            tools_line,
        }
    }

    /// Run until exit, end of input or `shutdown` resolves.
    ///
    /// `shutdown` is raced against both the read and the dispatch of each
    /// line, so an interrupt also cancels a call that is still in flight.
    pub async fn run<R, W, S>(&mut self, mut input: R, out: &mut W, shutdown: S) -> Result<Outcome>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        writeln!(out, "{BANNER}")?;

        loop {
            write!(out, "\nYou: ")?;
            out.flush()?;

            let mut buf = Vec::new();
            let read = tokio::select! {
                read = input.read_until(b'\n', &mut buf) => Some(read?),
                _ = &mut shutdown => None,
            };
            let Some(read) = read else {
                return interrupted(out);
            };
            if read == 0 {
                writeln!(out)?;
                return Ok(Outcome::EndOfInput);
            }

            // Invalid UTF-8 is replaced, not fatal
            let line = String::from_utf8_lossy(&buf);
            let command = match classify(&line) {
                Command::Exit => {
                    writeln!(out, "Ending conversation...")?;
                    return Ok(Outcome::Exit);
                }
                Command::Clear => {
                    self.agent.clear_conversation_history();
                    writeln!(out, "Conversation history cleared.")?;
                    continue;
                }
                Command::Help => {
                    writeln!(out, "\n{}\n\n{USAGE}", self.tools_line)?;
                    continue;
                }
                other => other,
            };

            let finished = tokio::select! {
                done = self.dispatch(command, out) => { done?; true }
                _ = &mut shutdown => false,
            };
            if !finished {
                return interrupted(out);
            }
        }
    }

    async fn dispatch<W: Write>(&mut self, command: Command, out: &mut W) -> Result<()> {
        match command {
            Command::Direct(call) => self.direct_call(&call, out).await,
            Command::Agent(text) => self.agent_call(&text, out).await,
            Command::Exit | Command::Clear | Command::Help => Ok(()),
        }
    }

    async fn direct_call<W: Write>(&self, call: &ToolInvocation, out: &mut W) -> Result<()> {
        tracing::debug!(server = %call.server, tool = %call.tool, "direct tool call");

        let text = match self.session.call_tool(&call.tool, call.arguments()).await {
            Ok(result) => normalize::truncate_chars(&normalize::to_text(&result), MAX_CHARS),
            Err(e) => {
                tracing::warn!(tool = %call.tool, kind = e.kind(), "tool call failed");
                ChatError::tool_call(&call.tool, e).to_string()
            }
        };

        writeln!(out, "\nAssistant:\n{text}")?;
        Ok(())
    }

    async fn agent_call<W: Write>(&mut self, text: &str, out: &mut W) -> Result<()> {
        write!(out, "\nAssistant: ")?;
        out.flush()?;

        match self.agent.run(text).await {
            Ok(reply) => writeln!(out, "{reply}")?,
            Err(e) => {
                tracing::warn!(kind = e.kind(), "agent turn failed");
                writeln!(out, "\nError: {e}")?;
            }
        }
        Ok(())
    }
}

fn interrupted<W: Write>(out: &mut W) -> Result<Outcome> {
    writeln!(out, "\nInterrupted.")?;
    Ok(Outcome::Interrupted)
}

/// Bootstrap a session, run the loop, and release the client's sessions.
///
/// `close_all_sessions` runs exactly once when a session was acquired,
/// whatever the loop's result, and never when acquisition failed.
pub async fn serve<F, Fut, R, W, S>(
    client: &mut dyn Client,
    service: &str,
    make_agent: F,
    input: R,
    out: &mut W,
    shutdown: S,
) -> Result<Outcome>
where
    F: FnOnce(Arc<dyn Session>) -> Fut,
    Fut: Future<Output = Result<Box<dyn Agent>>>,
    R: AsyncBufRead + Unpin,
    W: Write,
    S: Future<Output = ()>,
{
    let session = bootstrap::acquire(client, service).await?;
    tracing::info!(session = session.id(), service, "MCP session acquired");

    let outcome: Result<Outcome> = async move {
        let agent = make_agent(Arc::clone(&session)).await?;
        let tools_line = catalog::tools_line(session.as_ref()).await;
        Repl::new(session, agent, tools_line)
            .run(input, out, shutdown)
            .await
    }
    .await;

    if let Err(e) = client.close_all_sessions().await {
        tracing::warn!(kind = e.kind(), error = %e, "failed to close MCP sessions");
    }
    outcome
}
