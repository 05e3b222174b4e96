//! Stdio MCP session
//!
//! Spawns one MCP server as a child process and speaks newline-delimited
//! JSON-RPC over its stdin/stdout.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};

use super::jsonrpc::{Notification, Request, Response};
use super::{ListingOp, Session, ToolDescriptor, ToolResult};
use crate::config::ServerConfig;
use crate::error::{ChatError, Result};
use crate::id::{ascending, Prefix};

const PROTOCOL_VERSION: &str = "2025-06-18";

/// How long a closing server gets to exit on its own
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A live session with one child-process MCP server
pub struct StdioSession {
    id: String,
    name: String,
    io: Mutex<StdioIo>,
    child: Mutex<Child>,
    next_id: AtomicU64,
}

struct StdioIo {
    /// Dropped on close so the server sees EOF
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl StdioSession {
    /// Launch the server and complete the MCP handshake
    #[tracing::instrument(skip(config), fields(command = %config.command))]
    pub async fn connect(name: &str, config: &ServerConfig) -> Result<Self> {
        let program = which::which(&config.command).map_err(|e| {
            ChatError::Transport(format!("cannot find server command '{}': {e}", config.command))
        })?;

        let mut command = Command::new(program);
        command
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(cwd) = &config.cwd {
            command.current_dir(cwd);
        }

        let mut child = command
            .spawn()
            .map_err(|e| ChatError::Transport(format!("failed to spawn {}: {e}", config.command)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ChatError::Transport("server stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ChatError::Transport("server stdout unavailable".into()))?;

        let session = Self {
            id: ascending(Prefix::Session),
            name: name.to_string(),
            io: Mutex::new(StdioIo {
                stdin: Some(stdin),
                stdout: BufReader::new(stdout),
            }),
            child: Mutex::new(child),
            next_id: AtomicU64::new(1),
        };

        let init = session
            .request(
                "initialize",
                Some(json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION"),
                    }
                })),
            )
            .await?;

        let negotiated = init
            .get("protocolVersion")
            .and_then(Value::as_str)
            .ok_or_else(|| ChatError::Protocol("initialize result lacks protocolVersion".into()))?;
        if negotiated != PROTOCOL_VERSION {
            tracing::debug!(negotiated, expected = PROTOCOL_VERSION, "MCP protocol version differs");
        }

        session.notify("notifications/initialized", None).await?;
        tracing::debug!(session = %session.id, server = name, "MCP session ready");

        Ok(session)
    }

    /// Server name from the configuration file
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let line = serde_json::to_string(&Request::new(id, method, params))?;

        let mut io = self.io.lock().await;
        write_line(io.stdin.as_mut(), &line).await?;

        loop {
            let mut buf = String::new();
            let n = io
                .stdout
                .read_line(&mut buf)
                .await
                .map_err(|e| ChatError::Transport(format!("read: {e}")))?;
            if n == 0 {
                return Err(ChatError::Transport("unexpected EOF from server".into()));
            }

            // Log lines, notifications and stale answers are skipped
            let Ok(resp) = serde_json::from_str::<Response>(&buf) else {
                continue;
            };
            if !resp.is_answer() || !resp.id_matches(id) {
                continue;
            }

            if let Some(err) = resp.error {
                return Err(ChatError::JsonRpc {
                    code: err.code,
                    message: err.message,
                });
            }
            return Ok(resp.result.unwrap_or(Value::Null));
        }
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let line = serde_json::to_string(&Notification::new(method, params))?;
        let mut io = self.io.lock().await;
        write_line(io.stdin.as_mut(), &line).await?;
        Ok(())
    }

    /// Fetch every page of `tools/list`
    async fn fetch_all_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let mut page = self.request("tools/list", params).await?;

            match page.get_mut("tools").map(Value::take) {
                Some(Value::Array(items)) => tools.extend(items),
                Some(Value::Null) | None => {}
                Some(other) => {
                    return Err(ChatError::Protocol(format!(
                        "tools/list returned non-array tools: {other}"
                    )))
                }
            }

            match page.get("nextCursor").and_then(Value::as_str) {
                Some(next) => cursor = Some(next.to_string()),
                None => break,
            }
        }

        Ok(tools)
    }
}

async fn write_line(stdin: Option<&mut ChildStdin>, line: &str) -> Result<()> {
    let stdin = stdin.ok_or_else(|| ChatError::Transport("session is closed".into()))?;
    let mut framed = String::with_capacity(line.len() + 1);
    framed.push_str(line);
    framed.push('\n');
    stdin
        .write_all(framed.as_bytes())
        .await
        .map_err(|e| ChatError::Transport(format!("write: {e}")))?;
    stdin
        .flush()
        .await
        .map_err(|e| ChatError::Transport(format!("flush: {e}")))
}

#[async_trait]
impl Session for StdioSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        let call_id = ascending(Prefix::Call);
        tracing::debug!(session = %self.id, call = %call_id, tool = name, "tools/call");

        let result = self
            .request("tools/call", Some(json!({ "name": name, "arguments": arguments })))
            .await?;
        Ok(ToolResult::from_value(result))
    }

    fn supports_listing(&self, op: ListingOp) -> bool {
        op == ListingOp::ListTools
    }

    async fn list(&self, op: ListingOp) -> Result<Vec<ToolDescriptor>> {
        match op {
            ListingOp::ListTools => self.fetch_all_tools().await,
            other => Err(ChatError::unsupported(other.as_str())),
        }
    }

    async fn close(&self) -> Result<()> {
        drop(self.io.lock().await.stdin.take());

        let mut child = self.child.lock().await;
        if timeout(SHUTDOWN_GRACE, child.wait()).await.is_ok() {
            return Ok(());
        }

        tracing::warn!(session = %self.id, "MCP server did not exit, killing it");
        child.kill().await?;
        Ok(())
    }
}
