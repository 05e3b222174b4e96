//! End-to-end dispatch tests against in-process client, session and agent
//! doubles.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::future::pending;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mcp_chat::agent::{Agent, EchoAgent};
use mcp_chat::mcp::{Client, ConnectOp, ListingOp, Session, ToolDescriptor, ToolResult};
use mcp_chat::repl::{serve, Outcome};
use mcp_chat::{ChatError, Result};

struct AlertSession {
    calls: Mutex<Vec<(String, Value)>>,
}

#[async_trait]
impl Session for AlertSession {
    fn id(&self) -> &str {
        "ses_alerts"
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        self.calls.lock().unwrap().push((name.to_string(), arguments));
        match name {
            "get_alerts" => Ok(ToolResult::from_value(json!({
                "content": [{
                    "type": "text",
                    "text": "• Heat Advisory - Imperial County (until 2026-10-19T20:00:00-07:00)\n\
                             • Red Flag Warning - Santa Barbara County (until 2026-10-19T18:00:00-07:00)\n\
                             • Wind Advisory - San Diego County Mountains (until 2026-10-20T06:00:00-07:00)"
                }],
                "isError": false
            }))),
            other => Err(ChatError::JsonRpc {
                code: -32602,
                message: format!("Unknown tool: {other}"),
            }),
        }
    }

    fn supports_listing(&self, op: ListingOp) -> bool {
        op == ListingOp::GetTools
    }

    async fn list(&self, _op: ListingOp) -> Result<Vec<ToolDescriptor>> {
        Ok(vec![json!({"name": "get_alerts"}), json!({"name": "ping"})])
    }
}

/// Client that only gains a session through `initialize`
struct LegacyClient {
    session: Arc<AlertSession>,
    connected: bool,
    closes: Arc<AtomicUsize>,
}

impl LegacyClient {
    fn new() -> Self {
        Self {
            session: Arc::new(AlertSession {
                calls: Mutex::new(Vec::new()),
            }),
            connected: false,
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Client for LegacyClient {
    fn sessions(&self) -> Vec<Arc<dyn Session>> {
        if self.connected {
            vec![self.session.clone() as Arc<dyn Session>]
        } else {
            Vec::new()
        }
    }

    fn supports(&self, op: ConnectOp) -> bool {
        op == ConnectOp::Initialize
    }

    async fn connect(&mut self, _op: ConnectOp) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    async fn close_all_sessions(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.connected = false;
        Ok(())
    }
}

fn echo_agent(_session: Arc<dyn Session>) -> impl std::future::Future<Output = Result<Box<dyn Agent>>> {
    async { Ok(Box::new(EchoAgent::new()) as Box<dyn Agent>) }
}

#[tokio::test]
async fn test_get_alerts_scenario() {
    let mut client = LegacyClient::new();
    let session = client.session.clone();
    let closes = client.closes.clone();

    let input = "@weather.get_alerts state=\"CA\" limit=3\nhelp\n";
    let mut out = Vec::new();
    let outcome = serve(
        &mut client,
        "weather",
        echo_agent,
        input.as_bytes(),
        &mut out,
        pending(),
    )
    .await
    .unwrap();
    let out = String::from_utf8(out).unwrap();

    let bullets: Vec<&str> = out.lines().filter(|l| l.starts_with("• ")).collect();
    assert_eq!(bullets.len(), 3);
    assert!(bullets[0].contains("Heat Advisory"));

    // The prompt reappeared after the call, and the catalog came from the session
    assert_eq!(out.matches("You: ").count(), 3);
    assert!(out.contains("Tools: get_alerts, ping"));

    assert_eq!(
        session.calls.lock().unwrap().as_slice(),
        [(
            "get_alerts".to_string(),
            json!({"state": "CA", "limit": 3})
        )]
    );
    assert_eq!(outcome, Outcome::EndOfInput);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sessions_closed_once_on_exit() {
    let mut client = LegacyClient::new();
    let closes = client.closes.clone();

    let mut out = Vec::new();
    let outcome = serve(
        &mut client,
        "weather",
        echo_agent,
        &b"@weather.unknown\nwhat's the forecast?\nexit\nnever read\n"[..],
        &mut out,
        pending(),
    )
    .await
    .unwrap();
    let out = String::from_utf8(out).unwrap();

    assert_eq!(outcome, Outcome::Exit);
    assert!(out.contains("Error calling tool 'unknown'"));
    assert!(out.contains("[DRY RUN] Received message: what's the forecast?"));
    assert!(!out.contains("never read"));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sessions_closed_when_agent_fails_to_start() {
    let mut client = LegacyClient::new();
    let closes = client.closes.clone();

    let mut out = Vec::new();
    let result = serve(
        &mut client,
        "weather",
        |_session| async { Err::<Box<dyn Agent>, _>(ChatError::config("GROQ_API_KEY is not set")) },
        &b"exit\n"[..],
        &mut out,
        pending(),
    )
    .await;

    assert!(matches!(result, Err(ChatError::Config { .. })));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

/// Client with no way to produce a session
struct EmptyClient {
    closes: usize,
}

#[async_trait]
impl Client for EmptyClient {
    fn sessions(&self) -> Vec<Arc<dyn Session>> {
        Vec::new()
    }

    async fn close_all_sessions(&mut self) -> Result<()> {
        self.closes += 1;
        Ok(())
    }
}

#[tokio::test]
async fn test_no_session_is_fatal_and_closes_nothing() {
    let mut client = EmptyClient { closes: 0 };
    let mut out = Vec::new();

    let result = serve(
        &mut client,
        "weather",
        echo_agent,
        &b"exit\n"[..],
        &mut out,
        pending(),
    )
    .await;

    assert!(matches!(result, Err(ChatError::NoSession { .. })));
    assert_eq!(client.closes, 0);
    assert!(out.is_empty());
}

/// Terminal whose writes fail once the first prompt is printed
struct ClosedTerminal;

impl Write for ClosedTerminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.windows(4).any(|w| w == b"You:") {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal closed"));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_sessions_closed_when_loop_fails() {
    let mut client = LegacyClient::new();
    let closes = client.closes.clone();

    let result = serve(
        &mut client,
        "weather",
        echo_agent,
        &b"@weather.get_alerts state=\"CA\"\n"[..],
        &mut ClosedTerminal,
        pending(),
    )
    .await;

    assert!(matches!(result, Err(ChatError::Io(_))));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sessions_closed_once_on_interrupt() {
    let mut client = LegacyClient::new();
    let closes = client.closes.clone();
    let (_keyboard, terminal) = tokio::io::duplex(64);

    let mut out = Vec::new();
    let outcome = serve(
        &mut client,
        "weather",
        echo_agent,
        tokio::io::BufReader::new(terminal),
        &mut out,
        tokio::time::sleep(Duration::from_millis(20)),
    )
    .await
    .unwrap();

    assert_eq!(outcome, Outcome::Interrupted);
    assert!(String::from_utf8(out).unwrap().contains("Interrupted."));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}
