//! Tests against a real child-process MCP server (a small bash script) and
//! the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use mcp_chat::config::ServersConfig;
use mcp_chat::mcp::{catalog, Client, McpClient, Session};
use mcp_chat::normalize;

fn fixture_server() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fake_weather_server.sh")
}

fn servers_json() -> String {
    serde_json::json!({
        "mcpServers": {
            "weather": {
                "command": "bash",
                "args": [fixture_server()]
            }
        }
    })
    .to_string()
}

fn config_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(servers_json().as_bytes()).unwrap();
    file
}

#[test]
fn test_missing_config_is_fatal() {
    Command::cargo_bin("mcp-chat")
        .unwrap()
        .args(["--config", "/nonexistent/servers.json", "--dry-run"])
        .env_remove("GROQ_API_KEY")
        .write_stdin("exit\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_missing_api_key_without_dry_run() {
    let config = config_file();
    Command::cargo_bin("mcp-chat")
        .unwrap()
        .arg("--config")
        .arg(config.path())
        .env_remove("GROQ_API_KEY")
        .write_stdin("exit\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GROQ_API_KEY"));
}

#[cfg(unix)]
#[test]
fn test_dry_run_session() {
    let config = config_file();
    Command::cargo_bin("mcp-chat")
        .unwrap()
        .arg("--config")
        .arg(config.path())
        .arg("--dry-run")
        .env_remove("GROQ_API_KEY")
        .write_stdin("help\n@weather.ping\nanything new?\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initializing chat..."))
        .stdout(predicate::str::contains("Tools: get_alerts, ping"))
        .stdout(predicate::str::contains("Assistant:\nPong!"))
        .stdout(predicate::str::contains("[DRY RUN] Received message: anything new?"))
        .stdout(predicate::str::contains("Ending conversation..."));
}

#[cfg(unix)]
#[test]
fn test_invalid_utf8_line_keeps_session_alive() {
    let config = config_file();
    Command::cargo_bin("mcp-chat")
        .unwrap()
        .arg("--config")
        .arg(config.path())
        .arg("--dry-run")
        .env_remove("GROQ_API_KEY")
        .write_stdin(&b"caf\xe9 alerts?\n@weather.ping\nexit\n"[..])
        .assert()
        .success()
        .stdout(predicate::str::contains("Assistant:\nPong!"))
        .stdout(predicate::str::contains("Ending conversation..."));
}

#[cfg(unix)]
#[tokio::test]
async fn test_client_against_stdio_server() {
    let config = ServersConfig::from_json(&servers_json()).unwrap();
    let mut client = McpClient::new(config);

    let session = client.create_session("weather").await.unwrap();
    let again = client.create_session("weather").await.unwrap();
    assert_eq!(session.id(), again.id());
    assert_eq!(client.sessions().len(), 1);

    assert_eq!(
        catalog::list_names(session.as_ref()).await.unwrap(),
        "Tools: get_alerts, ping"
    );

    let result = session
        .call_tool("get_alerts", serde_json::json!({"state": "CA", "limit": 3}))
        .await
        .unwrap();
    let text = normalize::to_text(&result);
    assert_eq!(text.lines().filter(|l| l.starts_with("• ")).count(), 3);

    let err = session
        .call_tool("forecast", serde_json::json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "JsonRpc");

    client.close_all_sessions().await.unwrap();
    assert!(client.sessions().is_empty());
}
