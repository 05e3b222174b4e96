//! Configuration
//!
//! The server file declares which MCP servers the client may launch:
//!
//! ```json
//! { "mcpServers": { "weather": { "command": "python", "args": ["server/weather.py"] } } }
//! ```

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::error::{ChatError, Result};

/// Default location of the server file, relative to the working directory.
///
/// The shipped file launches `weather.py` from `server/`; that MCP server
/// is provided by the deployment, not by this crate.
pub const DEFAULT_CONFIG_FILE: &str = "server/weather.json";

/// Well-known name of the weather service
pub const DEFAULT_SERVICE: &str = "weather";

/// One stdio MCP server entry
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

/// Contents of the server file, keyed by server name
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServersConfig {
    #[serde(rename = "mcpServers", default)]
    pub servers: BTreeMap<String, ServerConfig>,
}

impl ServersConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ChatError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
            .map_err(|e| ChatError::config(format!("{}: {e}", path.display())))
    }

    pub fn from_json(raw: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn get(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.servers.keys().map(String::as_str)
    }
}

/// Settings for the LLM agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Planning steps that may call tools before the final answer
    pub max_steps: usize,
    /// Keep turns across `run` calls until cleared
    pub memory_enabled: bool,
}

impl AgentConfig {
    pub const DEFAULT_API_BASE: &'static str = "https://api.groq.com/openai/v1";
    pub const DEFAULT_MODEL: &'static str = "llama-3.1-8b-instant";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: Self::DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            max_tokens: 256,
            max_steps: 1,
            memory_enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_servers() {
        let config = ServersConfig::from_json(
            r#"{"mcpServers": {
                "weather": {"command": "python", "args": ["server/weather.py"]},
                "alpha": {"command": "node", "env": {"DEBUG": "1"}, "cwd": "/srv"}
            }}"#,
        )
        .unwrap();

        assert_eq!(config.names().collect::<Vec<_>>(), ["alpha", "weather"]);
        let weather = config.get("weather").unwrap();
        assert_eq!(weather.command, "python");
        assert_eq!(weather.args, ["server/weather.py"]);
        assert!(weather.env.is_empty());
        let alpha = config.get("alpha").unwrap();
        assert_eq!(alpha.env["DEBUG"], "1");
        assert_eq!(alpha.cwd.as_deref(), Some(Path::new("/srv")));
    }

    #[test]
    fn test_missing_command_rejected() {
        assert!(ServersConfig::from_json(r#"{"mcpServers": {"weather": {"args": []}}}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("weather.json");
        std::fs::write(&path, r#"{"mcpServers": {"weather": {"command": "uv"}}}"#).unwrap();

        let config = ServersConfig::from_file(&path).unwrap();
        assert_eq!(config.get("weather").unwrap().command, "uv");
    }

    #[test]
    fn test_shipped_default_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_FILE);
        let config = ServersConfig::from_file(path).unwrap();
        let weather = config.get(DEFAULT_SERVICE).unwrap();
        assert_eq!(weather.cwd.as_deref(), Some(Path::new("server")));
        assert!(weather.args.iter().any(|a| a == "weather.py"));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        let err = ServersConfig::from_file(temp.path().join("absent.json")).unwrap_err();
        assert_eq!(err.kind(), "Config");
    }

    #[test]
    fn test_agent_defaults() {
        let config = AgentConfig::new("key");
        assert_eq!(config.model, "llama-3.1-8b-instant");
        assert_eq!(config.max_steps, 1);
        assert!(!config.memory_enabled);
    }
}
