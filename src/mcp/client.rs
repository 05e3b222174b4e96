//! Config-driven MCP client
//!
//! Owns one [`StdioSession`] per server it has launched.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use super::{Client, ConnectOp, Session, StdioSession};
use crate::config::ServersConfig;
use crate::error::{ChatError, Result};

pub struct McpClient {
    config: ServersConfig,
    /// Open sessions in creation order
    sessions: Vec<Arc<StdioSession>>,
}

impl McpClient {
    pub fn new(config: ServersConfig) -> Self {
        Self {
            config,
            sessions: Vec::new(),
        }
    }

    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(ServersConfig::from_file(path)?))
    }

    fn find(&self, name: &str) -> Option<&Arc<StdioSession>> {
        self.sessions.iter().find(|s| s.name() == name)
    }

    async fn open(&mut self, name: &str) -> Result<Arc<StdioSession>> {
        if let Some(existing) = self.find(name) {
            return Ok(Arc::clone(existing));
        }

        let server = self
            .config
            .get(name)
            .ok_or_else(|| ChatError::config(format!("no server named '{name}' in config")))?;
        let session = Arc::new(StdioSession::connect(name, server).await?);
        self.sessions.push(Arc::clone(&session));
        Ok(session)
    }

    async fn connect_all(&mut self) -> Result<()> {
        let names: Vec<String> = self.config.names().map(str::to_string).collect();
        for name in names {
            self.open(&name).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Client for McpClient {
    fn sessions(&self) -> Vec<Arc<dyn Session>> {
        self.sessions
            .iter()
            .map(|s| Arc::clone(s) as Arc<dyn Session>)
            .collect()
    }

    fn supports_create_session(&self) -> bool {
        true
    }

    async fn create_session(&mut self, name: &str) -> Result<Arc<dyn Session>> {
        let session: Arc<dyn Session> = self.open(name).await?;
        Ok(session)
    }

    fn supports(&self, op: ConnectOp) -> bool {
        matches!(op, ConnectOp::ConnectAll | ConnectOp::EnsureSessions)
    }

    async fn connect(&mut self, op: ConnectOp) -> Result<()> {
        match op {
            ConnectOp::ConnectAll => self.connect_all().await,
            ConnectOp::EnsureSessions if self.sessions.is_empty() => self.connect_all().await,
            ConnectOp::EnsureSessions => Ok(()),
            other => Err(ChatError::unsupported(other.as_str())),
        }
    }

    async fn close_all_sessions(&mut self) -> Result<()> {
        let mut first_error = None;

        for session in self.sessions.drain(..) {
            if let Err(e) = session.close().await {
                tracing::warn!(session = session.id(), error = %e, "failed to close MCP session");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
