//! Session acquisition
//!
//! Strategies, first success wins:
//! 1. reuse the first session the client already has;
//! 2. `create_session(service)` when the client supports it;
//! 3. each supported [`ConnectOp`] in [`ConnectOp::FALLBACK_ORDER`],
//!    re-checking for a session after every attempt.

use std::sync::Arc;

use super::{Client, ConnectOp, Session};
use crate::error::{ChatError, Result};

fn first_session(client: &dyn Client) -> Option<Arc<dyn Session>> {
    client.sessions().into_iter().next()
}

/// Obtain a live session from `client`, or fail with `NoSession`
pub async fn acquire(client: &mut dyn Client, service: &str) -> Result<Arc<dyn Session>> {
    if let Some(session) = first_session(client) {
        tracing::debug!(session = session.id(), "reusing existing MCP session");
        return Ok(session);
    }

    if client.supports_create_session() {
        return client
            .create_session(service)
            .await
            .map_err(|e| ChatError::no_session(format!("create_session('{service}'): {e}")));
    }

    let mut last_error: Option<ChatError> = None;
    for op in ConnectOp::FALLBACK_ORDER {
        if !client.supports(op) {
            continue;
        }

        tracing::debug!(strategy = op.as_str(), "trying connect strategy");
        if let Err(e) = client.connect(op).await {
            tracing::warn!(strategy = op.as_str(), kind = e.kind(), error = %e, "connect strategy failed");
            last_error = Some(e);
        }

        if let Some(session) = first_session(client) {
            return Ok(session);
        }
    }

    Err(ChatError::no_session(match last_error {
        Some(e) => format!("last strategy error: {e}"),
        None => "every strategy left the client without sessions".to_string(),
    }))
}
