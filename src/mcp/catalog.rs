//! Tool catalog for help text
//!
//! Best-effort only. [`tools_line`] never fails: any problem yields
//! [`FALLBACK_TOOLS_LINE`].

use serde_json::Value;

use super::{ListingOp, Session, ToolDescriptor};
use crate::error::{ChatError, Result};

/// Listing shown when the session cannot enumerate its tools
pub const FALLBACK_TOOLS_LINE: &str = "Tools: get_alerts, ping";

/// Tool descriptors from the first listing operation the session supports
pub async fn descriptors(session: &dyn Session) -> Result<Vec<ToolDescriptor>> {
    let op = ListingOp::ORDER
        .into_iter()
        .find(|op| session.supports_listing(*op))
        .ok_or_else(|| ChatError::catalog_unavailable("session offers no tool listing"))?;

    session.list(op).await
}

/// Build the "Tools: a, b, c" line
pub async fn list_names(session: &dyn Session) -> Result<String> {
    let names: Vec<String> = descriptors(session)
        .await?
        .iter()
        .map(display_name)
        .filter(|name| !name.is_empty())
        .collect();

    if names.is_empty() {
        return Err(ChatError::catalog_unavailable("session listed no tools"));
    }
    Ok(format!("Tools: {}", names.join(", ")))
}

/// [`list_names`], falling back to the built-in listing on any failure
pub async fn tools_line(session: &dyn Session) -> String {
    list_names(session).await.unwrap_or_else(|e| {
        tracing::debug!(kind = e.kind(), error = %e, "using fallback tool listing");
        FALLBACK_TOOLS_LINE.to_string()
    })
}

fn display_name(descriptor: &ToolDescriptor) -> String {
    let field = |key: &str| {
        descriptor
            .get(key)
            .filter(|v| !matches!(v, Value::Null | Value::Bool(false)))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .filter(|s| !s.is_empty())
    };

    field("name").or_else(|| field("tool")).unwrap_or_else(|| match descriptor {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}
