//! LLM agent backed by an OpenAI-compatible chat-completions API (Groq)
//!
//! The agent advertises the session's MCP tools as functions. Each planning
//! step may call tools; once the step budget is spent a last completion
//! without tools produces the answer.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use super::Agent;
use crate::config::AgentConfig;
use crate::error::{ChatError, Result};
use crate::id::{ascending, Prefix};
use crate::mcp::{catalog, Session, ToolDescriptor};
use crate::normalize::{self, MAX_CHARS};

const SYSTEM_PROMPT: &str = "You are a concise assistant for US weather alerts. \
Use the available tools when the user asks about active alerts; otherwise answer directly.";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn tool_output(call_id: &str, output: String) -> Self {
        Self {
            tool_call_id: Some(call_id.to_string()),
            ..Self::new("tool", output)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Value]>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Chat-completions agent with MCP tool access
pub struct GroqAgent {
    http: HttpClient,
    config: AgentConfig,
    session: Arc<dyn Session>,
    /// Function definitions, fetched on first use
    tools: Option<Vec<Value>>,
    history: Vec<ChatMessage>,
}

impl GroqAgent {
    pub fn new(config: AgentConfig, session: Arc<dyn Session>) -> Self {
        Self {
            http: HttpClient::new(),
            config,
            session,
            tools: None,
            history: Vec::new(),
        }
    }

    /// Messages remembered from earlier turns
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    async fn ensure_tools(&mut self) {
        if self.tools.is_some() {
            return;
        }
        let tools = match catalog::descriptors(self.session.as_ref()).await {
            Ok(descriptors) => descriptors.iter().filter_map(function_tool).collect(),
            Err(e) => {
                tracing::debug!(error = %e, "agent runs without tools");
                Vec::new()
            }
        };
        self.tools = Some(tools);
    }

    async fn complete(&self, messages: &[ChatMessage], with_tools: bool) -> Result<ChatMessage> {
        let tools = self
            .tools
            .as_deref()
            .filter(|tools| with_tools && !tools.is_empty());
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            tools,
        };

        let url = format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ChatError::agent(format!("LLM API error {status}: {body}")));
        }

        let parsed: CompletionResponse = serde_json::from_str(&body)?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ChatError::agent("LLM response had no choices"))
    }

    async fn execute(&self, call: &ToolCall) -> String {
        let arguments = match decode_arguments(&call.function.arguments) {
            Ok(arguments) => arguments,
            Err(e) => return format!("Invalid arguments for tool '{}': {e}", call.function.name),
        };

        match self.session.call_tool(&call.function.name, arguments).await {
            Ok(result) => normalize::truncate_chars(&normalize::to_text(&result), MAX_CHARS),
            Err(e) => ChatError::tool_call(&call.function.name, e).to_string(),
        }
    }

    fn finish(&mut self, mut messages: Vec<ChatMessage>, reply: ChatMessage) -> String {
        let text = reply.content.clone().unwrap_or_default();
        messages.push(reply);
        if self.config.memory_enabled {
            // Skip the system prompt; it is re-added every turn
            self.history = messages.into_iter().skip(1).collect();
        }
        text.trim().to_string()
    }
}

#[async_trait]
impl Agent for GroqAgent {
    async fn run(&mut self, text: &str) -> Result<String> {
        let turn = ascending(Prefix::Turn);
        tracing::debug!(turn = %turn, model = %self.config.model, "agent turn");

        self.ensure_tools().await;

        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(ChatMessage::new("system", SYSTEM_PROMPT));
        if self.config.memory_enabled {
            messages.extend(self.history.iter().cloned());
        }
        messages.push(ChatMessage::new("user", text));

        for step in 0..self.config.max_steps {
            let reply = self.complete(&messages, true).await?;
            let calls = reply.tool_calls.clone().unwrap_or_default();
            if calls.is_empty() {
                return Ok(self.finish(messages, reply));
            }

            tracing::debug!(turn = %turn, step, calls = calls.len(), "agent requested tools");
            messages.push(reply);
            for call in &calls {
                let output = self.execute(call).await;
                messages.push(ChatMessage::tool_output(&call.id, output));
            }
        }

        let reply = self.complete(&messages, false).await?;
        Ok(self.finish(messages, reply))
    }

    fn clear_conversation_history(&mut self) {
        self.history.clear();
    }
}

/// OpenAI function-tool definition for an MCP tool descriptor
fn function_tool(descriptor: &ToolDescriptor) -> Option<Value> {
    let name = descriptor.get("name")?.as_str().filter(|n| !n.is_empty())?;
    let description = descriptor
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let parameters = descriptor
        .get("inputSchema")
        .filter(|schema| schema.is_object())
        .cloned()
        .unwrap_or_else(|| json!({"type": "object", "properties": {}}));

    Some(json!({
        "type": "function",
        "function": {
            "name": name,
            "description": description,
            "parameters": parameters,
        }
    }))
}

fn decode_arguments(raw: &str) -> std::result::Result<Value, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(raw)
}
