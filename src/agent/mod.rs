//! Agents that answer free-text input
//!
//! The chat loop treats the agent as opaque: it forwards a line, prints the
//! reply, and may ask for the conversation to be forgotten.

pub mod groq;

use async_trait::async_trait;

use crate::error::Result;

pub use groq::GroqAgent;

/// Single-turn conversational agent
#[async_trait]
pub trait Agent: Send {
    /// Answer one line of operator input
    async fn run(&mut self, text: &str) -> Result<String>;

    /// Forget earlier turns
    fn clear_conversation_history(&mut self);
}

/// Agent used in dry-run mode: echoes its input without calling an LLM
#[derive(Debug, Default)]
pub struct EchoAgent {
    turns: usize,
}

impl EchoAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns answered since the last clear
    pub fn turns(&self) -> usize {
        self.turns
    }
}

#[async_trait]
impl Agent for EchoAgent {
    async fn run(&mut self, text: &str) -> Result<String> {
        self.turns += 1;
        Ok(format!("[DRY RUN] Received message: {text}"))
    }

    fn clear_conversation_history(&mut self) {
        self.turns = 0;
    }
}
