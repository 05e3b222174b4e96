//! Input classification
//!
//! Every trimmed input line maps to exactly one [`Command`]. The checks run
//! in a fixed order: exit, clear, help, direct tool call, and finally the
//! agent, which receives everything else.

pub mod args;

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

pub use args::{parse_kv_pairs, ArgValue, ParsedArgs};

/// A direct `@server.tool key=value ...` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub server: String,
    pub tool: String,
    pub args: ParsedArgs,
}

impl ToolInvocation {
    /// Arguments as the JSON object sent to the server
    pub fn arguments(&self) -> Value {
        args::to_json(&self.args)
    }
}

/// What one line of input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Clear,
    Help,
    Direct(ToolInvocation),
    Agent(String),
}

fn direct_call_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^@(\w+)\.(\w+)\b(.*)$").expect("direct-call pattern is valid")
    })
}

/// Classify a line of operator input
pub fn classify(line: &str) -> Command {
    let trimmed = line.trim();
    let lowered = trimmed.to_lowercase();

    match lowered.as_str() {
        "exit" | "quit" => return Command::Exit,
        "clear" => return Command::Clear,
        "help" => return Command::Help,
        _ => {}
    }

    if let Some(caps) = direct_call_pattern().captures(trimmed) {
        return Command::Direct(ToolInvocation {
            server: caps[1].to_string(),
            tool: caps[2].to_string(),
            args: parse_kv_pairs(&caps[3]),
        });
    }

    Command::Agent(trimmed.to_string())
}
