//! Operator command verbs.
//!
//! Commands are a closed set so every handler is reached through one
//! exhaustive `match`; adding a verb is a compile-time checked change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Control verbs recognized in inbound text (`/status`, `/health`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Start,
    Help,
    Status,
    Health,
    Model,
    Restart,
    Shutdown,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::Start,
        Command::Help,
        Command::Status,
        Command::Health,
        Command::Model,
        Command::Restart,
        Command::Shutdown,
    ];

    /// Parse a leading `/verb` from message text.
    ///
    /// Accepts the `/verb@botname` form chat platforms use in group chats and
    /// ignores trailing arguments. Returns `None` for plain text and unknown
    /// verbs, which are routed as ordinary prompts.
    pub fn parse(text: &str) -> Option<Command> {
        let first = text.trim_start().split_whitespace().next()?;
        let verb = first.strip_prefix('/')?;
        let verb = verb.split_once('@').map(|(v, _)| v).unwrap_or(verb);
        verb.parse().ok()
    }

    /// One-line description for the welcome text.
    pub fn description(&self) -> &'static str {
        match self {
            Command::Start => "Welcome message",
            Command::Help => "List commands",
            Command::Status => "Bot status",
            Command::Health => "LLM health check",
            Command::Model => "Active model info",
            Command::Restart => "Restart bot",
            Command::Shutdown => "Shutdown bot",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::Status => "status",
            Command::Health => "health",
            Command::Model => "model",
            Command::Restart => "restart",
            Command::Shutdown => "shutdown",
        };
        f.write_str(verb)
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" => Ok(Command::Start),
            "help" => Ok(Command::Help),
            "status" => Ok(Command::Status),
            "health" => Ok(Command::Health),
            "model" => Ok(Command::Model),
            "restart" => Ok(Command::Restart),
            "shutdown" => Ok(Command::Shutdown),
            other => Err(format!("unknown command: '{other}'")),
        }
    }
}

/// Process-level intent emitted by lifecycle commands.
///
/// The relay never manages the OS process itself; the binary drains
/// in-flight work and exits, leaving the restart to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitIntent {
    Shutdown,
    Restart,
}

impl fmt::Display for ExitIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitIntent::Shutdown => write!(f, "shutdown"),
            ExitIntent::Restart => write!(f, "restart"),
        }
    }
}
